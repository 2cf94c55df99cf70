use std::path::Path;

use tempfile::TempDir;

pub fn temp_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("taskboard-test-")
        .tempdir()
        .unwrap_or_else(|err| panic!("failed to create temp dir: {err}"))
}

/// A SQLite database file that lives as long as the guard.
pub struct TempDatabase {
    dir: TempDir,
    url: String,
}

impl TempDatabase {
    pub fn new() -> Self {
        let dir = temp_dir();
        let db_path = dir.path().join("db.sqlite");
        let url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        Self { dir, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for TempDatabase {
    fn default() -> Self {
        Self::new()
    }
}
