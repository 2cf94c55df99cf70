use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "TASKBOARD_CONFIG";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_JWT_ISSUER: &str = "taskboard";
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Shape of `config.json`. Every key is optional; environment variables
/// override whatever the file provides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    jwt_issuer: Option<String>,
    session_ttl_secs: Option<i64>,
    cookie_secure: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: SecretString,
    pub jwt_issuer: String,
    pub session_ttl_secs: i64,
    pub cookie_secure: bool,
}

impl Config {
    /// Loads `config.json` (from `TASKBOARD_CONFIG` or the asset dir) when
    /// present, then applies process environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match std::env::var(CONFIG_PATH_ENV) {
            Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
            _ => utils::assets::config_path()?,
        };
        let raw = read_config_file(&path)?;
        Self::from_sources(raw.as_deref(), |key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(raw_file: Option<&str>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: FileConfig = match raw_file {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)?,
            _ => FileConfig::default(),
        };
        let env = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = env("HOST")
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match env("BACKEND_PORT").or_else(|| env("PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::ValidationError(format!("invalid port: {raw}")))?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let database_url = match env("DATABASE_URL").or(file.database_url) {
            Some(url) => url,
            None => default_database_url()?,
        };

        let jwt_secret = env("JWT_SECRET")
            .or(file.jwt_secret)
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| ConfigError::ValidationError("JWT_SECRET must be set".to_string()))?;

        let jwt_issuer = env("JWT_ISSUER")
            .or(file.jwt_issuer)
            .unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string());

        let session_ttl_secs = match env("SESSION_TTL_SECS") {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                ConfigError::ValidationError(format!("invalid SESSION_TTL_SECS: {raw}"))
            })?,
            None => file.session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS),
        };
        if session_ttl_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "session ttl must be positive".to_string(),
            ));
        }

        let cookie_secure = match env("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ConfigError::ValidationError(format!("invalid COOKIE_SECURE: {raw}"))
            })?,
            None => file.cookie_secure.unwrap_or(true),
        };

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret: SecretString::from(jwt_secret),
            jwt_issuer,
            session_ttl_secs,
            cookie_secure,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

fn read_config_file(path: &Path) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            tracing::info!(path = %path.display(), "Loaded config file");
            Ok(Some(raw))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No config file found, using environment");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn default_database_url() -> Result<String, ConfigError> {
    let path = utils::assets::database_path()?;
    Ok(format!("sqlite://{}?mode=rwc", path.to_string_lossy()))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = Config::from_sources(
            None,
            env_of(&[("JWT_SECRET", "s3cret"), ("DATABASE_URL", "sqlite::memory:")]),
        )
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.jwt_issuer, DEFAULT_JWT_ISSUER);
        assert_eq!(config.session_ttl_secs, DEFAULT_SESSION_TTL_SECS);
        assert!(config.cookie_secure);
        assert_eq!(config.jwt_secret_bytes(), b"s3cret");
    }

    #[test]
    fn missing_secret_is_a_validation_error() {
        let err = Config::from_sources(None, env_of(&[("DATABASE_URL", "sqlite::memory:")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = Config::from_sources(
            None,
            env_of(&[("DATABASE_URL", "sqlite::memory:"), ("JWT_SECRET", "   ")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let raw = r#"{
            "host": "0.0.0.0",
            "port": 8080,
            "database_url": "sqlite://file.db",
            "jwt_secret": "from-file",
            "cookie_secure": false
        }"#;

        let config = Config::from_sources(
            Some(raw),
            env_of(&[("PORT", "9090"), ("JWT_SECRET", "from-env")]),
        )
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9090);
        assert_eq!(config.database_url, "sqlite://file.db");
        assert_eq!(config.jwt_secret_bytes(), b"from-env");
        assert!(!config.cookie_secure);
    }

    #[test]
    fn backend_port_takes_precedence_over_port() {
        let config = Config::from_sources(
            None,
            env_of(&[
                ("JWT_SECRET", "s"),
                ("DATABASE_URL", "sqlite::memory:"),
                ("BACKEND_PORT", "4000"),
                ("PORT", "5000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port, 4000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let base = [("JWT_SECRET", "s"), ("DATABASE_URL", "sqlite::memory:")];

        for (key, value) in [
            ("PORT", "not-a-port"),
            ("SESSION_TTL_SECS", "0"),
            ("SESSION_TTL_SECS", "soon"),
            ("COOKIE_SECURE", "maybe"),
        ] {
            let mut pairs = base.to_vec();
            pairs.push((key, value));
            let err = Config::from_sources(None, env_of(&pairs)).unwrap_err();
            assert!(
                matches!(err, ConfigError::ValidationError(_)),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let err = Config::from_sources(Some("{ not json"), env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn reads_config_file_from_disk() {
        let dir = test_support::temp_dir();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "jwt_issuer": "tasks.example" }"#).unwrap();

        let raw = read_config_file(&path).unwrap();
        let config = Config::from_sources(
            raw.as_deref(),
            env_of(&[("JWT_SECRET", "s"), ("DATABASE_URL", "sqlite::memory:")]),
        )
        .unwrap();

        assert_eq!(config.jwt_issuer, "tasks.example");
        assert!(read_config_file(&dir.path().join("missing.json")).unwrap().is_none());
    }
}
