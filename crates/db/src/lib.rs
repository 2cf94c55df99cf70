use std::time::Duration;

use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;

pub mod entities;
pub mod models;
pub mod seed;
pub mod types;

pub use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};

pub type DbPool = DatabaseConnection;

#[derive(Clone)]
pub struct DBService {
    pub pool: DbPool,
}

impl DBService {
    /// Connects to `database_url` and brings the schema up to date.
    pub async fn new(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        options
            .connect_timeout(Duration::from_secs(30))
            .sqlx_logging(false);

        let pool = Database::connect(options).await?;
        db_migration::Migrator::up(&pool, None).await?;
        tracing::debug!("Database migrations applied");

        Ok(DBService { pool })
    }
}


#[cfg(test)]
mod tests {
    use super::DBService;

    #[tokio::test]
    async fn new_creates_schema_in_a_fresh_file_database() {
        let temp = test_support::TempDatabase::new();

        let service = DBService::new(temp.url()).await.unwrap();
        let users = crate::models::user::User::find_teams(&service.pool).await.unwrap();

        assert!(users.is_empty());
        assert!(temp.path().join("db.sqlite").exists());
    }

    #[tokio::test]
    async fn reconnecting_reapplies_no_migrations() {
        let temp = test_support::TempDatabase::new();

        DBService::new(temp.url()).await.unwrap();
        DBService::new(temp.url()).await.unwrap();
    }
}
