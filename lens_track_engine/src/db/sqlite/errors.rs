use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Could not connect to the database: {0}")]
    ConnectionError(#[from] sqlx::Error),
    #[error("Could not run migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}
