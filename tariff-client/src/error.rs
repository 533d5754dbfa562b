#[derive(thiserror::Error, Debug)]
pub enum DataAccessError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid column identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("row in {table} is missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}
