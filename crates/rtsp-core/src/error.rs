/// Errors classified at the repository boundary.
///
/// `DuplicateKey` is the stable sentinel callers match on to treat a
/// unique-violation as idempotent success (inbox dedup, outbox replay).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("duplicate key")]
    DuplicateKey,

    #[error("not found")]
    NotFound,

    #[error("validation: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Postgres SQLSTATE for unique_violation.
const PG_UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        if is_unique_violation(&value) {
            return Error::DuplicateKey;
        }
        Error::Other(anyhow::Error::from(value))
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(PG_UNIQUE_VIOLATION),
        _ => false,
    }
}
