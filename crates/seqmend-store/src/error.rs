use seqmend_core::Dialect;
use thiserror::Error;

/// Errors from the repair and migration path.
///
/// Repair failures are kept distinct from query failures: a failed
/// aggregate query can simply be retried by the caller, while a failed
/// repair statement (Oracle's drop/create pair in particular) can leave the
/// backend needing manual reconciliation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {statement}: {message}")]
    Query { statement: String, message: String },

    #[error("{dialect}: sequence '{sequence}' not found in the catalog; \
             the schema was not created via the expected generator mechanism")]
    SequenceResolution { dialect: Dialect, sequence: String },

    #[error("{dialect}: repair statement failed, manual reconciliation may be needed: \
             {statement}: {message}")]
    Repair {
        dialect: Dialect,
        statement: String,
        message: String,
    },

    #[error("bulk copy failed: {0}")]
    BulkCopy(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from a connection handle.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("execution failed: {0}")]
    Execution(String),
}

impl From<tokio_postgres::Error> for SessionError {
    fn from(e: tokio_postgres::Error) -> Self {
        // Extract database error details if available
        if let Some(db_err) = e.as_db_error() {
            let msg = format!(
                "{}: {} (code: {})",
                db_err.severity(),
                db_err.message(),
                db_err.code().code()
            );
            SessionError::Execution(msg)
        } else {
            SessionError::Execution(e.to_string())
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
