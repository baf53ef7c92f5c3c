use thiserror::Error;

/// Errors that can occur in seqmend-core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported dialect '{0}': expected one of postgres, mysql, oracle, sqlserver, h2")]
    UnsupportedDialect(String),
}

pub type Result<T> = std::result::Result<T, Error>;
