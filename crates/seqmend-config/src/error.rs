use thiserror::Error;

/// Errors that can occur when parsing or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error(transparent)]
    Dialect(#[from] seqmend_core::Error),

    #[error("invalid identifier for {field}: '{value}'")]
    InvalidIdentifier { field: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
