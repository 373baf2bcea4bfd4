use thiserror::Error;

/// A collector configuration that cannot be used
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration parameter: {key}")]
    Missing { key: &'static str },

    #[error("Invalid configuration parameter {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// A raw listing the processor cannot enrich
#[derive(Debug, Error, PartialEq)]
pub enum ProcessError {
    #[error("listing has no title")]
    MissingTitle,
}
