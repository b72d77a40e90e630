//! Error types for page construction and configuration

use thiserror::Error;

/// Result type alias for slideshow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or loading a page.
///
/// Timer-driven actions never produce these: a missing display target or an
/// empty marker set is a silent no-op at tick time.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Failed to parse a config or page file
    #[error("Parse failed: {0}")]
    ParseError(String),

    /// Filesystem error while reading a page or config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}
