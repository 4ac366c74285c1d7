// src/error.rs

//! Error types shared across the crate

use thiserror::Error;

/// Errors produced while patching recipes or loading resolver configuration
#[derive(Error, Debug)]
pub enum Error {
    /// The rewritten recipe is not syntactically valid source
    #[error("Validation failed at line {line}: {message}")]
    Validation { line: usize, message: String },

    /// File could not be read or written
    #[error("I/O error: {0}")]
    IoError(String),

    /// Malformed input (package references, conandata, policy files)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Build configuration rejected (e.g. compiler too old)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<serde_yaml_ng::Error> for Error {
    fn from(e: serde_yaml_ng::Error) -> Self {
        Error::ParseError(format!("Invalid YAML: {}", e))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ParseError(format!("Invalid TOML: {}", e))
    }
}

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
