//! Error handling module for ytclip

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Startup and top-level error type
#[derive(Error, Debug)]
pub enum YtClipError {
    /// A required configuration option has no value
    #[error("Missing required configuration: {key}")]
    MissingConfig { key: String },

    /// A configuration value is out of range or malformed
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration file {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Required external tool missing
    #[error("Required tool not found: {tool}. Install it or set tools.{config_key}")]
    ToolMissing { tool: String, config_key: String },

    /// Logging could not be initialised
    #[error("Failed to initialize logging: {message}")]
    LoggingInit { message: String },

    /// Pipeline or adapter error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for ytclip operations
pub type YtClipResult<T> = std::result::Result<T, YtClipError>;
