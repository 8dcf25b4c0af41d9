//! Error types for the board watcher

use thiserror::Error;

/// Result type alias for watcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while watching a board
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to initialize the watcher
    #[error("Watcher initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load a page
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// Failed to load or parse the piece manifest
    #[error("Manifest error: {0}")]
    ManifestError(String),

    /// Failed to scan the document
    #[error("Scan failed: {0}")]
    ScanError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
