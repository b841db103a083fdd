//! Error types for Quarry core operations.
//!
//! The indexing and search engine itself is infallible: building, clearing,
//! searching and ranking always produce a well-defined (possibly empty)
//! result. Errors only arise at the edges, where records and configuration
//! are read from disk.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using QuarryError
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Core error types for Quarry operations.
#[derive(Error, Debug)]
pub enum QuarryError {
    // === Catalog Errors ===
    /// The record catalog file is missing
    #[error("catalog not found at {path}")]
    CatalogNotFound { path: PathBuf },

    /// The catalog exists but could not be parsed
    #[error("catalog at {path} is unreadable: {reason}")]
    CatalogParse { path: PathBuf, reason: String },

    // === Configuration Errors ===
    /// Configuration file parsing or validation failed
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    // === I/O Errors ===
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// Serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl QuarryError {
    /// Create a catalog parse error
    pub fn catalog_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        QuarryError::CatalogParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        QuarryError::ConfigError {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for QuarryError {
    fn from(err: serde_json::Error) -> Self {
        QuarryError::Serialization(err.to_string())
    }
}
