//! Error handling for the multiround-alignment core
//!
//! This module defines the custom error type and a Result alias used
//! throughout the crate.

use thiserror::Error;

/// Main error type for multiround-alignment operations
#[derive(Error, Debug)]
pub enum AlignmentError {
    /// IO errors (session files, existence probes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors related to session documents as a whole
    #[error("Session error: {0}")]
    Session(String),

    /// A registered field whose persisted value does not decode into the
    /// field's type. Fatal to the `read` or `write` call that hit it.
    #[error("Field {key:?} could not be decoded: {source}")]
    FieldDecode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Unregistering a subscriber key that was never registered
    #[error("No subscriber registered under key {0:?}")]
    UnknownSubscriber(String),

    /// Resizing a channel list name that is not in the registry
    #[error("{0:?} is not a registered configuration field")]
    UnknownChannel(String),

    /// Resizing a registered field that is a scalar, not a channel list
    #[error("Configuration field {0:?} is not a channel list")]
    NotAChannel(String),

    /// A refinement-round or channel index beyond the configured count
    #[error("Index {index} out of range ({len} configured)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Failure reported by an external pipeline tool. Non-fatal to the
    /// application; the blackboard keeps whatever state existed before
    /// the call.
    #[error("Tool {tool} failed: {message}")]
    Tool { tool: String, message: String },
}

/// Result type alias for multiround-alignment operations
pub type Result<T> = std::result::Result<T, AlignmentError>;
