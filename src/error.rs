//! Error types for callguide.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CallguideError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Durable storage errors
    #[error("Storage read failed for call {call_id}: {message}")]
    StorageRead { call_id: String, message: String },

    #[error("Storage write failed for call {call_id}: {message}")]
    StorageWrite { call_id: String, message: String },

    #[error("Storage delete failed for call {call_id}: {message}")]
    StorageDelete { call_id: String, message: String },

    #[error("Storage sweep failed: {message}")]
    StorageSweep { message: String },

    // Session errors
    #[error("No session found for call {call_id}")]
    SessionNotFound { call_id: String },

    #[error("Failed to restore session {call_id}: {message}")]
    SessionRestore { call_id: String, message: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, CallguideError>;
