// src/error.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    // Credential errors
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    // Chain errors
    #[error("RPC error: {0}")]
    ChainRpc(String),

    #[error("Broadcast failed: {0}")]
    Broadcast(String),

    // Bridge API errors
    #[error("HTTP {status} {path}: {body}")]
    Http {
        status: u16,
        path: String,
        body: String,
    },

    #[error("Auth failed: {0}")]
    Auth(String),

    #[error("Quote failed: {0}")]
    Quote(String),

    #[error("Commit failed: {0}")]
    Commit(String),

    // Local validation errors
    #[error("Precondition failed: {0}")]
    Precondition(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration load failed: {0}")]
    ConfigurationLoadError(String),

    // System errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BridgeError {
    /// Get error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            BridgeError::InvalidKey(_) => "credential",

            BridgeError::ChainRpc(_) | BridgeError::Broadcast(_) => "chain",

            BridgeError::Http { .. }
            | BridgeError::Auth(_)
            | BridgeError::Quote(_)
            | BridgeError::Commit(_) => "bridge_api",

            BridgeError::Precondition(_) => "validation",

            BridgeError::InvalidConfiguration(_) | BridgeError::ConfigurationLoadError(_) => {
                "configuration"
            }

            BridgeError::IoError(_) | BridgeError::SerializationError(_) => "system",
        }
    }
}

// Result type alias for convenience
pub type BridgeResult<T> = Result<T, BridgeError>;
