//! Error types for Odoo object-layer operations

use thiserror::Error;

/// Unified error type for object-layer operations
#[derive(Debug, Error)]
pub enum OdooError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Failed to parse a JSON-RPC response
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// HTTP error status code from the JSON-RPC endpoint
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Fault raised by the remote object layer, reduced to its message
    #[error("Odoo error: {0}")]
    Fault(String),
    /// Credentials rejected during the startup handshake
    #[error("Authentication failed for database '{0}'")]
    AuthenticationFailed(String),
    /// Client-supplied filter or sort clause rejected by validation
    #[error("Invalid filter: {0}")]
    InvalidDomain(String),
}

/// Result alias for object-layer operations
pub type Result<T> = std::result::Result<T, OdooError>;
