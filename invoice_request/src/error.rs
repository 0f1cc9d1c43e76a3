//! Error types for invoice-request operations

use thiserror::Error;

/// Unified error type for lifecycle operations
#[derive(Debug, Error)]
pub enum RequestError {
    /// Local database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Remote object-layer call failed
    #[error("{0}")]
    Odoo(#[from] odoo_common::OdooError),
    /// Request id does not exist
    #[error("Invoice request {0} not found")]
    NotFound(i64),
}

/// Result alias for lifecycle operations
pub type Result<T> = std::result::Result<T, RequestError>;
