//! Shared Odoo integration layer
//!
//! This library provides the typed client for the Odoo JSON-RPC object layer
//! together with the wire models, structured search filters, configuration
//! and error types shared by the gateway and the invoice-request service.

pub mod config;
pub mod domain;
pub mod error;
pub mod models;
pub mod odoo_api;

pub use config::OdooConfig;
pub use domain::{validate_order_clause, Condition, Filter, Operator};
pub use error::{OdooError, Result};
pub use models::{Invoice, Many2one, Partner, SaleOrder};
pub use odoo_api::OdooApi;
