//! Invoice Request Service
//!
//! Lets a customer (partner) request an invoice for a confirmed sale order
//! from an external web page, without logging in to the ERP. Requests are
//! persisted locally; sale orders, partners and invoices stay owned by the
//! ERP and are reached through the shared object-layer client.

pub mod error;
pub mod lifecycle;
pub mod model;
pub mod store;
pub mod web;

pub use error::{RequestError, Result};
pub use model::{InvoiceRequest, RequestState};
