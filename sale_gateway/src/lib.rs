//! Sale-order REST gateway
//!
//! Stateless facade translating REST calls into operations on the Odoo
//! object layer. Authentication happens once at startup; each endpoint maps
//! 1:1 onto one remote call.

pub mod web;
