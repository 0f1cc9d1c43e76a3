//! Typed client for the Odoo JSON-RPC object layer.
//!
//! One public method per remote operation; nothing dispatches model or
//! method names taken from untrusted input. Authentication happens once in
//! [`OdooApi::connect`] and the handle is immutable afterwards, so it can be
//! shared freely between request handlers.

mod invoices;
mod partners;
mod rpc;
mod sale_orders;

pub use sale_orders::{DEFAULT_ORDER_DETAIL_FIELDS, DEFAULT_ORDER_FIELDS, FILTERABLE_ORDER_FIELDS};

use reqwest::Client;

use crate::config::OdooConfig;
use crate::error::Result;

/// Authenticated handle to one Odoo instance.
pub struct OdooApi {
    pub(crate) client: Client,
    pub(crate) config: OdooConfig,
    pub(crate) uid: i64,
}

impl OdooApi {
    /// Authenticates against the configured database and returns a ready
    /// client.
    ///
    /// Authentication happens once per process lifetime; a failure here
    /// means no request can be served, so callers treat it as fatal.
    pub async fn connect(config: OdooConfig) -> Result<OdooApi> {
        log::info!(
            "Connecting to Odoo at {} (database '{}')",
            config.url,
            config.db
        );
        let client = Client::new();
        let uid = rpc::authenticate(&client, &config).await?;
        log::info!("Authenticated as '{}' (uid {})", config.username, uid);
        Ok(OdooApi {
            client,
            config,
            uid,
        })
    }

    /// User id assigned by the object layer at authentication time.
    pub fn uid(&self) -> i64 {
        self.uid
    }
}

#[cfg(test)]
#[path = "tests/mod.rs"]
mod tests;
