//! Sale-order REST gateway
//!
//! Translates REST calls into operations on the Odoo object layer.
//! Connection settings come from the ODOO_* environment variables; the
//! listening port from --port or PORT.

use clap::Parser;
use odoo_common::{OdooApi, OdooConfig};

/// REST facade for sale-order operations
#[derive(Parser, Debug)]
#[command(name = "sale_gateway")]
#[command(version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = default_port())]
    port: u16,
}

/// Returns the listening port: the PORT env var, or 5001.
fn default_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5001)
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    log::info!("Starting sale_gateway...");

    // Authenticate once; without a session no request can be served
    let config = OdooConfig::from_env();
    let api = match OdooApi::connect(config).await {
        Ok(api) => api,
        Err(e) => {
            log::error!("Failed to connect to Odoo: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = sale_gateway::web::serve(api, args.port).await {
        log::error!("Web server error: {e}");
        std::process::exit(1);
    }
}
