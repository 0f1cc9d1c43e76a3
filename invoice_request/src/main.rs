//! Invoice Request Service
//!
//! Serves the external invoice-request form and persists requests to SQLite.
//! Connection settings for the ERP come from the ODOO_* environment
//! variables.

use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use odoo_common::{OdooApi, OdooConfig};

/// External invoice-request service backed by the Odoo object layer
#[derive(Parser, Debug)]
#[command(name = "invoice_request")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8070)]
    port: u16,
}

/// Returns the default database path: ~/.local/share/invoice_request/requests.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invoice_request")
        .join("requests.db")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = PathBuf::from(&args.database);

    log::info!("Starting invoice_request...");
    log::info!("Database path: {}", db_path.display());

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create database directory: {e}");
                std::process::exit(1);
            }
            log::info!("Created directory: {}", parent.display());
        }
    }

    // Open database connection
    let conn = match Connection::open(&db_path) {
        Ok(conn) => {
            log::info!("Opened database: {}", db_path.display());
            conn
        }
        Err(e) => {
            log::error!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    // Initialize database schema
    if let Err(e) = invoice_request::store::init_schema(&conn) {
        log::error!("Failed to initialize database schema: {e}");
        std::process::exit(1);
    }

    // Authenticate once; without a session no request can be served
    let config = OdooConfig::from_env();
    let api = match OdooApi::connect(config).await {
        Ok(api) => api,
        Err(e) => {
            log::error!("Failed to connect to Odoo: {e}");
            std::process::exit(1);
        }
    };

    let db = Arc::new(Mutex::new(conn));
    if let Err(e) = invoice_request::web::serve(db, Arc::new(api), args.port).await {
        log::error!("Web server error: {e}");
        std::process::exit(1);
    }
}
