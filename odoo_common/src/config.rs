//! Connection configuration for the Odoo object layer.

/// Connection settings for one Odoo instance.
///
/// Built once at startup and handed to [`crate::OdooApi::connect`]; nothing
/// else reads the environment.
#[derive(Debug, Clone)]
pub struct OdooConfig {
    pub url: String,
    pub db: String,
    pub username: String,
    pub password: String,
}

impl OdooConfig {
    pub fn new(
        url: impl Into<String>,
        db: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            db: db.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Reads `ODOO_URL`, `ODOO_DB`, `ODOO_USERNAME` and `ODOO_PASSWORD`,
    /// falling back to local development defaults.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("ODOO_URL").unwrap_or_else(|_| "http://localhost:8069".into()),
            db: std::env::var("ODOO_DB").unwrap_or_else(|_| "odoo".into()),
            username: std::env::var("ODOO_USERNAME").unwrap_or_else(|_| "admin".into()),
            password: std::env::var("ODOO_PASSWORD").unwrap_or_else(|_| "admin".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_explicit_values() {
        let config = OdooConfig::new("http://erp.local:8069", "prod", "svc", "s3cret");
        assert_eq!(config.url, "http://erp.local:8069");
        assert_eq!(config.db, "prod");
        assert_eq!(config.username, "svc");
        assert_eq!(config.password, "s3cret");
    }
}
