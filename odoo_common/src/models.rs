//! Wire models for ERP-owned records.
//!
//! The object layer serializes absent scalars as `false` and many2one
//! references as `[id, display_name]` pairs. The deserializers here fold
//! both conventions into `Option`s so the rest of the code never sees the
//! falsy encoding.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A many2one reference as returned by `read`/`search_read`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Many2one {
    pub id: i64,
    pub name: String,
}

impl<'de> Deserialize<'de> for Many2one {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Array(parts) if !parts.is_empty() => {
                let id = parts[0]
                    .as_i64()
                    .ok_or_else(|| D::Error::custom("many2one id must be an integer"))?;
                let name = parts
                    .get(1)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok(Many2one { id, name })
            }
            Value::Number(n) => {
                let id = n
                    .as_i64()
                    .ok_or_else(|| D::Error::custom("many2one id must be an integer"))?;
                Ok(Many2one {
                    id,
                    name: String::new(),
                })
            }
            _ => Err(D::Error::custom("expected [id, display_name] pair")),
        }
    }
}

/// Deserializes an optional many2one field, treating `false`/`null` as absent.
pub fn many2one_opt<'de, D>(deserializer: D) -> Result<Option<Many2one>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Bool(false) | Value::Null => Ok(None),
        other => serde_json::from_value(other).map(Some).map_err(D::Error::custom),
    }
}

/// Deserializes an optional string field, treating `false`/`null` as absent.
pub fn falsy_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Bool(false) | Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(D::Error::custom(format!(
            "expected string or false, got {other}"
        ))),
    }
}

/// Serializes a missing id as `false`, the object layer's convention.
pub fn id_or_false<S>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(id) => serializer.serialize_i64(*id),
        None => serializer.serialize_bool(false),
    }
}

/// A sale order row. Fields not covered by the caller's field selection
/// deserialize to their defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaleOrder {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "many2one_opt")]
    pub partner_id: Option<Many2one>,
    #[serde(default, deserialize_with = "falsy_string")]
    pub date_order: Option<String>,
    #[serde(default)]
    pub amount_total: f64,
    #[serde(default, deserialize_with = "falsy_string")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "falsy_string")]
    pub invoice_status: Option<String>,
    #[serde(default, deserialize_with = "many2one_opt")]
    pub currency_id: Option<Many2one>,
    #[serde(default)]
    pub order_line: Vec<i64>,
}

impl SaleOrder {
    /// True when the order can still be submitted for invoicing.
    pub fn is_invoiceable(&self) -> bool {
        self.state.as_deref() == Some("sale")
            && self.invoice_status.as_deref() == Some("to invoice")
    }
}

/// A partner (customer) row.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Partner {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "falsy_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "falsy_string")]
    pub phone: Option<String>,
}

/// An invoice (account.move) row.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Invoice {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "falsy_string")]
    pub state: Option<String>,
}
