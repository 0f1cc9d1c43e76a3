//! Structured search filters.
//!
//! The listing endpoint accepts a client-supplied filter expression. It is
//! parsed here into `(field, operator, value)` conditions and checked against
//! operator and field allow-lists before anything reaches the object layer.
//! The raw text is never evaluated.

use serde_json::{json, Value};

use crate::error::{OdooError, Result};

/// Comparison operators accepted in filter conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    NotIn,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
            Operator::In => "in",
            Operator::NotIn => "not in",
        }
    }

    /// Maps an operator token to its variant; unknown tokens are rejected.
    pub fn parse(raw: &str) -> Option<Operator> {
        match raw {
            "=" => Some(Operator::Eq),
            "!=" => Some(Operator::NotEq),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::Gte),
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::Lte),
            "like" => Some(Operator::Like),
            "ilike" => Some(Operator::Ilike),
            "in" => Some(Operator::In),
            "not in" => Some(Operator::NotIn),
            _ => None,
        }
    }
}

/// One `(field, operator, value)` condition.
#[derive(Debug, Clone)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

/// A validated conjunction of filter conditions.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for internally constructed equality filters.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            operator: Operator::Eq,
            value: value.into(),
        });
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Parses a client-supplied JSON filter expression.
    ///
    /// Accepts only a JSON array of `[field, operator, value]` triples with
    /// allow-listed fields and operators and scalar values (`in`/`not in`
    /// take an array of scalars). Logical-operator atoms and nested
    /// expressions are rejected.
    pub fn parse(raw: &str, allowed_fields: &[&str]) -> Result<Filter> {
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|e| OdooError::InvalidDomain(format!("filter is not valid JSON: {e}")))?;
        let Value::Array(items) = parsed else {
            return Err(OdooError::InvalidDomain(
                "filter must be a JSON array of [field, operator, value] triples".to_string(),
            ));
        };

        let mut filter = Filter::new();
        for item in items {
            let Value::Array(triple) = item else {
                return Err(OdooError::InvalidDomain(
                    "each condition must be a [field, operator, value] triple".to_string(),
                ));
            };
            if triple.len() != 3 {
                return Err(OdooError::InvalidDomain(format!(
                    "condition has {} element(s), expected 3",
                    triple.len()
                )));
            }
            let Some(field) = triple[0].as_str() else {
                return Err(OdooError::InvalidDomain(
                    "condition field must be a string".to_string(),
                ));
            };
            if !allowed_fields.contains(&field) {
                return Err(OdooError::InvalidDomain(format!(
                    "field '{field}' is not filterable"
                )));
            }
            let Some(op_raw) = triple[1].as_str() else {
                return Err(OdooError::InvalidDomain(
                    "condition operator must be a string".to_string(),
                ));
            };
            let Some(operator) = Operator::parse(op_raw) else {
                return Err(OdooError::InvalidDomain(format!(
                    "operator '{op_raw}' is not allowed"
                )));
            };
            let value = triple[2].clone();
            validate_value(operator, &value)?;
            filter.push(Condition {
                field: field.to_string(),
                operator,
                value,
            });
        }
        Ok(filter)
    }

    /// Wire form: a list of `[field, operator, value]` triples.
    pub fn to_rpc(&self) -> Value {
        Value::Array(
            self.conditions
                .iter()
                .map(|c| json!([c.field, c.operator.as_str(), c.value]))
                .collect(),
        )
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_) | Value::Number(_) | Value::Bool(_)
    )
}

fn validate_value(operator: Operator, value: &Value) -> Result<()> {
    match operator {
        Operator::In | Operator::NotIn => match value {
            Value::Array(items) if items.iter().all(is_scalar) => Ok(()),
            _ => Err(OdooError::InvalidDomain(format!(
                "operator '{}' takes an array of scalar values",
                operator.as_str()
            ))),
        },
        _ => {
            if is_scalar(value) {
                Ok(())
            } else {
                Err(OdooError::InvalidDomain(
                    "condition value must be a scalar".to_string(),
                ))
            }
        }
    }
}

/// Validates a client-supplied sort clause (`"field [asc|desc], ..."`).
///
/// Returns the normalized clause; fields must come from `allowed_fields`.
pub fn validate_order_clause(raw: &str, allowed_fields: &[&str]) -> Result<String> {
    let mut terms = Vec::new();
    for term in raw.split(',') {
        let term = term.trim();
        if term.is_empty() {
            return Err(OdooError::InvalidDomain(
                "sort clause contains an empty term".to_string(),
            ));
        }
        let mut words = term.split_whitespace();
        let field = words.next().unwrap_or_default();
        if !allowed_fields.contains(&field) {
            return Err(OdooError::InvalidDomain(format!(
                "field '{field}' is not sortable"
            )));
        }
        match words.next() {
            None => terms.push(field.to_string()),
            Some(direction)
                if direction.eq_ignore_ascii_case("asc")
                    || direction.eq_ignore_ascii_case("desc") =>
            {
                if words.next().is_some() {
                    return Err(OdooError::InvalidDomain(format!(
                        "unexpected token after sort direction in '{term}'"
                    )));
                }
                terms.push(format!("{field} {}", direction.to_ascii_lowercase()));
            }
            Some(other) => {
                return Err(OdooError::InvalidDomain(format!(
                    "sort direction '{other}' is not valid (use asc or desc)"
                )));
            }
        }
    }
    if terms.is_empty() {
        return Err(OdooError::InvalidDomain("sort clause is empty".to_string()));
    }
    Ok(terms.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[&str] = &["name", "state", "partner_id", "amount_total"];

    #[test]
    fn parses_triples() {
        let filter = Filter::parse(r#"[["state", "=", "sale"], ["amount_total", ">", 100]]"#, FIELDS)
            .unwrap();
        assert_eq!(filter.len(), 2);
        assert_eq!(
            filter.to_rpc(),
            json!([["state", "=", "sale"], ["amount_total", ">", 100]])
        );
    }

    #[test]
    fn parses_empty_filter() {
        let filter = Filter::parse("[]", FIELDS).unwrap();
        assert!(filter.is_empty());
    }

    #[test]
    fn parses_in_operator_with_array_value() {
        let filter = Filter::parse(r#"[["state", "in", ["sale", "done"]]]"#, FIELDS).unwrap();
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn rejects_non_json_input() {
        assert!(Filter::parse("__import__('os')", FIELDS).is_err());
    }

    #[test]
    fn rejects_logical_operator_atoms() {
        // Prefix-notation atoms are expressions, not triples
        assert!(Filter::parse(r#"["|", ["state", "=", "sale"], ["state", "=", "done"]]"#, FIELDS)
            .is_err());
    }

    #[test]
    fn rejects_unknown_field() {
        assert!(Filter::parse(r#"[["password", "=", "x"]]"#, FIELDS).is_err());
    }

    #[test]
    fn rejects_unknown_operator() {
        assert!(Filter::parse(r#"[["name", "=like", "x%"]]"#, FIELDS).is_err());
    }

    #[test]
    fn rejects_object_values() {
        assert!(Filter::parse(r#"[["name", "=", {"$gt": 1}]]"#, FIELDS).is_err());
    }

    #[test]
    fn rejects_scalar_value_for_in() {
        assert!(Filter::parse(r#"[["state", "in", "sale"]]"#, FIELDS).is_err());
    }

    #[test]
    fn builder_produces_equality_conditions() {
        let filter = Filter::new().eq("state", "sale").eq("partner_id", 7);
        assert_eq!(
            filter.to_rpc(),
            json!([["state", "=", "sale"], ["partner_id", "=", 7]])
        );
    }

    #[test]
    fn normalizes_order_clause() {
        let clause = validate_order_clause("name ASC, amount_total desc", FIELDS).unwrap();
        assert_eq!(clause, "name asc, amount_total desc");
    }

    #[test]
    fn accepts_bare_field_order() {
        assert_eq!(validate_order_clause("name", FIELDS).unwrap(), "name");
    }

    #[test]
    fn rejects_order_with_unknown_field() {
        assert!(validate_order_clause("secret desc", FIELDS).is_err());
    }

    #[test]
    fn rejects_order_with_injection_tokens() {
        assert!(validate_order_clause("name; DROP TABLE", FIELDS).is_err());
        assert!(validate_order_clause("name desc extra", FIELDS).is_err());
    }
}
