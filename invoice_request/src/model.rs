//! Invoice-request record types.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an invoice request.
///
/// `pending` is the initial state; `approved` is terminal and is only
/// reached together with a generated invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Pending,
    Approved,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Pending => "pending",
            RequestState::Approved => "approved",
        }
    }

    pub fn parse(raw: &str) -> Option<RequestState> {
        match raw {
            "pending" => Some(RequestState::Pending),
            "approved" => Some(RequestState::Approved),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One customer's ask to be invoiced for a sale order.
///
/// The external token is generated at insert time and never regenerated;
/// it is the only handle an unauthenticated party holds.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceRequest {
    pub id: i64,
    pub partner_id: i64,
    pub sale_id: Option<i64>,
    pub invoice_id: Option<i64>,
    pub state: RequestState,
    pub external_token: String,
    pub request_date: String,
    pub processing_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_roundtrips_through_text() {
        assert_eq!(RequestState::parse("pending"), Some(RequestState::Pending));
        assert_eq!(RequestState::parse("approved"), Some(RequestState::Approved));
        assert_eq!(RequestState::parse("done"), None);
        assert_eq!(RequestState::Approved.as_str(), "approved");
    }

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RequestState::Pending).unwrap(),
            "\"pending\""
        );
    }
}
