//! Response payload exchanged between client and server.

use serde::{Deserialize, Serialize};

/// Success body for `GET /nocontext`.
pub const NO_CONTEXT_MESSAGE: &str = "request complete!";

/// Success body for `GET /context`.
pub const WITH_CONTEXT_MESSAGE: &str = "request w/context complete!";

/// Body returned with every 500 response.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// The single-field JSON message both endpoints return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub message: String,
}

impl RpcResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_to_single_field_object() {
        let body = RpcResponse::new(NO_CONTEXT_MESSAGE);
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"message":"request complete!"}"#);
    }

    #[test]
    fn test_round_trips_through_json() {
        let body = RpcResponse::new(WITH_CONTEXT_MESSAGE);
        let decoded: RpcResponse = serde_json::from_str(&serde_json::to_string(&body).unwrap()).unwrap();
        assert_eq!(decoded, body);
    }
}
