/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// `Quote` executes against a previously issued quote id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Quote,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "partially_filled")]
    PartiallyFilled,
    #[serde(rename = "filled")]
    Filled,
    #[serde(rename = "canceled", alias = "cancelled")]
    Cancelled,
    #[serde(rename = "expired")]
    Expired,
    #[serde(rename = "rejected")]
    Rejected,
}

impl OrderStatus {
    /// No further fills can happen
    pub fn is_final(&self) -> bool {
        !matches!(self, OrderStatus::New | OrderStatus::PartiallyFilled)
    }
}

/// Which deployment of the venue to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    pub fn rest_url(&self) -> &'static str {
        match self {
            Environment::Production => "https://prime-access.hyphe.com/v1",
            Environment::Sandbox => "https://sandbox-prime-access.hyphe.com/v1",
        }
    }

    pub fn websocket_url(&self) -> &'static str {
        match self {
            Environment::Production => "wss://prime-access.hyphe.com/v1/websocket",
            Environment::Sandbox => "wss://sandbox-prime-access.hyphe.com/v1/websocket",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_wire_names() {
        let status: OrderStatus = serde_json::from_str("\"partially_filled\"").unwrap();
        assert_eq!(status, OrderStatus::PartiallyFilled);
        assert!(!status.is_final());

        let status: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"canceled\"");
        assert!(status.is_final());
    }

    #[test]
    fn environment_urls() {
        assert_eq!(Environment::default(), Environment::Production);
        assert!(Environment::Sandbox.rest_url().contains("sandbox"));
        assert!(Environment::Sandbox.websocket_url().starts_with("wss://sandbox"));
        assert!(Environment::Production.websocket_url().ends_with("/v1/websocket"));
    }
}
