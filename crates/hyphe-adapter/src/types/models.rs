/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{OrderStatus, OrderType, Side};
use crate::http::HypheError;

/// Asset pair in `BASE-QUOTE` form, e.g. `BTC-USD`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketSymbol {
    base: String,
    quote: String,
}

impl MarketSymbol {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl fmt::Display for MarketSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

impl FromStr for MarketSymbol {
    type Err = HypheError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.split_once('-') {
            Some((base, quote))
                if !base.is_empty() && !quote.is_empty() && !quote.contains('-') =>
            {
                Ok(Self::new(base, quote))
            }
            _ => Err(HypheError::Config(format!(
                "market symbol must look like BASE-QUOTE, got '{raw}'"
            ))),
        }
    }
}

/// One `[price, quantity]` level as sent by the venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel(pub String, pub String);

impl PriceLevel {
    pub fn new(price: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self(price.into(), quantity.into())
    }

    pub fn price(&self) -> Result<Decimal, rust_decimal::Error> {
        Decimal::from_str(&self.0)
    }

    pub fn quantity(&self) -> Result<Decimal, rust_decimal::Error> {
        Decimal::from_str(&self.1)
    }
}

/// Point-in-time copy of a price event's asks and bids.
///
/// Built once from a single frame and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    asks: Vec<PriceLevel>,
    bids: Vec<PriceLevel>,
}

pub type LiquidityBook = OrderBookSnapshot;

impl OrderBookSnapshot {
    pub fn new(asks: Vec<PriceLevel>, bids: Vec<PriceLevel>) -> Self {
        Self { asks, bids }
    }

    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    /// First ask level, in venue order
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// First bid level, in venue order
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }
}

/// Response of `GET /prices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyPrices {
    pub currency: String,
    #[serde(default)]
    pub crypto_assets: HashMap<String, CryptoAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoAsset {
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub ask: Decimal,
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub ask_vol: Decimal,
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub bid: Decimal,
    #[serde(
        deserialize_with = "serde_helpers::deserialize_decimal",
        serialize_with = "serde_helpers::serialize_decimal"
    )]
    pub bid_vol: Decimal,
}

/// Order as sent to and returned by `POST /orders`.
///
/// Response-only fields (`id`, `status`) stay `None` until the venue fills
/// them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub crypto_asset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub side: Side,
    pub order_type: OrderType,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiat_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_transfer_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl Order {
    pub fn market(crypto_asset: impl Into<String>, side: Side) -> Self {
        Self::with_type(crypto_asset, side, OrderType::Market)
    }

    pub fn quote(crypto_asset: impl Into<String>, side: Side, quote_id: impl Into<String>) -> Self {
        let mut order = Self::with_type(crypto_asset, side, OrderType::Quote);
        order.quote_id = Some(quote_id.into());
        order
    }

    fn with_type(crypto_asset: impl Into<String>, side: Side, order_type: OrderType) -> Self {
        Self {
            id: None,
            crypto_asset: crypto_asset.into(),
            currency: None,
            side,
            order_type,
            price: None,
            amount: None,
            fiat_amount: None,
            ref_id: None,
            quote_id: None,
            bank_transfer_ref: None,
            status: None,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_fiat_amount(mut self, fiat_amount: Decimal) -> Self {
        self.fiat_amount = Some(fiat_amount);
        self
    }

    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }

    /// Attach a random client reference for idempotent bookkeeping
    pub fn with_generated_ref_id(self) -> Self {
        self.with_ref_id(Uuid::new_v4().to_string())
    }
}

mod serde_helpers {
    use super::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use std::str::FromStr;

    /// Accepts either a JSON number or a numeric string
    pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        if let Some(raw) = value.as_str() {
            return Decimal::from_str(raw.trim()).map_err(serde::de::Error::custom);
        }

        if value.is_number() {
            return Decimal::from_str(&value.to_string()).map_err(serde::de::Error::custom);
        }

        Err(serde::de::Error::custom("invalid decimal value"))
    }

    pub fn serialize_decimal<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }
}
