/*
[INPUT]:  Outbound control messages, raw inbound frame bytes
[OUTPUT]: Encoded JSON frames, typed InboundEvent values
[POS]:    WebSocket layer - frame codec
[UPDATE]: When adding new message types or changing format
*/

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{MarketSymbol, PriceLevel};

pub const AUTHENTICATED_EVENT: &str = "authenticated";
pub const SUBSCRIBED_EVENT: &str = "subscribed";
pub const PRICE_EVENT: &str = "price";
pub const PRICE_CHANNEL: &str = "prices";

/// Named subscription topic scoped to a set of markets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub markets: Vec<String>,
}

impl Channel {
    pub fn new<I>(name: impl Into<String>, markets: I) -> Self
    where
        I: IntoIterator<Item = MarketSymbol>,
    {
        Self {
            name: name.into(),
            markets: markets.into_iter().map(|symbol| symbol.to_string()).collect(),
        }
    }

    /// The `prices` channel, which pushes order-book price events
    pub fn prices<I>(markets: I) -> Self
    where
        I: IntoIterator<Item = MarketSymbol>,
    {
        Self::new(PRICE_CHANNEL, markets)
    }
}

/// Client-to-venue control messages
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// Must be the first frame on a connection
    Authenticate { key: String },
    /// Sent once, right after authentication is acknowledged
    Subscribe { channels: Vec<Channel> },
}

impl OutboundMessage {
    pub fn authenticate(key: impl Into<String>) -> Self {
        OutboundMessage::Authenticate { key: key.into() }
    }

    pub fn subscribe(channels: Vec<Channel>) -> Self {
        OutboundMessage::Subscribe { channels }
    }

    pub fn action(&self) -> &'static str {
        match self {
            OutboundMessage::Authenticate { .. } => "authenticate",
            OutboundMessage::Subscribe { .. } => "subscribe",
        }
    }
}

impl fmt::Debug for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundMessage::Authenticate { .. } => f
                .debug_struct("Authenticate")
                .field("key", &"<redacted>")
                .finish(),
            OutboundMessage::Subscribe { channels } => f
                .debug_struct("Subscribe")
                .field("channels", channels)
                .finish(),
        }
    }
}

/// Venue-to-client events, keyed by the mandatory `event` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Authenticated,
    Subscribed,
    PriceUpdate {
        asks: Vec<PriceLevel>,
        bids: Vec<PriceLevel>,
    },
    Unrecognized { tag: String },
}

impl InboundEvent {
    /// Wire tag of the event
    pub fn tag(&self) -> &str {
        match self {
            InboundEvent::Authenticated => AUTHENTICATED_EVENT,
            InboundEvent::Subscribed => SUBSCRIBED_EVENT,
            InboundEvent::PriceUpdate { .. } => PRICE_EVENT,
            InboundEvent::Unrecognized { tag } => tag,
        }
    }
}

/// Frame could not be turned into an [`InboundEvent`]
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("frame has no 'event' discriminator")]
    MissingEvent,
}

// an empty side may arrive as `null`
#[derive(Deserialize)]
struct PricePayload {
    #[serde(default)]
    asks: Option<Vec<PriceLevel>>,
    #[serde(default)]
    bids: Option<Vec<PriceLevel>>,
}

/// Serialize a control message to its JSON text frame
pub fn encode(message: &OutboundMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

/// Decode one inbound frame.
///
/// A missing (or non-string) `event` field is an error, never a default kind.
pub fn decode(frame: &[u8]) -> Result<InboundEvent, FrameError> {
    let value: Value = serde_json::from_slice(frame).map_err(FrameError::Malformed)?;
    let object = value.as_object().ok_or(FrameError::NotAnObject)?;

    let tag = match object.get("event") {
        Some(Value::String(tag)) => tag.as_str(),
        _ => return Err(FrameError::MissingEvent),
    };

    let event = match tag {
        AUTHENTICATED_EVENT => InboundEvent::Authenticated,
        SUBSCRIBED_EVENT => InboundEvent::Subscribed,
        PRICE_EVENT => {
            let payload = PricePayload::deserialize(&value).map_err(FrameError::Malformed)?;
            InboundEvent::PriceUpdate {
                asks: payload.asks.unwrap_or_default(),
                bids: payload.bids.unwrap_or_default(),
            }
        }
        other => InboundEvent::Unrecognized {
            tag: other.to_string(),
        },
    };

    Ok(event)
}
