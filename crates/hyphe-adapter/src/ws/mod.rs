/*
[INPUT]:  WebSocket configuration, API key and subscription channels
[OUTPUT]: Order-book snapshots fetched over a short-lived session
[POS]:    WebSocket layer - session handshake and snapshot fetch
[UPDATE]: When adding new channels or changing connection logic
*/

pub mod client;
pub mod connection;
pub mod handshake;
pub mod message;
pub mod reader;
pub mod snapshot;
pub mod transport;

pub use client::{HypheWebSocket, WsConfig};
pub use connection::{Connection, ConnectionState};
pub use handshake::{Handshake, HandshakeState};
pub use message::{Channel, FrameError, InboundEvent, OutboundMessage, decode, encode};
pub use snapshot::extract_snapshot;
pub use transport::{Connector, FrameTransport, TungsteniteConnector};
