/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Hyphe adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from http
pub use http::{ClientConfig, ErrorKind, HypheClient, HypheError, Result, TOO_MANY_REQUESTS};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{Channel, HandshakeState, HypheWebSocket, WsConfig};
