/*
[INPUT]:  Ready handshake and its connection
[OUTPUT]: OrderBookSnapshot from the next price event
[POS]:    WebSocket layer - snapshot extraction after the handshake
[UPDATE]: When the price event payload changes
*/

use tracing::debug;

use super::connection::Connection;
use super::handshake::{Handshake, HandshakeState};
use super::message::InboundEvent;
use crate::http::{HypheError, Result};
use crate::types::OrderBookSnapshot;

/// Read exactly one more event and turn it into a snapshot.
///
/// Anything but a price event is an unexpected event.
pub async fn extract_snapshot(
    handshake: &Handshake,
    connection: &mut Connection,
) -> Result<OrderBookSnapshot> {
    if !handshake.is_ready() {
        return Err(HypheError::InvalidState {
            expected: HandshakeState::Ready,
            actual: handshake.state(),
        });
    }

    match connection.next_event().await? {
        InboundEvent::PriceUpdate { asks, bids } => {
            debug!(asks = asks.len(), bids = bids.len(), "price snapshot captured");
            Ok(OrderBookSnapshot::new(asks, bids))
        }
        other => Err(HypheError::UnexpectedEvent {
            state: HandshakeState::Ready,
            tag: other.tag().to_string(),
        }),
    }
}
