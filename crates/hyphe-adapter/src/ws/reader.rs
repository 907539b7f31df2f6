/*
[INPUT]:  Open connection
[OUTPUT]: One decoded InboundEvent per call
[POS]:    WebSocket layer - event reader shared by handshake and snapshot stages
[UPDATE]: When changing frame decoding or read logging
*/

use tracing::debug;

use super::connection::Connection;
use super::message::{InboundEvent, decode};
use crate::http::client::truncate_for_log;
use crate::http::{HypheError, Result};

const RAW_LOG_MAX_BYTES: usize = 1024;

impl Connection {
    /// Wait for exactly one data frame and decode it.
    ///
    /// End of stream is reported as [`HypheError::StreamClosed`]. Nothing is
    /// read ahead.
    pub async fn next_event(&mut self) -> Result<InboundEvent> {
        let frame = self.recv_frame().await?.ok_or(HypheError::StreamClosed)?;

        match decode(&frame) {
            Ok(event) => {
                debug!(event = event.tag(), bytes = frame.len(), "ws event received");
                Ok(event)
            }
            Err(err) => {
                let preview = truncate_for_log(&String::from_utf8_lossy(&frame), RAW_LOG_MAX_BYTES);
                debug!(error = %err, bytes = frame.len(), message = %preview, "ws frame decode failed");
                Err(err.into())
            }
        }
    }
}
