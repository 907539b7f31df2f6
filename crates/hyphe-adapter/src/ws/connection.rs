/*
[INPUT]:  A dialed frame transport
[OUTPUT]: Single-owner connection handle with Open/Closed lifecycle
[POS]:    WebSocket layer - connection lifecycle
[UPDATE]: When changing how sockets are opened, written or closed
*/

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use super::message::{OutboundMessage, encode};
use super::transport::FrameTransport;
use crate::http::{HypheError, Result};

/// Upper bound on the close handshake
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// Owns exactly one transport. Once closed it is never reused.
pub struct Connection {
    transport: Box<dyn FrameTransport>,
    state: ConnectionState,
    close_timeout: Duration,
}

impl Connection {
    pub fn new(transport: Box<dyn FrameTransport>) -> Self {
        Self {
            transport,
            state: ConnectionState::Open,
            close_timeout: CLOSE_TIMEOUT,
        }
    }

    pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            ConnectionState::Open => Ok(()),
            ConnectionState::Closed => Err(HypheError::StreamClosed),
        }
    }

    /// Encode and send one control message
    pub async fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        self.ensure_open()?;
        let frame = encode(message)?;
        self.transport.send_text(frame).await?;
        debug!(action = message.action(), "ws frame sent");
        Ok(())
    }

    pub(crate) async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        self.transport.recv_frame().await
    }

    /// Close the socket. Idempotent; close failures are logged, not returned.
    ///
    /// Gives up after the close timeout; the socket is then released on drop.
    pub async fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;

        match tokio::time::timeout(self.close_timeout, self.transport.close()).await {
            Ok(Ok(())) => debug!("websocket closed"),
            Ok(Err(err)) => debug!(error = %err, "websocket close failed"),
            Err(_) => warn!(timeout = ?self.close_timeout, "websocket close timed out"),
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("state", &self.state).finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.state == ConnectionState::Open {
            warn!("websocket connection dropped without close; socket released on drop");
        }
    }
}
