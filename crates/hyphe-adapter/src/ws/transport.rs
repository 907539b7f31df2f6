/*
[INPUT]:  WebSocket URL
[OUTPUT]: Dialed frame transports (text out, data frames in)
[POS]:    WebSocket layer - socket abstraction over tokio-tungstenite
[UPDATE]: When changing dial options or frame handling
*/

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::http::{HypheError, Result};

/// One dialed socket carrying whole frames
#[async_trait]
pub trait FrameTransport: Send {
    /// Send one text frame
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Wait for the next data frame; `None` once the peer has ended the stream
    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>>;

    /// Close the socket
    async fn close(&mut self) -> Result<()>;
}

/// Opens transports; each call yields an independent socket
#[async_trait]
pub trait Connector: Send + Sync {
    async fn dial(&self, url: &Url) -> Result<Box<dyn FrameTransport>>;
}

/// Production connector backed by tokio-tungstenite
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn dial(&self, url: &Url) -> Result<Box<dyn FrameTransport>> {
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|err| HypheError::Connection(format!("dial {url}: {err}")))?;

        debug!(
            url = %url,
            status = response.status().as_u16(),
            "websocket upgraded"
        );

        Ok(Box::new(TungsteniteTransport { stream }))
    }
}

struct TungsteniteTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

fn is_end_of_stream(err: &WsError) -> bool {
    matches!(
        err,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}

#[async_trait]
impl FrameTransport for TungsteniteTransport {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|err| HypheError::Connection(format!("send failed: {err}")))
    }

    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(Some(text.as_str().as_bytes().to_vec())),
                Some(Ok(WsMessage::Binary(bytes))) => return Ok(Some(bytes.to_vec())),
                // tungstenite answers pings on its own
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => continue,
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!(?frame, "close frame received");
                    return Ok(None);
                }
                Some(Err(err)) if is_end_of_stream(&err) => return Ok(None),
                Some(Err(err)) => {
                    return Err(HypheError::Connection(format!("receive failed: {err}")));
                }
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(err) if is_end_of_stream(&err) => Ok(()),
            Err(err) => Err(HypheError::Connection(format!("close failed: {err}"))),
        }
    }
}
