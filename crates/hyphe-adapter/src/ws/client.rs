/*
[INPUT]:  WebSocket URL, API key, market symbols, cancellation token
[OUTPUT]: One order-book snapshot per fetch, connection always closed
[POS]:    WebSocket layer - fetch orchestration and connection lifecycle
[UPDATE]: When adding new channels or changing connection logic
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};
use url::Url;

use super::connection::Connection;
use super::handshake::Handshake;
use super::message::Channel;
use super::snapshot::extract_snapshot;
use super::transport::{Connector, TungsteniteConnector};
use crate::http::{HypheError, Result};
use crate::types::{Environment, MarketSymbol, OrderBookSnapshot};

/// Streaming client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Deadline for a whole fetch: dial, handshake and snapshot
    pub timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Production)
    }
}

impl WsConfig {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            url: environment.websocket_url().to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fetches order-book snapshots over the venue's streaming socket.
///
/// Every fetch dials its own connection and closes it before returning.
pub struct HypheWebSocket {
    url: Url,
    api_key: Option<String>,
    timeout: Duration,
    connector: Arc<dyn Connector>,
}

impl HypheWebSocket {
    /// Production endpoint with default configuration
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(WsConfig::default(), Some(api_key.into()))
    }

    pub fn for_environment(environment: Environment, api_key: Option<String>) -> Result<Self> {
        Self::with_config(WsConfig::for_environment(environment), api_key)
    }

    pub fn with_config(config: WsConfig, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            url: Url::parse(&config.url)?,
            api_key: api_key.filter(|key| !key.is_empty()),
            timeout: config.timeout,
            connector: Arc::new(TungsteniteConnector),
        })
    }

    /// Replace the socket factory
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| HypheError::Config("no api key specified".to_string()))
    }

    fn timeout_error(&self) -> HypheError {
        HypheError::Timeout {
            duration: self.timeout,
        }
    }

    /// Snapshot of the `BASE-QUOTE` book from the `prices` channel
    pub async fn get_price_event(&self, base: &str, quote: &str) -> Result<OrderBookSnapshot> {
        self.get_price_event_with_cancel(base, quote, &CancellationToken::new())
            .await
    }

    pub async fn get_price_event_with_cancel(
        &self,
        base: &str,
        quote: &str,
        cancel: &CancellationToken,
    ) -> Result<OrderBookSnapshot> {
        let symbol = MarketSymbol::new(base, quote);
        self.fetch_snapshot(vec![Channel::prices([symbol])], cancel)
            .await
    }

    /// Dial, authenticate, subscribe to `channels` and return the first price event.
    ///
    /// The connection is closed on every path, including cancellation and the
    /// configured deadline.
    pub async fn fetch_snapshot(
        &self,
        channels: Vec<Channel>,
        cancel: &CancellationToken,
    ) -> Result<OrderBookSnapshot> {
        let api_key = self.api_key()?;
        let markets: Vec<String> = channels
            .iter()
            .flat_map(|channel| channel.markets.iter().cloned())
            .collect();
        let span = info_span!("ws_fetch", url = %self.url, markets = ?markets);

        self.run_fetch(api_key, channels, cancel)
            .instrument(span)
            .await
    }

    async fn run_fetch(
        &self,
        api_key: &str,
        channels: Vec<Channel>,
        cancel: &CancellationToken,
    ) -> Result<OrderBookSnapshot> {
        let mut handshake = Handshake::new(api_key, channels);
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let dialed = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HypheError::Cancelled),
            _ = &mut deadline => Err(self.timeout_error()),
            dialed = handshake.dial(self.connector.as_ref(), &self.url) => dialed,
        };
        let mut connection = match dialed {
            Ok(connection) => connection,
            Err(err) => {
                handshake.fail();
                return Err(err);
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HypheError::Cancelled),
            _ = &mut deadline => Err(self.timeout_error()),
            outcome = negotiate_and_extract(&mut handshake, &mut connection) => outcome,
        };

        connection.close().await;

        match &outcome {
            Ok(snapshot) => info!(
                asks = snapshot.asks().len(),
                bids = snapshot.bids().len(),
                "price snapshot received"
            ),
            Err(err) => {
                handshake.fail();
                warn!(error = %err, kind = %err.kind(), "price snapshot fetch failed");
            }
        }

        outcome
    }
}

async fn negotiate_and_extract(
    handshake: &mut Handshake,
    connection: &mut Connection,
) -> Result<OrderBookSnapshot> {
    handshake.negotiate(connection).await?;
    extract_snapshot(handshake, connection).await
}

impl fmt::Debug for HypheWebSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HypheWebSocket")
            .field("url", &self.url.as_str())
            .field("has_api_key", &self.api_key.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}
