/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for hyphe-adapter tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use hyphe_adapter::ws::{Connector, FrameTransport, TungsteniteConnector};
use hyphe_adapter::{ClientConfig, HypheClient, HypheWebSocket, Result, WsConfig};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use wiremock::MockServer;

pub const AUTHENTICATED: &str = r#"{"event":"authenticated"}"#;
pub const SUBSCRIBED: &str = r#"{"event":"subscribed"}"#;
pub const PRICE: &str = r#"{"event":"price","asks":[["50010.5","1.5"],["50020","3"]],"bids":[["49990.25","2"]]}"#;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn mock_api_key() -> String {
    "test-api-key".to_string()
}

pub fn client_for(server: &MockServer, api_key: Option<String>) -> HypheClient {
    HypheClient::with_config_and_base_url(ClientConfig::default(), api_key, &server.uri())
        .expect("client init")
}

/// What the scripted venue saw from the client
#[derive(Debug, Default)]
pub struct ServerLog {
    pub received: Vec<String>,
    pub client_closed: bool,
}

/// How the venue ends the session once every batch has been answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangUp {
    /// Send a close frame
    Graceful,
    /// Drop the TCP socket without a close handshake
    Drop,
}

/// Local websocket venue answering each client frame with the next batch of replies
pub struct ScriptedVenue {
    pub url: String,
    handle: JoinHandle<ServerLog>,
}

impl ScriptedVenue {
    pub async fn spawn(batches: Vec<Vec<&'static str>>) -> Self {
        Self::spawn_with(batches, None).await
    }

    /// Answer every batch, then hang up instead of waiting for the client
    pub async fn spawn_then_hang_up(batches: Vec<Vec<&'static str>>, hang_up: HangUp) -> Self {
        Self::spawn_with(batches, Some(hang_up)).await
    }

    async fn spawn_with(batches: Vec<Vec<&'static str>>, hang_up: Option<HangUp>) -> Self {
        let expected_frames = batches.len();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut socket = accept_async(stream).await.expect("upgrade");
            let mut replies = batches.into_iter();
            let mut log = ServerLog::default();

            while let Some(message) = socket.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        log.received.push(text.as_str().to_string());
                        for frame in replies.next().unwrap_or_default() {
                            if socket.send(Message::Text(frame.into())).await.is_err() {
                                return log;
                            }
                        }
                        match hang_up {
                            Some(HangUp::Graceful) if log.received.len() == expected_frames => {
                                let _ = socket.close(None).await;
                                while let Some(Ok(_)) = socket.next().await {}
                                return log;
                            }
                            Some(HangUp::Drop) if log.received.len() == expected_frames => {
                                drop(socket);
                                return log;
                            }
                            _ => {}
                        }
                    }
                    Ok(Message::Close(_)) => {
                        log.client_closed = true;
                        break;
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
            log
        });

        Self {
            url: format!("ws://{addr}"),
            handle,
        }
    }

    pub fn websocket(&self, api_key: Option<String>) -> HypheWebSocket {
        let config = WsConfig {
            url: self.url.clone(),
            timeout: Duration::from_secs(5),
        };
        HypheWebSocket::with_config(config, api_key).expect("websocket init")
    }

    pub async fn finish(self) -> ServerLog {
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("venue did not observe the client hang up")
            .expect("venue task")
    }
}

/// Real connector that counts dials
#[derive(Debug, Default)]
pub struct CountingConnector {
    pub dials: AtomicUsize,
}

impl CountingConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for CountingConnector {
    async fn dial(&self, url: &Url) -> Result<Box<dyn FrameTransport>> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        TungsteniteConnector.dial(url).await
    }
}
