/*
[INPUT]:  Connector, API key, subscription channels
[OUTPUT]: Authenticated and subscribed connection (state Ready) or Failed
[POS]:    WebSocket layer - handshake state machine
[UPDATE]: When the venue changes its session protocol
*/

use std::fmt;

use tracing::{debug, info, warn};
use url::Url;

use super::connection::Connection;
use super::message::{Channel, InboundEvent, OutboundMessage};
use super::transport::Connector;
use crate::http::{HypheError, Result};

/// Connecting -> Authenticating -> Subscribing -> Ready, or Failed from any of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    Connecting,
    Authenticating,
    Subscribing,
    Ready,
    Failed,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeState::Connecting => "connecting",
            HandshakeState::Authenticating => "authenticating",
            HandshakeState::Subscribing => "subscribing",
            HandshakeState::Ready => "ready",
            HandshakeState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Drives one connection through authentication and subscription.
///
/// Each stage only runs from its own state, so a handshake sends at most one
/// authenticate and one subscribe request.
#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
    authenticate: OutboundMessage,
    subscribe: OutboundMessage,
}

impl Handshake {
    pub fn new(api_key: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            state: HandshakeState::Connecting,
            authenticate: OutboundMessage::authenticate(api_key),
            subscribe: OutboundMessage::subscribe(channels),
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == HandshakeState::Ready
    }

    /// Mark the handshake failed (cancellation, deadline, later-stage errors)
    pub fn fail(&mut self) {
        if self.state != HandshakeState::Failed {
            self.transition(HandshakeState::Failed);
        }
    }

    fn transition(&mut self, next: HandshakeState) {
        debug!(from = %self.state, to = %next, "handshake transition");
        self.state = next;
    }

    fn expect_state(&self, expected: HandshakeState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(HypheError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn unexpected(&self, event: &InboundEvent) -> HypheError {
        HypheError::UnexpectedEvent {
            state: self.state,
            tag: event.tag().to_string(),
        }
    }

    /// Dial the transport (Connecting -> Authenticating)
    pub async fn dial(&mut self, connector: &dyn Connector, url: &Url) -> Result<Connection> {
        self.expect_state(HandshakeState::Connecting)?;

        match connector.dial(url).await {
            Ok(transport) => {
                self.transition(HandshakeState::Authenticating);
                Ok(Connection::new(transport))
            }
            Err(err) => {
                warn!(url = %url, error = %err, "websocket dial failed");
                self.transition(HandshakeState::Failed);
                Err(err)
            }
        }
    }

    /// Authenticate then subscribe (Authenticating -> Ready).
    ///
    /// On error the state is Failed; closing the connection is the owner's job.
    pub async fn negotiate(&mut self, connection: &mut Connection) -> Result<()> {
        self.expect_state(HandshakeState::Authenticating)?;

        let result = self.run_stages(connection).await;
        if let Err(err) = &result {
            warn!(state = %self.state, error = %err, "handshake failed");
            self.transition(HandshakeState::Failed);
        }
        result
    }

    async fn run_stages(&mut self, connection: &mut Connection) -> Result<()> {
        connection.send(&self.authenticate).await?;
        match connection.next_event().await? {
            InboundEvent::Authenticated => self.transition(HandshakeState::Subscribing),
            other => return Err(self.unexpected(&other)),
        }

        connection.send(&self.subscribe).await?;
        loop {
            match connection.next_event().await? {
                // acknowledgements may be redelivered after subscribe is sent
                InboundEvent::Authenticated => {
                    debug!("duplicate authenticated event discarded");
                }
                InboundEvent::Subscribed => {
                    self.transition(HandshakeState::Ready);
                    info!("websocket session ready");
                    return Ok(());
                }
                other => return Err(self.unexpected(&other)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MarketSymbol;
    use crate::ws::message::FrameError;
    use crate::ws::transport::scripted::{ScriptedConnector, Step};

    const AUTHENTICATED: &str = r#"{"event":"authenticated"}"#;
    const SUBSCRIBED: &str = r#"{"event":"subscribed"}"#;
    const PRICE: &str = r#"{"event":"price","asks":[["100","2"]],"bids":[["99","3"]]}"#;

    fn url() -> Url {
        Url::parse("wss://venue.test/v1/websocket").unwrap()
    }

    fn handshake() -> Handshake {
        Handshake::new("key", vec![Channel::prices([MarketSymbol::new("BTC", "USD")])])
    }

    async fn negotiate(connector: &ScriptedConnector) -> (Handshake, Connection, Result<()>) {
        let mut handshake = handshake();
        let mut connection = handshake.dial(connector, &url()).await.expect("dial");
        let result = handshake.negotiate(&mut connection).await;
        (handshake, connection, result)
    }

    #[tokio::test]
    async fn reaches_ready() {
        let connector = ScriptedConnector::frames(&[AUTHENTICATED, SUBSCRIBED]);
        let (handshake, mut connection, result) = negotiate(&connector).await;

        result.expect("handshake");
        assert_eq!(handshake.state(), HandshakeState::Ready);
        connection.close().await;

        let log = connector.log.lock().unwrap();
        assert_eq!(log.dials, 1);
        assert_eq!(
            log.sent,
            vec![
                r#"{"action":"authenticate","key":"key"}"#.to_string(),
                r#"{"action":"subscribe","channels":[{"name":"prices","markets":["BTC-USD"]}]}"#
                    .to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn tolerates_duplicate_authenticated() {
        let connector =
            ScriptedConnector::frames(&[AUTHENTICATED, AUTHENTICATED, AUTHENTICATED, SUBSCRIBED]);
        let (handshake, mut connection, result) = negotiate(&connector).await;

        result.expect("handshake");
        assert!(handshake.is_ready());
        connection.close().await;
        assert_eq!(connector.log.lock().unwrap().sent.len(), 2);
    }

    #[tokio::test]
    async fn price_before_authenticated_fails() {
        let connector = ScriptedConnector::frames(&[PRICE]);
        let (handshake, mut connection, result) = negotiate(&connector).await;

        match result {
            Err(HypheError::UnexpectedEvent { state, tag }) => {
                assert_eq!(state, HandshakeState::Authenticating);
                assert_eq!(tag, "price");
            }
            other => panic!("expected unexpected-event error, got {other:?}"),
        }
        assert_eq!(handshake.state(), HandshakeState::Failed);
        connection.close().await;

        // subscribe never sent
        assert_eq!(connector.log.lock().unwrap().sent.len(), 1);
    }

    #[tokio::test]
    async fn unknown_tag_while_subscribing_fails() {
        let connector =
            ScriptedConnector::frames(&[AUTHENTICATED, r#"{"event":"error","message":"no such market"}"#]);
        let (handshake, mut connection, result) = negotiate(&connector).await;

        assert!(matches!(
            result,
            Err(HypheError::UnexpectedEvent { state: HandshakeState::Subscribing, ref tag }) if tag == "error"
        ));
        assert_eq!(handshake.state(), HandshakeState::Failed);
        connection.close().await;
    }

    #[tokio::test]
    async fn end_of_stream_while_authenticating() {
        let connector = ScriptedConnector::new(vec![Step::Eof]);
        let (handshake, mut connection, result) = negotiate(&connector).await;

        assert!(matches!(result, Err(HypheError::StreamClosed)));
        assert_eq!(handshake.state(), HandshakeState::Failed);
        connection.close().await;
    }

    #[tokio::test]
    async fn end_of_stream_while_subscribing() {
        let connector = ScriptedConnector::new(vec![Step::Frame(AUTHENTICATED.into()), Step::Eof]);
        let (handshake, mut connection, result) = negotiate(&connector).await;

        assert!(matches!(result, Err(HypheError::StreamClosed)));
        assert_eq!(handshake.state(), HandshakeState::Failed);
        connection.close().await;
    }

    #[tokio::test]
    async fn missing_event_field_is_decode_error() {
        let connector = ScriptedConnector::frames(&[r#"{"status":"ok"}"#]);
        let (_, mut connection, result) = negotiate(&connector).await;

        assert!(matches!(
            result,
            Err(HypheError::Decode(FrameError::MissingEvent))
        ));
        connection.close().await;
    }

    #[tokio::test]
    async fn dial_failure_is_failed_state() {
        let connector = ScriptedConnector::refusing();
        let mut handshake = handshake();

        let err = handshake.dial(&connector, &url()).await.expect_err("dial refused");
        assert!(matches!(err, HypheError::Connection(_)));
        assert_eq!(handshake.state(), HandshakeState::Failed);
    }

    #[tokio::test]
    async fn stages_cannot_rerun() {
        let connector = ScriptedConnector::frames(&[AUTHENTICATED, SUBSCRIBED]);
        let (mut handshake, mut connection, result) = negotiate(&connector).await;
        result.expect("handshake");

        let again = handshake.negotiate(&mut connection).await;
        assert!(matches!(
            again,
            Err(HypheError::InvalidState {
                expected: HandshakeState::Authenticating,
                actual: HandshakeState::Ready
            })
        ));

        let redial = handshake.dial(&connector, &url()).await;
        assert!(matches!(redial, Err(HypheError::InvalidState { .. })));
        connection.close().await;

        let log = connector.log.lock().unwrap();
        assert_eq!(log.dials, 1);
        assert_eq!(log.sent.len(), 2);
    }
}
