/*
[INPUT]:  Mock HTTP responses
[OUTPUT]: Test results for HTTP client
[POS]:    Integration tests - HTTP endpoints
[UPDATE]: When HTTP endpoints change
*/

mod common;

use common::{client_for, mock_api_key, setup_mock_server};
use hyphe_adapter::{
    ClientConfig, Environment, ErrorKind, HypheClient, HypheError, Order, OrderStatus, Side,
    TOO_MANY_REQUESTS,
};
use rust_decimal::Decimal;
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[test]
fn test_client_creation() {
    let client = assert_ok!(HypheClient::new(mock_api_key()));
    assert_eq!(client.base_url().as_str(), Environment::Production.rest_url());
}

#[test]
fn test_sandbox_switch() {
    let mut client = assert_ok!(HypheClient::with_config(ClientConfig::default(), Some(mock_api_key())));
    assert_ok!(client.sandbox());

    assert_eq!(client.config().environment, Environment::Sandbox);
    assert!(client.base_url().as_str().contains("sandbox"));

    let ws = assert_ok!(client.websocket());
    assert!(ws.url().as_str().starts_with("wss://sandbox"));
}

#[tokio::test]
async fn test_get_sends_bearer_key() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/prices"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"currency":"EUR"}"#, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some(mock_api_key()));
    let body = assert_ok!(client.get("/prices").await);

    assert_eq!(body, br#"{"currency":"EUR"}"#.to_vec());
}

#[tokio::test]
async fn test_missing_key_sends_nothing() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.prices().await.expect_err("no key");

    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_rate_limited_without_body() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/prices"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = client_for(&server, Some(mock_api_key()));
    let err = client.prices().await.expect_err("rate limited");

    match &err {
        HypheError::Api { code, message, errors } => {
            assert_eq!(*code, 429);
            assert_eq!(message, TOO_MANY_REQUESTS);
            assert!(errors.is_empty());
        }
        other => panic!("expected api error, got {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::UpstreamRejection);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_rate_limited_keeps_server_message() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_raw(r#"{"error":"slow down"}"#, "application/json"))
        .mount(&server)
        .await;

    let client = client_for(&server, Some(mock_api_key()));
    let err = client.get("/prices").await.expect_err("rate limited");

    assert!(matches!(err, HypheError::Api { code: 429, ref message, .. } if message == "slow down"));
}

#[tokio::test]
async fn test_field_errors_pass_through() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(422).set_body_raw(
            r#"{"error":"validation failed","errors":{"amount":["must be positive"],"crypto_asset":"unknown"}}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some(mock_api_key()));
    let mut order = Order::market("BTC", Side::Buy).with_amount(Decimal::from(-1));
    let before = order.clone();

    let err = client.place_order(&mut order).await.expect_err("rejected");

    assert_eq!(err.status_code(), Some(422));
    let fields = err.field_errors().expect("field errors");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["amount"], serde_json::json!(["must be positive"]));
    assert_eq!(fields["crypto_asset"], serde_json::json!("unknown"));
    assert_eq!(order, before);
}

#[tokio::test]
async fn test_place_order_fills_response_fields() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(201).set_body_raw(
            r#"{"id":"ord-1","crypto_asset":"BTC","currency":"EUR","side":"sell","order_type":"market","amount":"0.5","status":"filled"}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some(mock_api_key()));
    let mut order = Order::market("BTC", Side::Sell)
        .with_currency("EUR")
        .with_amount(Decimal::new(5, 1));

    assert_ok!(client.place_order(&mut order).await);

    assert_eq!(order.id.as_deref(), Some("ord-1"));
    assert_eq!(order.status, Some(OrderStatus::Filled));
}

#[tokio::test]
async fn test_server_error_plain_text_body() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_raw("bad gateway upstream", "text/plain"))
        .mount(&server)
        .await;

    let client = client_for(&server, Some(mock_api_key()));
    let err = client.get("/prices").await.expect_err("502");

    assert!(matches!(err, HypheError::Api { code: 502, ref message, .. } if message == "bad gateway upstream"));
    assert!(err.is_retryable());
}
