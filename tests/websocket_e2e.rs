//! End-to-end tests against a gateway bound to an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use omnix_realtime::adapters::auth::{JwtSessionValidator, TokenClaims};
use omnix_realtime::adapters::http::{realtime_routes, RealtimeAppState};
use omnix_realtime::adapters::snapshot::InMemoryInventorySnapshot;
use omnix_realtime::adapters::websocket::{websocket_router, HubSettings, RealtimeHub, WebSocketState};
use omnix_realtime::config::AuthConfig;
use omnix_realtime::domain::foundation::{ConnectionId, Timestamp, UserRole};
use omnix_realtime::domain::realtime::Channel;

const SECRET: &str = "e2e-secret-that-is-long-enough-for-hs256";

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Gateway {
    addr: SocketAddr,
    hub: Arc<RealtimeHub>,
    signer: JwtSessionValidator,
}

impl Gateway {
    async fn start() -> Self {
        let auth = AuthConfig::with_secret(SECRET);
        let snapshot = Arc::new(InMemoryInventorySnapshot::new());
        let hub = Arc::new(RealtimeHub::new(
            HubSettings::default(),
            Arc::new(JwtSessionValidator::from_config(&auth)),
            snapshot.clone(),
            snapshot,
        ));

        let app = axum::Router::new()
            .merge(websocket_router().with_state(WebSocketState::new(hub.clone())))
            .merge(realtime_routes(RealtimeAppState::new(hub.clone())));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            hub,
            signer: JwtSessionValidator::from_config(&auth),
        }
    }

    fn token_for(&self, user: &str) -> String {
        self.token_expiring_in(user, 3600)
    }

    fn token_expiring_in(&self, user: &str, secs: i64) -> String {
        let exp = Timestamp::now().as_unix_secs() + secs;
        self.signer
            .issue(&TokenClaims::new(user, format!("{}@omnix.ai", user), &UserRole::Manager, exp))
            .unwrap()
    }

    fn url(&self, query: &str) -> String {
        format!("ws://{}/ws{}", self.addr, query)
    }

    async fn connect_with_token(&self, user: &str) -> Client {
        let url = self.url(&format!("?token={}", self.token_for(user)));
        let (client, _) = connect_async(url).await.unwrap();
        client
    }
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for a message")
            .expect("stream ended")
            .expect("transport error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn close_code(client: &mut Client) -> u16 {
    close_code_within(client, Duration::from_secs(2)).await
}

/// Skips data frames until a close frame arrives, failing after `wait`.
async fn close_code_within(client: &mut Client, wait: Duration) -> u16 {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let frame = tokio::time::timeout_at(deadline, client.next())
            .await
            .expect("timed out waiting for close")
            .expect("stream ended before close frame")
            .expect("transport error");
        if let Message::Close(Some(frame)) = frame {
            return u16::from(frame.code);
        }
    }
}

async fn send_json(client: &mut Client, value: Value) {
    client.send(Message::Text(value.to_string())).await.unwrap();
}

#[tokio::test]
async fn missing_token_closes_with_4001() {
    let gateway = Gateway::start().await;
    let (mut client, _) = connect_async(gateway.url("")).await.unwrap();
    assert_eq!(close_code(&mut client).await, 4001);
}

#[tokio::test]
async fn bad_token_closes_with_4002() {
    let gateway = Gateway::start().await;
    let (mut client, _) = connect_async(gateway.url("?token=not-a-jwt")).await.unwrap();
    assert_eq!(close_code(&mut client).await, 4002);
    assert_eq!(gateway.hub.registry().count().await, 0);
}

#[tokio::test]
async fn bearer_header_is_accepted() {
    let gateway = Gateway::start().await;
    let mut request = gateway.url("").into_client_request().unwrap();
    request.headers_mut().insert(
        "Authorization",
        format!("Bearer {}", gateway.token_for("u-7")).parse().unwrap(),
    );

    let (mut client, _) = connect_async(request).await.unwrap();
    let welcome = next_json(&mut client).await;
    assert_eq!(welcome["type"], "connection.established");
    assert_eq!(welcome["payload"]["userId"], "u-7");
}

#[tokio::test]
async fn subscribed_client_receives_product_updates() {
    let gateway = Gateway::start().await;
    let mut client = gateway.connect_with_token("u-1").await;

    let welcome = next_json(&mut client).await;
    assert_eq!(welcome["channel"], "system");
    assert_eq!(welcome["type"], "connection.established");
    assert_eq!(welcome["payload"]["channels"], json!(["global", "user.u-1"]));

    send_json(&mut client, json!({ "type": "subscribe", "channel": "products" })).await;
    let confirmed = next_json(&mut client).await;
    assert_eq!(confirmed["type"], "subscription.confirmed");
    assert_eq!(confirmed["channel"], "products");

    gateway
        .hub
        .publisher()
        .emit_product_update("p1", json!({ "name": "Oat Milk" }))
        .await;

    let update = next_json(&mut client).await;
    assert_eq!(update["channel"], "products");
    assert_eq!(update["type"], "product.updated");
    assert_eq!(update["payload"]["data"]["name"], "Oat Milk");
    assert!(update["timestamp"].is_string());
}

#[tokio::test]
async fn ping_gets_pong() {
    let gateway = Gateway::start().await;
    let mut client = gateway.connect_with_token("u-1").await;
    next_json(&mut client).await;

    send_json(&mut client, json!({ "type": "ping" })).await;
    let pong = next_json(&mut client).await;
    assert_eq!(pong["type"], "pong");
}

#[tokio::test]
async fn garbage_frame_gets_error_and_connection_survives() {
    let gateway = Gateway::start().await;
    let mut client = gateway.connect_with_token("u-1").await;
    next_json(&mut client).await;

    client.send(Message::Text("{not json".into())).await.unwrap();
    let error = next_json(&mut client).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["payload"]["code"], "INVALID_MESSAGE");

    send_json(&mut client, json!({ "type": "ping" })).await;
    assert_eq!(next_json(&mut client).await["type"], "pong");
}

async fn wait_for_no_connections(hub: &RealtimeHub) -> usize {
    let mut remaining = hub.registry().count().await;
    for _ in 0..50 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = hub.registry().count().await;
    }
    remaining
}

#[tokio::test]
async fn live_token_expiry_closes_with_4003_and_purges() {
    let gateway = Gateway::start().await;
    let url = gateway.url(&format!("?token={}", gateway.token_expiring_in("u-1", 2)));
    let (mut client, _) = connect_async(url).await.unwrap();

    let welcome = next_json(&mut client).await;
    assert_eq!(welcome["type"], "connection.established");
    let id = welcome["payload"]["connectionId"]
        .as_str()
        .unwrap()
        .parse::<ConnectionId>()
        .unwrap();

    send_json(&mut client, json!({ "type": "subscribe", "channel": "products" })).await;
    assert_eq!(next_json(&mut client).await["type"], "subscription.confirmed");
    assert_eq!(gateway.hub.registry().count().await, 1);

    assert_eq!(close_code_within(&mut client, Duration::from_secs(5)).await, 4003);

    assert_eq!(wait_for_no_connections(&gateway.hub).await, 0);
    assert!(gateway.hub.subscriptions().channels_of(&id).await.is_empty());
    assert!(gateway
        .hub
        .subscriptions()
        .subscribers_of(&Channel::Products)
        .await
        .is_empty());
}

#[tokio::test]
async fn closing_the_socket_unregisters_the_connection() {
    let gateway = Gateway::start().await;
    let mut client = gateway.connect_with_token("u-1").await;
    next_json(&mut client).await;
    assert_eq!(gateway.hub.registry().count().await, 1);

    client.close(None).await.unwrap();

    assert_eq!(wait_for_no_connections(&gateway.hub).await, 0);
}
