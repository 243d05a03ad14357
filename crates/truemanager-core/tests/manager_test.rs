#![allow(clippy::unwrap_used)]
// Manager and dashboard tests against a wiremock server.

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use truemanager_api::types::AlertLevel;
use truemanager_core::{
    AuthCredentials, ConnectionConfig, ConnectionState, CoreError, InterfaceRate, Manager,
    TlsVerification, load_summary,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(auth: AuthCredentials) -> (MockServer, Manager) {
    let server = MockServer::start().await;
    let mut config = ConnectionConfig::new(Url::parse(&server.uri()).unwrap(), auth);
    config.tls = TlsVerification::SystemDefaults;
    let manager = Manager::new(config).unwrap();
    (server, manager)
}

fn password() -> AuthCredentials {
    AuthCredentials::Password {
        username: "root".into(),
        password: "hunter2".to_string().into(),
    }
}

fn api_key() -> AuthCredentials {
    AuthCredentials::ApiKey("1-abc".to_string().into())
}

/// In-process websocket server accepting one client. The returned URL is
/// the `http://` server root the manager is configured with.
async fn spawn_ws<F, Fut>(handler: F) -> (Url, JoinHandle<()>)
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        handler(ws).await;
    });
    (Url::parse(&format!("http://{addr}")).unwrap(), handle)
}

async fn recv_json(ws: &mut WebSocketStream<TcpStream>) -> Option<Value> {
    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => return Some(serde_json::from_str(&text).unwrap()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
    None
}

async fn send_json(ws: &mut WebSocketStream<TcpStream>, value: Value) {
    ws.send(Message::text(value.to_string())).await.unwrap();
}

/// DDP handshake, then answer the login call with `accept`.
async fn handshake_and_login(ws: &mut WebSocketStream<TcpStream>, accept: bool) -> Value {
    let connect = recv_json(ws).await.unwrap();
    assert_eq!(connect["msg"], "connect");
    send_json(ws, json!({ "msg": "connected", "session": "s-1" })).await;

    let login = recv_json(ws).await.unwrap();
    send_json(ws, json!({ "msg": "result", "id": login["id"], "result": accept })).await;
    login
}

fn realtime_manager(url: Url, authorization: truemanager_api::Authorization) -> Manager {
    let mut config = ConnectionConfig::new(url, api_key());
    config.tls = TlsVerification::SystemDefaults;
    config.call_timeout = Some(Duration::from_secs(5));
    let manager = Manager::new(config).unwrap();
    manager.set_authorization(authorization);
    manager
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_password_login() {
    let (server, manager) = setup(password()).await;

    Mock::given(method("POST"))
        .and(path("/api/v2.0/auth/check_password"))
        .and(body_json(json!({ "username": "root", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    assert!(manager.login().await.unwrap().is_none());
    assert!(manager.is_logged_in());
    assert_eq!(manager.session().authorization().unwrap().kind(), "basic");
}

#[tokio::test]
async fn test_wrong_password_clears_credentials() {
    let (server, manager) = setup(password()).await;

    Mock::given(method("POST"))
        .and(path("/api/v2.0/auth/check_password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .mount(&server)
        .await;

    let err = manager.login().await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    assert!(!manager.is_logged_in());
}

#[tokio::test]
async fn test_api_key_login_fetches_me() {
    let (server, manager) = setup(api_key()).await;

    Mock::given(method("GET"))
        .and(path("/api/v2.0/auth/me"))
        .and(header("authorization", "Bearer 1-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pw_name": "automation",
            "pw_uid": 3000,
            "pw_gid": 3000
        })))
        .mount(&server)
        .await;

    let me = manager.login().await.unwrap().unwrap();
    assert_eq!(me.pw_name, "automation");
}

#[tokio::test]
async fn test_rejected_api_key() {
    let (server, manager) = setup(api_key()).await;

    Mock::given(method("GET"))
        .and(path("/api/v2.0/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = manager.login().await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    assert!(!manager.is_logged_in());
}

#[tokio::test]
async fn test_realtime_requires_login() {
    let (_server, manager) = setup(api_key()).await;

    let err = manager.connect_realtime().await.unwrap_err();
    assert!(matches!(err, CoreError::Config { .. }));
    assert!(matches!(manager.realtime_stats(), Err(CoreError::Disconnected)));
}

#[tokio::test]
async fn test_logout_forgets_credentials() {
    let (_server, manager) = setup(api_key()).await;
    manager.set_authorization(truemanager_api::Authorization::token("t"));
    assert!(manager.is_logged_in());

    manager.logout();
    assert!(!manager.is_logged_in());
    assert_eq!(*manager.connection_state().borrow(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_http_timeout_reports_no_duration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2.0/auth/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(2))
                .set_body_json(json!({ "pw_name": "root", "pw_uid": 0, "pw_gid": 0 })),
        )
        .mount(&server)
        .await;

    let mut config = ConnectionConfig::new(Url::parse(&server.uri()).unwrap(), api_key());
    config.tls = TlsVerification::SystemDefaults;
    config.timeout = Duration::from_millis(200);
    let manager = Manager::new(config).unwrap();

    let err = manager.login().await.unwrap_err();
    assert!(matches!(err, CoreError::RequestTimedOut), "got: {err:?}");
    assert_eq!(err.to_string(), "Request timed out");
}

// ── Realtime ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_realtime_with_api_key() {
    let (url, server) = spawn_ws(|mut ws| async move {
        let login = handshake_and_login(&mut ws, true).await;
        assert_eq!(login["msg"], "method");
        assert_eq!(login["method"], "auth.login_with_api_key");
        assert_eq!(login["params"], json!(["1-abc"]));
        while recv_json(&mut ws).await.is_some() {}
    })
    .await;

    let manager = realtime_manager(url, truemanager_api::Authorization::api_key("1-abc"));
    manager.connect_realtime().await.unwrap();
    assert_eq!(*manager.connection_state().borrow(), ConnectionState::Connected);

    manager.logout();
    assert_eq!(*manager.connection_state().borrow(), ConnectionState::Disconnected);
    server.await.unwrap();
}

#[tokio::test]
async fn test_connect_realtime_with_password() {
    let (url, server) = spawn_ws(|mut ws| async move {
        let login = handshake_and_login(&mut ws, true).await;
        assert_eq!(login["method"], "auth.login");
        assert_eq!(login["params"], json!(["root", "hunter2"]));
        while recv_json(&mut ws).await.is_some() {}
    })
    .await;

    let manager = realtime_manager(url, truemanager_api::Authorization::basic("root", "hunter2"));
    manager.connect_realtime().await.unwrap();

    manager.logout();
    server.await.unwrap();
}

#[tokio::test]
async fn test_rejected_realtime_login_disconnects() {
    let (url, server) = spawn_ws(|mut ws| async move {
        handshake_and_login(&mut ws, false).await;
        while recv_json(&mut ws).await.is_some() {}
    })
    .await;

    let manager = realtime_manager(url, truemanager_api::Authorization::api_key("1-abc"));
    let err = manager.connect_realtime().await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }), "got: {err:?}");
    assert_eq!(*manager.connection_state().borrow(), ConnectionState::Disconnected);
    assert!(matches!(manager.realtime_stats(), Err(CoreError::Disconnected)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_realtime_stats_from_live_frames() {
    let (url, server) = spawn_ws(|mut ws| async move {
        handshake_and_login(&mut ws, true).await;

        let sub = recv_json(&mut ws).await.unwrap();
        assert_eq!(sub["msg"], "sub");
        assert_eq!(sub["name"], "reporting.realtime");
        send_json(&mut ws, json!({ "msg": "ready", "subs": [sub["id"]] })).await;
        send_json(
            &mut ws,
            json!({ "msg": "added", "collection": "alert.list", "id": 1, "fields": {} }),
        )
        .await;
        send_json(
            &mut ws,
            json!({
                "msg": "added",
                "collection": "reporting.realtime",
                "fields": {
                    "cpu": { "cpu": { "usage": 42.0 } },
                    "memory": { "physical_memory_total": 1000, "physical_memory_available": 400 },
                    "interfaces": { "eno1": { "received_bytes_rate": 10.0, "sent_bytes_rate": 20.0 } }
                }
            }),
        )
        .await;
        while recv_json(&mut ws).await.is_some() {}
    })
    .await;

    let manager = realtime_manager(url, truemanager_api::Authorization::api_key("1-abc"));
    manager.connect_realtime().await.unwrap();

    let mut stats = std::pin::pin!(manager.realtime_stats().unwrap());
    let sample = tokio::time::timeout(Duration::from_secs(5), stats.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sample.cpu_usage, Some(42.0));
    assert_eq!(sample.memory_used, Some(600));
    assert_eq!(sample.memory_total, Some(1000));
    assert_eq!(
        sample.interfaces["eno1"],
        InterfaceRate {
            rx_bytes_per_sec: 10.0,
            tx_bytes_per_sec: 20.0
        }
    );

    manager.logout();
    assert!(stats.next().await.is_none());
    server.await.unwrap();
}

// ── Dashboard ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_dashboard_summary() {
    let (server, manager) = setup(api_key()).await;
    manager.set_authorization(truemanager_api::Authorization::api_key("1-abc"));

    Mock::given(method("GET"))
        .and(path("/api/v2.0/system/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "TrueNAS-SCALE-24.04.2",
            "hostname": "nas",
            "physmem": 17_179_869_184_u64,
            "model": "Intel Xeon",
            "cores": 8,
            "loadavg": [1.0, 0.5, 0.25],
            "uptime_seconds": 3600.0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2.0/pool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "tank", "status": "ONLINE", "healthy": true, "size": 200, "allocated": 50 },
            { "id": 2, "name": "scratch", "status": "DEGRADED", "healthy": false }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2.0/alert/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "uuid": "1", "klass": "A", "datetime": { "$date": 0 }, "level": "CRITICAL", "dismissed": false },
            { "uuid": "2", "klass": "B", "datetime": { "$date": 0 }, "level": "WARNING", "dismissed": false },
            { "uuid": "3", "klass": "C", "datetime": { "$date": 0 }, "level": "WARNING", "dismissed": false },
            { "uuid": "4", "klass": "D", "datetime": { "$date": 0 }, "level": "CRITICAL", "dismissed": true }
        ])))
        .mount(&server)
        .await;

    let summary = load_summary(manager.rest()).await.unwrap();

    assert_eq!(summary.hostname, "nas");
    assert_eq!(summary.cores, 8);
    assert_eq!(summary.load_average, vec![1.0, 0.5, 0.25]);
    assert_eq!(summary.pools.len(), 2);
    assert_eq!(summary.pools[0].usage_percent, Some(25.0));
    assert_eq!(summary.pools[1].usage_percent, None);

    assert_eq!(summary.alerts.active, 3);
    assert_eq!(summary.alerts.dismissed, 1);
    assert_eq!(summary.alerts.count(AlertLevel::Critical), 1);
    assert_eq!(summary.alerts.count(AlertLevel::Warning), 2);
    assert_eq!(summary.alerts.worst(), Some(AlertLevel::Critical));
    assert!(!summary.is_healthy());
}

#[tokio::test]
async fn test_dashboard_propagates_failures() {
    let (server, manager) = setup(api_key()).await;

    // Every endpoint rejects the key, whichever finishes first.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = load_summary(manager.rest()).await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
}
