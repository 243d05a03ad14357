#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use truemanager_api::types::{
    AlertLevel, ApiKeyCreate, ApiKeyUpdate, GraphQuery, JobState, PoolStatus, ReportingQuery,
    ReportingUnit, ScrubAction, SystemState,
};
use truemanager_api::{Authorization, Error, HttpNotOk, RestClient, Session, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(auth: Option<Authorization>) -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let session = Session::with_server(&format!("{}/", server.uri()), auth).unwrap();
    let client = RestClient::new(session, &TransportConfig::default()).unwrap();
    (server, client)
}

fn api(suffix: &str) -> String {
    format!("/api/v2.0/{suffix}")
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_check_password_true() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(api("auth/check_password")))
        .and(body_json(json!({ "username": "root", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.check_password("root", "secret").await.unwrap());
}

#[tokio::test]
async fn test_check_password_unauthorized() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(api("auth/check_password")))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let err = client.check_password("root", "nope").await.unwrap_err();
    match err {
        Error::Http(HttpNotOk::ClientUnauthorized {
            code,
            description,
            body,
        }) => {
            assert_eq!(code, 401);
            assert!(description.starts_with("POST "), "{description}");
            assert!(description.contains("/api/v2.0/auth/check_password"), "{description}");
            assert!(description.ends_with("returned 401 Unauthorized"), "{description}");
            assert_eq!(body.as_deref(), Some("Unauthorized"));
        }
        other => panic!("expected ClientUnauthorized, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_basic_auth_header_attached() {
    let (server, client) = setup(Some(Authorization::basic("root", "pw"))).await;

    // base64("root:pw")
    Mock::given(method("GET"))
        .and(path(api("auth/me")))
        .and(header("authorization", "Basic cm9vdDpwdw=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pw_name": "root",
            "pw_uid": 0,
            "pw_gid": 0,
            "pw_dir": "/root",
            "pw_shell": "/usr/bin/zsh",
            "local": true,
            "attributes": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let me = client.me().await.unwrap();
    assert_eq!(me.pw_name, "root");
    assert_eq!(me.pw_uid, 0);
}

#[tokio::test]
async fn test_api_key_sent_as_bearer() {
    let (server, client) = setup(Some(Authorization::api_key("1-abcdef"))).await;

    Mock::given(method("GET"))
        .and(path(api("core/ping")))
        .and(header("authorization", "Bearer 1-abcdef"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("pong")))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.ping().await.unwrap(), "pong");
}

#[tokio::test]
async fn test_generate_token() {
    let (server, client) = setup(Some(Authorization::basic("root", "pw"))).await;

    Mock::given(method("POST"))
        .and(path(api("auth/generate_token")))
        .and(body_json(json!({ "ttl": 600, "attrs": {}, "match_origin": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("tok-123")))
        .mount(&server)
        .await;

    let request = truemanager_api::types::GenerateTokenRequest {
        ttl: Some(600),
        ..Default::default()
    };
    assert_eq!(client.generate_token(&request).await.unwrap(), "tok-123");
}

// ── Status mapping ──────────────────────────────────────────────────

#[tokio::test]
async fn test_not_found_is_client_request() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("pool/id/99")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
        .mount(&server)
        .await;

    let err = client.get_pool(99).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::Http(HttpNotOk::ClientRequest { code: 404, .. })));
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let (server, client) = setup(Some(Authorization::basic("root", "secret"))).await;

    Mock::given(method("POST"))
        .and(path(api("auth/check_password")))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/elsewhere"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.check_password("root", "secret").await.unwrap_err();
    match err {
        Error::Http(HttpNotOk::Redirect { code, description, .. }) => {
            assert_eq!(code, 302);
            assert!(description.contains("/api/v2.0/auth/check_password"), "{description}");
        }
        other => panic!("expected Redirect, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_server_response() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("system/info")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.system_info().await.unwrap_err();
    match err {
        Error::Http(HttpNotOk::ServerResponse { code, body, .. }) => {
            assert_eq!(code, 503);
            assert!(body.is_none());
        }
        other => panic!("expected ServerResponse, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("system/state")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client.system_state().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { ref body, .. } if body == "<html>"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let session = Session::with_server("http://127.0.0.1:1/", None).unwrap();
    let client = RestClient::new(session, &TransportConfig::default()).unwrap();

    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(err.is_connection_error());
}

// ── System ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_system_info() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("system/info")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "TrueNAS-SCALE-24.04.2",
            "buildtime": { "$date": 1_717_000_000_000_i64 },
            "hostname": "nas",
            "physmem": 34_359_738_368_u64,
            "model": "AMD Ryzen 5 5600G",
            "cores": 12,
            "physical_cores": 6,
            "loadavg": [0.5, 0.4, 0.3],
            "uptime": "3 days, 2:01:00",
            "uptime_seconds": 266_460.0,
            "system_serial": "123",
            "system_product": "X570",
            "license": null,
            "boottime": { "$date": 1_717_100_000_000_i64 },
            "datetime": { "$date": 1_717_366_460_000_i64 },
            "timezone": "Europe/Berlin",
            "system_manufacturer": "ASRock",
            "ecc_memory": true
        })))
        .mount(&server)
        .await;

    let info = client.system_info().await.unwrap();
    assert_eq!(info.hostname, "nas");
    assert_eq!(info.cores, 12);
    assert_eq!(info.loadavg.len(), 3);
    assert!(info.ecc_memory);
    assert_eq!(info.boottime.unwrap().0.timestamp(), 1_717_100_000);
}

#[tokio::test]
async fn test_system_state_and_ready() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("system/state")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("READY")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("system/ready")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .mount(&server)
        .await;

    assert_eq!(client.system_state().await.unwrap(), SystemState::Ready);
    assert!(client.system_ready().await.unwrap());
}

#[tokio::test]
async fn test_reboot_returns_job_id() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(api("system/reboot")))
        .and(body_json(json!({ "delay": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1234)))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.reboot(Some(5)).await.unwrap(), 1234);
}

// ── Pool ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_pools() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("pool")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "name": "tank",
            "guid": "123",
            "path": "/mnt/tank",
            "status": "ONLINE",
            "healthy": true,
            "warning": false,
            "status_detail": null,
            "size": 4000,
            "allocated": 1000,
            "free": 3000,
            "fragmentation": "3",
            "scan": {
                "function": "SCRUB",
                "state": "FINISHED",
                "start_time": { "$date": 1_717_000_000_000_i64 },
                "end_time": { "$date": 1_717_003_600_000_i64 },
                "percentage": 100.0,
                "errors": 0
            },
            "topology": { "data": [] }
        }])))
        .mount(&server)
        .await;

    let pools = client.list_pools().await.unwrap();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].status, PoolStatus::Online);
    assert_eq!(pools[0].scan.as_ref().unwrap().errors, Some(0));
    assert!((pools[0].usage_percent().unwrap() - 25.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_scrub_pool_sends_action() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(api("pool/id/1/scrub")))
        .and(body_json(json!({ "action": "START" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(77)))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.scrub_pool(1, ScrubAction::Start).await.unwrap(), 77);
}

#[tokio::test]
async fn test_list_datasets() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("pool/dataset")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "tank/media",
            "name": "tank/media",
            "pool": "tank",
            "type": "FILESYSTEM",
            "mountpoint": "/mnt/tank/media",
            "used": { "parsed": 2048, "rawvalue": "2048", "value": "2K" },
            "available": { "parsed": null, "rawvalue": "4096", "value": "4K" },
            "children": []
        }])))
        .mount(&server)
        .await;

    let datasets = client.list_datasets().await.unwrap();
    assert_eq!(datasets[0].dataset_type, "FILESYSTEM");
    assert_eq!(datasets[0].used.as_ref().unwrap().as_u64(), Some(2048));
    assert_eq!(datasets[0].available.as_ref().unwrap().as_u64(), Some(4096));
}

// ── Reporting ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_graph_data_request_shape() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(api("reporting/netdata_get_data")))
        .and(body_json(json!({
            "graphs": [{ "name": "cpu" }, { "name": "interface", "identifier": "eth0" }],
            "reporting_query": { "unit": "HOUR", "page": 1, "aggregate": true }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "name": "cpu",
            "identifier": null,
            "data": [[1_717_000_000.0, 12.5, null]],
            "start": 1_717_000_000,
            "end": 1_717_003_600,
            "legend": ["time", "user", "system"],
            "aggregations": { "min": {}, "mean": {}, "max": {} }
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let graphs = vec![
        GraphQuery::new("cpu", None),
        GraphQuery::new("interface", Some("eth0".into())),
    ];
    let data = client
        .graph_data(&graphs, &ReportingQuery::last(ReportingUnit::Hour))
        .await
        .unwrap();
    assert_eq!(data[0].legend, vec!["time", "user", "system"]);
    assert_eq!(data[0].data[0][2], None);
}

// ── Alerts ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_alerts() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("alert/list")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "uuid": "a-1",
            "source": "VolumeStatus",
            "klass": "VolumeStatus",
            "args": { "volume": "tank" },
            "node": "Controller A",
            "key": "[\"tank\"]",
            "datetime": { "$date": 1_717_000_000_000_i64 },
            "last_occurrence": { "$date": 1_717_000_100_000_i64 },
            "dismissed": false,
            "mail": null,
            "text": "Pool %(volume)s state is DEGRADED",
            "formatted": "Pool tank state is DEGRADED",
            "level": "CRITICAL",
            "one_shot": false
        }])))
        .mount(&server)
        .await;

    let alerts = client.list_alerts().await.unwrap();
    assert_eq!(alerts[0].level, AlertLevel::Critical);
    assert_eq!(alerts[0].message(), "Pool tank state is DEGRADED");
}

#[tokio::test]
async fn test_dismiss_alert_posts_uuid_string() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(api("alert/dismiss")))
        .and(body_json(json!("a-1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.dismiss_alert("a-1").await.unwrap();
}

#[tokio::test]
async fn test_alert_policies() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("alert/list_policies")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(["IMMEDIATELY", "HOURLY", "DAILY", "NEVER"])),
        )
        .mount(&server)
        .await;

    assert_eq!(client.list_alert_policies().await.unwrap().len(), 4);
}

// ── Catalog ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_catalog_items() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(api("catalog/items")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stable": {
                "plex": {
                    "name": "plex",
                    "title": "Plex",
                    "categories": ["media"],
                    "healthy": true,
                    "latest_version": "1.0.5",
                    "latest_app_version": "1.40",
                    "recommended": true,
                    "home": "https://plex.tv"
                }
            }
        })))
        .mount(&server)
        .await;

    let items = client
        .catalog_items(&truemanager_api::types::CatalogItemsQuery::new("TRUENAS"))
        .await
        .unwrap();
    let plex = &items["stable"]["plex"];
    assert_eq!(plex.title.as_deref(), Some("Plex"));
    assert_eq!(plex.extra["home"], "https://plex.tv");
}

#[tokio::test]
async fn test_sync_catalog_returns_job() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(api("catalog/sync")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(9)))
        .mount(&server)
        .await;

    assert_eq!(client.sync_catalog().await.unwrap(), 9);
}

// ── API keys ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_api_key_lifecycle() {
    let (server, client) = setup(None).await;

    Mock::given(method("POST"))
        .and(path(api("api_key")))
        .and(body_json(json!({
            "name": "ci",
            "allowlist": [{ "method": "*", "resource": "*" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "name": "ci",
            "created_at": { "$date": 1_717_000_000_000_i64 },
            "key": "3-secret",
            "allowlist": [{ "method": "*", "resource": "*" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(api("api_key/id/3")))
        .and(body_json(json!({ "name": "ci2", "reset": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 3, "name": "ci2" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(api("api_key/id/3")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_api_key(&ApiKeyCreate::full_access("ci"))
        .await
        .unwrap();
    assert_eq!(created.key.as_deref(), Some("3-secret"));

    let update = ApiKeyUpdate {
        name: Some("ci2".into()),
        ..Default::default()
    };
    assert_eq!(client.update_api_key(3, &update).await.unwrap().name, "ci2");

    client.delete_api_key(3).await.unwrap();
}

// ── Jobs ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_jobs_and_abort() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("core/get_jobs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 55,
            "method": "pool.scrub",
            "arguments": [1, "START"],
            "progress": { "percent": 40.0, "description": "Scrubbing" },
            "state": "RUNNING",
            "result": null,
            "error": null,
            "time_started": { "$date": 1_717_000_000_000_i64 },
            "time_finished": null
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api("core/job_abort")))
        .and(body_json(json!(55)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .expect(1)
        .mount(&server)
        .await;

    let jobs = client.list_jobs().await.unwrap();
    assert_eq!(jobs[0].state, JobState::Running);
    assert_eq!(jobs[0].progress.as_ref().unwrap().percent, Some(40.0));

    client.abort_job(55).await.unwrap();
}

// ── Session interaction ─────────────────────────────────────────────

#[tokio::test]
async fn test_session_changes_apply_to_next_request() {
    let (server, client) = setup(None).await;

    Mock::given(method("GET"))
        .and(path(api("core/ping")))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("pong")))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("core/ping")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(client.ping().await.unwrap_err().is_unauthorized());

    client.session().set_authorization(Some(Authorization::token("tok")));
    assert_eq!(client.ping().await.unwrap(), "pong");

    client.session().set_server_address(None).unwrap();
    assert!(matches!(client.ping().await.unwrap_err(), Error::NotConfigured));
}
