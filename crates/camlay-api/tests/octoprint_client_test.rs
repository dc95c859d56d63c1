#![allow(clippy::unwrap_used)]
// Integration tests for `OctoPrintClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use camlay_api::{Error, OctoPrintClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, OctoPrintClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let key = SecretString::from("ABCDEF0123456789".to_string());
    let client = OctoPrintClient::new(base_url, &key, &TransportConfig::default()).unwrap();
    (server, client)
}

// ── Job ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_job() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/job"))
        .and(header("X-Api-Key", "ABCDEF0123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": {
                "file": { "name": "benchy.gcode", "origin": "local" },
                "estimatedPrintTime": 7200.5,
                "filament": { "tool0": { "length": 810 } }
            },
            "progress": { "completion": 22.4, "printTime": 276, "printTimeLeft": 912 },
            "state": "Printing"
        })))
        .mount(&server)
        .await;

    let job = client.job().await.unwrap();

    assert_eq!(job.state.as_deref(), Some("Printing"));
    let inner = job.job.unwrap();
    assert_eq!(inner.file.unwrap().name.as_deref(), Some("benchy.gcode"));
    assert_eq!(inner.estimated_print_time, Some(7200.5));
    assert_eq!(job.progress.unwrap().completion, Some(22.4));
}

#[tokio::test]
async fn test_job_without_file() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": { "file": { "name": null }, "estimatedPrintTime": null },
            "progress": { "completion": null },
            "state": "Operational"
        })))
        .mount(&server)
        .await;

    let job = client.job().await.unwrap();
    assert_eq!(job.state.as_deref(), Some("Operational"));
    assert!(job.job.unwrap().estimated_print_time.is_none());
}

#[tokio::test]
async fn test_invalid_api_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/job"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client.job().await;
    assert!(matches!(result, Err(Error::InvalidApiKey)), "got {result:?}");
}

// ── Printer ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_printer_temperatures() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/printer"))
        .and(query_param("exclude", "sd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "temperature": {
                "tool0": { "actual": 214.8821, "target": 220.0, "offset": 0 },
                "bed": { "actual": 50.221, "target": 70.0, "offset": 5 }
            },
            "state": { "text": "Printing", "flags": { "printing": true } }
        })))
        .mount(&server)
        .await;

    let printer = client.printer().await.unwrap().unwrap();
    let temps = printer.temperature.unwrap();
    assert_eq!(temps.tool0.unwrap().target, Some(220.0));
    assert_eq!(temps.bed.unwrap().actual, Some(50.221));
}

#[tokio::test]
async fn test_printer_not_operational() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/printer"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Printer is not operational"))
        .mount(&server)
        .await;

    assert!(client.printer().await.unwrap().is_none());
}

#[tokio::test]
async fn test_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/printer"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client.printer().await.unwrap_err();
    assert!(matches!(err, Error::OctoPrint { status: 502, .. }), "got {err:?}");
}

// ── Login / push ────────────────────────────────────────────────────

#[tokio::test]
async fn test_passive_login() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "passive": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "camlay",
            "session": "5E1A2F",
            "admin": false
        })))
        .mount(&server)
        .await;

    let login = tokio_test::assert_ok!(client.passive_login().await);
    assert_eq!(login.name, "camlay");
    assert_eq!(login.session, "5E1A2F");
}

#[tokio::test]
async fn test_push_url() {
    let key = SecretString::from("k".to_string());
    let client = OctoPrintClient::new(
        Url::parse("https://printer.example/octoprint/").unwrap(),
        &key,
        &TransportConfig::default(),
    )
    .unwrap();

    assert_eq!(
        client.push_url().unwrap().as_str(),
        "wss://printer.example/octoprint/sockjs/websocket"
    );
}
