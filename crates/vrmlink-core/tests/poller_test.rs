#![allow(clippy::unwrap_used)]
// Integration tests for the poll loop: one full cycle against mocked
// VRM endpoints, and cancellation-driven shutdown.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vrmlink_api::{TransportConfig, VrmClient};
use vrmlink_core::{
    CredentialCache, MqttPublisher, Poller, PublisherConfig, Session, SessionConfig,
};

const USER_ID: i64 = 4242;

fn unreachable_publisher_config() -> PublisherConfig {
    PublisherConfig {
        host: "127.0.0.1".into(),
        port: 1,
        base_topic: "vrm/cloud".into(),
        client_id: "vrmlink-test".into(),
        username: None,
        password: None,
        connect_timeout: Duration::from_millis(100),
    }
}

fn cached_session(server: &MockServer, dir: &tempfile::TempDir) -> Session {
    let cache = CredentialCache::new(dir.path().join("credentials.json"));
    cache.save("cached-token", USER_ID);

    let base_url = Url::parse(&server.uri()).unwrap();
    let client = VrmClient::with_base_url(base_url, &TransportConfig::default()).unwrap();
    let config = SessionConfig {
        username: "alice@example.com".into(),
        password: "hunter2".to_string().into(),
        token_name: "vrm-cloud-mqtt".into(),
        revoke_duplicate_token: false,
    };
    Session::new(client, config, cache)
}

#[tokio::test]
async fn cancelled_token_stops_the_loop_cleanly() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let session = cached_session(&server, &dir);
    let publisher = MqttPublisher::connect(&unreachable_publisher_config()).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let poller = Poller::new(session, publisher, Duration::from_secs(60), cancel);
    poller.run().await.expect("cancelled run should return Ok");
}

#[tokio::test]
async fn one_cycle_fetches_every_site_then_waits_out_the_interval() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(format!("/users/{USER_ID}/installations")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "records": [{ "idSite": 101 }, { "idSite": 202 }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    for site in [101, 202] {
        Mock::given(method("GET"))
            .and(path(format!("/installations/{site}/diagnostics")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    {
                        "Device": "Solar Charger",
                        "instance": 1,
                        "description": "Battery Voltage",
                        "rawValue": 12.8,
                    },
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let session = cached_session(&server, &dir);
    // Broker unreachable: the publish path degrades to logged drops,
    // which must not fail the cycle.
    let publisher = MqttPublisher::connect(&unreachable_publisher_config()).await;

    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        stop.cancel();
    });

    let poller = Poller::new(session, publisher, Duration::from_secs(60), cancel);
    poller.run().await.expect("run should drain cleanly");

    // Mock expectations (exactly one listing, one diagnostics per site)
    // are verified when `server` drops.
}
