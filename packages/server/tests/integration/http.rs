use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use journal::{
    Journal, JournalConfig, JournalConsumer, JournalError, JournalProducer, JournalRecord,
    MemoryJournal,
};
use reqwest::Client;
use serde_json::{json, Value};
use server::config::{AppConfig, CorsConfig, DatabaseConfig, RegistryConfig, ServerConfig};
use server::replication::{NodeOptions, RegistryStore};
use server::state::AppState;

use crate::common::READY_TIMEOUT;

/// A journal that accepts writes and never delivers records: the node can
/// never observe its bootstrap sentinel, so it never becomes ready.
struct StalledJournal;

struct StalledProducer;
struct StalledConsumer;

#[async_trait]
impl JournalProducer for StalledProducer {
    async fn send(&self, _: &str, _: Vec<u8>, _: Option<Vec<u8>>) -> Result<(), JournalError> {
        Ok(())
    }
}

#[async_trait]
impl JournalConsumer for StalledConsumer {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<JournalRecord>, JournalError> {
        tokio::time::sleep(timeout).await;
        Ok(Vec::new())
    }
}

impl Journal for StalledJournal {
    fn producer(&self) -> Arc<dyn JournalProducer> {
        Arc::new(StalledProducer)
    }

    fn subscribe(&self) -> Box<dyn JournalConsumer> {
        Box::new(StalledConsumer)
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec![],
                max_age: 3600,
            },
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
        },
        journal: JournalConfig::default(),
        registry: RegistryConfig::default(),
    }
}

async fn spawn_http(journal: Arc<dyn Journal>) -> (SocketAddr, Arc<RegistryStore>) {
    let db = server::database::init_db("sqlite::memory:")
        .await
        .expect("Failed to initialize sqlite");
    let store = RegistryStore::start(db, journal, NodeOptions::default());

    let state = AppState {
        store: store.clone(),
        config: test_config(),
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, store)
}

#[tokio::test]
async fn health_ready_is_down_until_bootstrap_completes() {
    let (addr, store) = spawn_http(Arc::new(StalledJournal)).await;
    assert!(!store.is_ready());

    let client = Client::new();
    let res = client
        .get(format!("http://{addr}/health/ready"))
        .send()
        .await
        .expect("ready probe");
    assert_eq!(res.status().as_u16(), 503);
}

#[tokio::test]
async fn health_endpoints_report_up_after_bootstrap() {
    let journal = MemoryJournal::new(1);
    let (addr, store) = spawn_http(journal).await;
    assert!(store.wait_ready(READY_TIMEOUT).await);

    let client = Client::new();
    for endpoint in ["ready", "live"] {
        let res = client
            .get(format!("http://{addr}/health/{endpoint}"))
            .send()
            .await
            .expect("health probe");
        assert_eq!(res.status().as_u16(), 200, "{endpoint}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["status"], "UP");
    }
}

#[tokio::test]
async fn artifact_lifecycle_over_http() {
    let journal = MemoryJournal::new(1);
    let (addr, store) = spawn_http(journal).await;
    assert!(store.wait_ready(READY_TIMEOUT).await);
    let client = Client::new();
    let base = format!("http://{addr}/api/v1");

    // Create a group.
    let res = client
        .post(format!("{base}/groups"))
        .json(&json!({"group_id": "g1", "description": "schemas"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201, "{}", res.text().await.unwrap());

    // Create an artifact with inline content.
    let schema = r#"{"type":"record","name":"X","fields":[]}"#;
    let res = client
        .post(format!("{base}/groups/g1/artifacts"))
        .json(&json!({
            "artifact_id": "a1",
            "artifact_type": "AVRO",
            "content": schema,
            "content_type": "application/json",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201, "{}", res.text().await.unwrap());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["version"]["global_id"], 1);
    assert_eq!(body["version"]["content_id"], 1);

    // Fetch the content back by coordinates.
    let res = client
        .get(format!("{base}/groups/g1/artifacts/a1/versions/1/content"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.text().await.unwrap(), schema);

    // Unknown coordinates are a structured 404.
    let res = client
        .get(format!("{base}/groups/g1/artifacts/nope/versions/1/content"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");

    // Install a validity rule, then reject malformed content synchronously.
    let res = client
        .post(format!("{base}/admin/rules"))
        .json(&json!({"rule_type": "VALIDITY", "configuration": "SYNTAX_ONLY"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);

    let res = client
        .post(format!("{base}/groups/g1/artifacts"))
        .json(&json!({
            "artifact_id": "bad",
            "artifact_type": "AVRO",
            "content": "{\"This is not valid",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 409);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "RULE_VIOLATION");

    // Delete the artifact; the response lists the removed versions.
    let res = client
        .delete(format!("{base}/groups/g1/artifacts/a1"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["versions"], json!(["1"]));
}
