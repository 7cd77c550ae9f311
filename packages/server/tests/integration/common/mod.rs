use std::sync::Arc;
use std::time::Duration;

use common::dto::{
    ArtifactMetaData, ArtifactReference, ContentWrapper, EditableArtifactMetaData,
    EditableVersionMetaData, VersionMetaData,
};
use common::{CoreError, TenantId};
use journal::MemoryJournal;
use sea_orm::DatabaseConnection;
use server::replication::{NodeOptions, RegistryStore};

pub const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// One in-process registry node: a private sqlite database plus a consumer
/// of the shared in-memory journal.
pub struct TestNode {
    pub store: Arc<RegistryStore>,
    pub db: DatabaseConnection,
}

pub async fn spawn_node(journal: &Arc<MemoryJournal>) -> TestNode {
    spawn_node_with(journal, NodeOptions::default()).await
}

pub async fn spawn_node_with(journal: &Arc<MemoryJournal>, options: NodeOptions) -> TestNode {
    let db = server::database::init_db("sqlite::memory:")
        .await
        .expect("Failed to initialize sqlite");
    let store = RegistryStore::start(db.clone(), journal.clone(), options);
    assert!(
        store.wait_ready(READY_TIMEOUT).await,
        "node did not become ready"
    );
    TestNode { store, db }
}

pub fn tenant() -> TenantId {
    TenantId::default()
}

pub fn content(bytes: &[u8]) -> ContentWrapper {
    ContentWrapper {
        content_type: Some("application/json".into()),
        content: bytes.to_vec(),
        references: Vec::new(),
    }
}

pub fn content_with_refs(bytes: &[u8], references: Vec<ArtifactReference>) -> ContentWrapper {
    ContentWrapper {
        content_type: Some("application/json".into()),
        content: bytes.to_vec(),
        references,
    }
}

pub fn reference(group: &str, artifact: &str, version: &str, name: &str) -> ArtifactReference {
    ArtifactReference {
        group_id: Some(group.to_string()),
        artifact_id: artifact.to_string(),
        version: Some(version.to_string()),
        name: name.to_string(),
    }
}

/// Create an AVRO artifact and unwrap; use `try_create_artifact` in error
/// paths.
pub async fn create_artifact(
    node: &TestNode,
    group: &str,
    artifact: &str,
    wrapper: ContentWrapper,
) -> (ArtifactMetaData, VersionMetaData) {
    try_create_artifact(node, group, artifact, wrapper)
        .await
        .expect("create_artifact failed")
}

pub async fn try_create_artifact(
    node: &TestNode,
    group: &str,
    artifact: &str,
    wrapper: ContentWrapper,
) -> Result<(ArtifactMetaData, VersionMetaData), CoreError> {
    node.store
        .create_artifact(
            &tenant(),
            group,
            artifact,
            "AVRO",
            EditableArtifactMetaData::default(),
            None,
            wrapper,
            EditableVersionMetaData::default(),
        )
        .await
}

pub const RECORD_SCHEMA: &[u8] = br#"{"type":"record","name":"X","fields":[]}"#;
