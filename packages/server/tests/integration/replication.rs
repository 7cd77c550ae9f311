use std::time::Duration;

use common::dto::Gav;
use common::CoreError;
use journal::MemoryJournal;
use server::replication::RegistryStore;

use crate::common::{content, create_artifact, spawn_node, tenant, RECORD_SCHEMA};

/// Poll a replica until it serves the version or the deadline passes.
async fn wait_for_version(
    node: &crate::common::TestNode,
    gav: &Gav,
    deadline: Duration,
) -> Result<Vec<u8>, CoreError> {
    let start = tokio::time::Instant::now();
    loop {
        match node.store.get_version_content(&tenant(), gav).await {
            Ok(stored) => return Ok(stored.content),
            Err(CoreError::NotFound { .. }) if start.elapsed() < deadline => {
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[tokio::test]
async fn a_peer_node_converges_on_the_same_state() {
    let journal = MemoryJournal::new(1);
    let node_a = spawn_node(&journal).await;
    let node_b = spawn_node(&journal).await;

    // Write through node A; node A's success implies node A applied it.
    create_artifact(&node_a, "g1", "a1", content(RECORD_SCHEMA)).await;

    // Node B may serve NotFound briefly, then must converge.
    let bytes = wait_for_version(&node_b, &Gav::new("g1", "a1", "1"), Duration::from_secs(5))
        .await
        .expect("node B never converged");
    assert_eq!(bytes, RECORD_SCHEMA);

    // Reads on both nodes agree.
    let meta_a = node_a
        .store
        .get_version_meta(&tenant(), &Gav::new("g1", "a1", "1"))
        .await
        .unwrap();
    let meta_b = node_b
        .store
        .get_version_meta(&tenant(), &Gav::new("g1", "a1", "1"))
        .await
        .unwrap();
    assert_eq!(meta_a, meta_b);
}

#[tokio::test]
async fn a_late_joining_node_replays_to_identical_state() {
    let journal = MemoryJournal::new(1);
    let node_a = spawn_node(&journal).await;

    // A spread of operations to replay.
    node_a
        .store
        .create_group(&tenant(), "g1", Some("first group".into()), None, Default::default())
        .await
        .unwrap();
    create_artifact(&node_a, "g1", "a1", content(RECORD_SCHEMA)).await;
    create_artifact(&node_a, "g1", "a2", content(RECORD_SCHEMA)).await;
    create_artifact(
        &node_a,
        "g2",
        "b1",
        content(br#"{"type":"record","name":"B","fields":[]}"#),
    )
    .await;
    node_a
        .store
        .create_global_rule(&tenant(), common::RuleType::Validity, "SYNTAX_ONLY")
        .await
        .unwrap();
    node_a
        .store
        .delete_artifact(&tenant(), "g1", "a2")
        .await
        .unwrap();

    // Node C starts fresh afterwards; spawn_node waits for readiness, which
    // requires observing node C's own bootstrap after the full replay.
    let node_c = spawn_node(&journal).await;

    let export_a = node_a.store.export_data(&tenant()).await.unwrap();
    let export_c = node_c.store.export_data(&tenant()).await.unwrap();
    assert_eq!(export_a, export_c, "replicas must serve identical state");

    // Spot checks across read operations.
    assert_eq!(
        node_a.store.list_group_ids(&tenant()).await.unwrap(),
        node_c.store.list_group_ids(&tenant()).await.unwrap()
    );
    assert_eq!(
        node_a.store.count_total_versions(&tenant()).await.unwrap(),
        node_c.store.count_total_versions(&tenant()).await.unwrap()
    );
}

#[tokio::test]
async fn replaying_the_journal_over_existing_state_changes_nothing() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    node.store
        .create_group(&tenant(), "g1", None, None, Default::default())
        .await
        .unwrap();
    create_artifact(&node, "g1", "a1", content(RECORD_SCHEMA)).await;
    node.store
        .create_global_rule(&tenant(), common::RuleType::Validity, "SYNTAX_ONLY")
        .await
        .unwrap();

    let export_before = node.store.export_data(&tenant()).await.unwrap();

    // A second engine over the SAME database replays the whole journal into
    // already-populated state: the benign-replay window must swallow the
    // AlreadyExists errors and converge without mutating anything.
    let replayer = RegistryStore::start(
        node.db.clone(),
        journal.clone(),
        server::replication::NodeOptions::default(),
    );
    assert!(replayer.wait_ready(crate::common::READY_TIMEOUT).await);

    let export_after = node.store.export_data(&tenant()).await.unwrap();
    assert_eq!(export_before, export_after);
}

#[tokio::test]
async fn concurrent_same_coordinate_creates_resolve_by_journal_order() {
    let journal = MemoryJournal::new(1);
    let node_a = spawn_node(&journal).await;
    let node_b = spawn_node(&journal).await;

    let (result_a, result_b) = tokio::join!(
        crate::common::try_create_artifact(&node_a, "g1", "same", content(RECORD_SCHEMA)),
        crate::common::try_create_artifact(&node_b, "g1", "same", content(RECORD_SCHEMA)),
    );

    let successes = [&result_a, &result_b]
        .iter()
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(successes, 1, "exactly one create wins: {result_a:?} {result_b:?}");

    let loser = if result_a.is_err() { result_a } else { result_b };
    assert!(
        matches!(loser, Err(CoreError::AlreadyExists { .. })),
        "{loser:?}"
    );
}
