use common::dto::{EditableVersionMetaData, Gav};
use common::{ContentHash, CoreError, RuleType};
use journal::MemoryJournal;

use crate::common::{
    content, create_artifact, spawn_node, tenant, try_create_artifact, RECORD_SCHEMA,
};

#[tokio::test]
async fn create_then_fetch_by_coordinates() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    node.store
        .create_group(&tenant(), "g1", None, None, Default::default())
        .await
        .expect("create group");

    let (artifact, version) = create_artifact(&node, "g1", "a1", content(RECORD_SCHEMA)).await;
    assert_eq!(artifact.artifact_type, "AVRO");
    assert_eq!(version.global_id, 1);
    assert_eq!(version.content_id, 1);
    assert_eq!(version.version, "1");
    assert_eq!(version.version_ordinal, 1);

    let stored = node
        .store
        .get_version_content(&tenant(), &Gav::new("g1", "a1", "1"))
        .await
        .expect("fetch content");
    assert_eq!(stored.content, RECORD_SCHEMA);
    assert_eq!(stored.content_hash, ContentHash::compute(RECORD_SCHEMA));
}

#[tokio::test]
async fn identical_bytes_share_one_content_row() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    let (_, v1) = create_artifact(&node, "g1", "a1", content(RECORD_SCHEMA)).await;
    let (_, v2) = create_artifact(&node, "g1", "a2", content(RECORD_SCHEMA)).await;

    assert_eq!(v1.global_id, 1);
    assert_eq!(v2.global_id, 2);
    // Dedup: the second artifact points at the first content row.
    assert_eq!(v1.content_id, 1);
    assert_eq!(v2.content_id, 1);

    let sharing = node
        .store
        .versions_by_content_id(&tenant(), 1)
        .await
        .expect("versions by content id");
    assert_eq!(sharing.len(), 2);
}

#[tokio::test]
async fn rule_violation_is_synchronous_and_sends_nothing() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    node.store
        .create_global_rule(&tenant(), RuleType::Validity, "SYNTAX_ONLY")
        .await
        .expect("install global rule");
    let journal_len_before = journal.len();

    let err = try_create_artifact(&node, "g1", "a3", content(b"{\"This is not valid"))
        .await
        .expect_err("invalid content must be rejected");
    assert!(matches!(err, CoreError::RuleViolation { .. }), "{err:?}");

    // No message entered the journal for the rejected create.
    assert_eq!(journal.len(), journal_len_before);

    // And the id sequence is untouched: the next create still gets 1.
    let (_, version) = create_artifact(&node, "g1", "a4", content(RECORD_SCHEMA)).await;
    assert_eq!(version.global_id, 1);
}

#[tokio::test]
async fn delete_artifact_cascades_and_collects_content() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    let (_, v1) = create_artifact(&node, "g2", "a1", content(RECORD_SCHEMA)).await;
    let v2 = node
        .store
        .create_version(
            &tenant(),
            "g2",
            "a1",
            None,
            content(br#"{"type":"record","name":"Y","fields":[]}"#),
            EditableVersionMetaData::default(),
        )
        .await
        .expect("create second version");
    assert_eq!(v2.version, "2");

    let deleted = node
        .store
        .delete_artifact(&tenant(), "g2", "a1")
        .await
        .expect("delete artifact");
    assert_eq!(deleted, vec!["1".to_string(), "2".to_string()]);

    let err = node
        .store
        .get_version_meta(&tenant(), &Gav::new("g2", "a1", "1"))
        .await
        .expect_err("artifact is gone");
    assert!(matches!(err, CoreError::NotFound { .. }));

    assert_eq!(
        node.store.count_versions(&tenant(), "g2", "a1").await.unwrap(),
        0
    );

    // Both content rows are orphaned and must be gone.
    for content_id in [v1.content_id, v2.content_id] {
        let err = node
            .store
            .get_content_by_id(&tenant(), content_id)
            .await
            .expect_err("orphaned content must be collected");
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}

#[tokio::test]
async fn deleting_the_last_version_deletes_the_artifact() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    create_artifact(&node, "g1", "solo", content(RECORD_SCHEMA)).await;
    node.store
        .delete_version(&tenant(), Gav::new("g1", "solo", "1"))
        .await
        .expect("delete sole version");

    assert!(!node
        .store
        .artifact_exists(&tenant(), "g1", "solo")
        .await
        .unwrap());
}

#[tokio::test]
async fn version_state_machine_rejects_undefined_transitions() {
    use common::VersionState;

    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    create_artifact(&node, "g1", "a1", content(RECORD_SCHEMA)).await;
    // Second version so the first may leave ENABLED.
    node.store
        .create_version(
            &tenant(),
            "g1",
            "a1",
            None,
            content(br#"{"type":"record","name":"Y","fields":[]}"#),
            EditableVersionMetaData::default(),
        )
        .await
        .expect("second version");

    let gav = Gav::new("g1", "a1", "1");
    node.store
        .update_version_state(&tenant(), gav.clone(), VersionState::Disabled)
        .await
        .expect("ENABLED -> DISABLED");

    let err = node
        .store
        .update_version_state(&tenant(), gav.clone(), VersionState::Deprecated)
        .await
        .expect_err("DISABLED -> DEPRECATED is undefined");
    assert!(matches!(err, CoreError::InvalidStateTransition { .. }));

    node.store
        .update_version_state(&tenant(), gav, VersionState::Enabled)
        .await
        .expect("DISABLED -> ENABLED");
}

#[tokio::test]
async fn the_last_enabled_version_cannot_be_disabled() {
    use common::VersionState;

    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    create_artifact(&node, "g1", "a1", content(RECORD_SCHEMA)).await;
    node.store
        .create_version(
            &tenant(),
            "g1",
            "a1",
            None,
            content(br#"{"type":"record","name":"Y","fields":[]}"#),
            EditableVersionMetaData::default(),
        )
        .await
        .expect("second version");

    // Disable v2, leaving v1 as the only ENABLED version.
    node.store
        .update_version_state(&tenant(), Gav::new("g1", "a1", "2"), VersionState::Disabled)
        .await
        .expect("disable v2");

    let err = node
        .store
        .update_version_state(&tenant(), Gav::new("g1", "a1", "1"), VersionState::Disabled)
        .await
        .expect_err("the last ENABLED version must stay ENABLED");
    assert!(matches!(err, CoreError::Conflict { .. }));
}

#[tokio::test]
async fn comments_and_markdown_follow_their_version() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    create_artifact(&node, "g1", "a1", content(RECORD_SCHEMA)).await;
    let gav = Gav::new("g1", "a1", "1");

    let comment = node
        .store
        .create_comment(&tenant(), gav.clone(), Some("alice".into()), "first".into())
        .await
        .expect("create comment");
    assert_eq!(comment.comment_id, 1);

    node.store
        .set_markdown(&tenant(), gav.clone(), "# Schema X".into())
        .await
        .expect("set markdown");
    assert_eq!(
        node.store.get_markdown(&tenant(), &gav).await.unwrap(),
        "# Schema X"
    );

    node.store
        .delete_version(&tenant(), gav.clone())
        .await
        .expect("delete version");
    // Version, comments and markdown are all gone.
    assert!(node.store.list_comments(&tenant(), &gav).await.is_err());
    assert!(node.store.get_markdown(&tenant(), &gav).await.is_err());
}

#[tokio::test]
async fn canonical_hash_is_backfilled_lazily() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    // Same schema, different whitespace: distinct content rows, same
    // canonical hash.
    create_artifact(&node, "g1", "a1", content(RECORD_SCHEMA)).await;
    create_artifact(
        &node,
        "g1",
        "a2",
        content(br#"{ "type": "record", "name": "X", "fields": [] }"#),
    )
    .await;

    let first = node
        .store
        .get_version_content_canonical(&tenant(), &Gav::new("g1", "a1", "1"))
        .await
        .expect("canonical fetch a1");
    let second = node
        .store
        .get_version_content_canonical(&tenant(), &Gav::new("g1", "a2", "1"))
        .await
        .expect("canonical fetch a2");

    assert_ne!(first.content_hash, second.content_hash);
    assert_eq!(first.canonical_hash, second.canonical_hash);
    assert!(first.canonical_hash.is_some());

    // The backfill is persisted, not recomputed per read.
    let again = node
        .store
        .get_version_content(&tenant(), &Gav::new("g1", "a1", "1"))
        .await
        .expect("plain fetch");
    assert_eq!(again.canonical_hash, first.canonical_hash);
}
