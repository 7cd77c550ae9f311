use common::dto::{Gav, ImportEntity};
use common::{ContentHash, CoreError};
use journal::MemoryJournal;
use server::replication::NodeOptions;

use crate::common::{
    content, content_with_refs, create_artifact, reference, spawn_node, spawn_node_with, tenant,
    try_create_artifact, RECORD_SCHEMA,
};

#[tokio::test]
async fn global_ids_are_strictly_monotonic() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    let mut last = 0;
    for i in 0..10 {
        let schema = format!(r#"{{"type":"record","name":"R{i}","fields":[]}}"#);
        let (_, version) =
            create_artifact(&node, "g1", &format!("a{i}"), content(schema.as_bytes())).await;
        assert!(version.global_id > last, "{} !> {last}", version.global_id);
        last = version.global_id;
    }

    // The allocator endpoint participates in the same sequence.
    let next = node.store.next_global_id(&tenant()).await.unwrap();
    assert!(next > last);
}

#[tokio::test]
async fn stored_content_round_trips_through_its_hash() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    let bytes = br#"{"type":"record","name":"RoundTrip","fields":[{"name":"f","type":"long"}]}"#;
    create_artifact(&node, "g1", "rt", content(bytes)).await;

    let stored = node
        .store
        .get_version_content(&tenant(), &Gav::new("g1", "rt", "1"))
        .await
        .unwrap();
    assert_eq!(ContentHash::compute(&stored.content), stored.content_hash);
    assert_eq!(stored.content_hash, ContentHash::compute(bytes));
}

#[tokio::test]
async fn strict_mode_rejects_unresolvable_references() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    let err = try_create_artifact(
        &node,
        "g1",
        "consumer",
        content_with_refs(
            RECORD_SCHEMA,
            vec![reference("g1", "missing", "1", "com.example.Missing")],
        ),
    )
    .await
    .expect_err("dangling reference must be rejected");
    assert!(matches!(err, CoreError::ReferenceInvalid { .. }), "{err:?}");

    // With the target in place the same create succeeds, and the reference
    // list round-trips in insertion order.
    create_artifact(&node, "g1", "dep", content(br#"{"type":"record","name":"D","fields":[]}"#))
        .await;
    let (_, version) = create_artifact(
        &node,
        "g1",
        "consumer",
        content_with_refs(
            RECORD_SCHEMA,
            vec![reference("g1", "dep", "1", "com.example.Dep")],
        ),
    )
    .await;

    let stored = node
        .store
        .get_content_by_id(&tenant(), version.content_id)
        .await
        .unwrap();
    assert_eq!(stored.references.len(), 1);
    assert_eq!(stored.references[0].name, "com.example.Dep");

    let referencing = node
        .store
        .referencing_global_ids(&tenant(), &Gav::new("g1", "dep", "1"))
        .await
        .unwrap();
    assert_eq!(referencing, vec![version.global_id]);
}

#[tokio::test]
async fn reference_cycles_are_rejected_even_in_lax_mode() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node_with(
        &journal,
        NodeOptions {
            strict_references: false,
            ..NodeOptions::default()
        },
    )
    .await;

    // Lax mode admits the dangling forward reference.
    create_artifact(
        &node,
        "g1",
        "x",
        content_with_refs(RECORD_SCHEMA, vec![reference("g1", "y", "1", "to-y")]),
    )
    .await;

    // Closing the loop back onto x/1 must fail.
    let err = try_create_artifact(
        &node,
        "g1",
        "y",
        content_with_refs(
            br#"{"type":"record","name":"Y","fields":[]}"#,
            vec![reference("g1", "x", "1", "to-x")],
        ),
    )
    .await
    .expect_err("cycle must be rejected");
    assert!(matches!(err, CoreError::ReferenceInvalid { .. }), "{err:?}");
}

#[tokio::test]
async fn import_preserves_ids_and_reserves_the_sequence() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    let bytes = RECORD_SCHEMA;
    node.store
        .import_entity(
            &tenant(),
            ImportEntity::Content {
                content_id: 40,
                content_type: Some("application/json".into()),
                content: bytes.to_vec(),
                content_hash: ContentHash::compute(bytes),
                canonical_hash: None,
                references: Vec::new(),
            },
        )
        .await
        .expect("import content");
    node.store
        .import_entity(
            &tenant(),
            ImportEntity::Version {
                group_id: "g1".into(),
                artifact_id: "imported".into(),
                artifact_type: "AVRO".into(),
                version: "5".into(),
                version_ordinal: 1,
                global_id: 100,
                content_id: 40,
                state: common::VersionState::Enabled,
                name: None,
                description: None,
                owner: None,
                labels: Default::default(),
                created_on: chrono::Utc::now(),
            },
        )
        .await
        .expect("import version");

    let meta = node
        .store
        .get_version_meta_by_global_id(&tenant(), 100)
        .await
        .expect("imported version resolvable by global id");
    assert_eq!(meta.version, "5");
    assert_eq!(meta.content_id, 40);

    // New allocations start past the imported ids, with no sleeping
    // reservation dance.
    let (_, version) = create_artifact(
        &node,
        "g1",
        "fresh",
        content(br#"{"type":"record","name":"F","fields":[]}"#),
    )
    .await;
    assert!(version.global_id > 100, "{}", version.global_id);
    assert!(version.content_id > 40, "{}", version.content_id);
}

#[tokio::test]
async fn delete_all_user_data_wipes_the_tenant() {
    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    create_artifact(&node, "g1", "a1", content(RECORD_SCHEMA)).await;
    node.store
        .create_global_rule(&tenant(), common::RuleType::Validity, "SYNTAX_ONLY")
        .await
        .unwrap();
    node.store
        .set_config_property(&tenant(), "registry.limit", "100")
        .await
        .unwrap();

    node.store.delete_all_user_data(&tenant()).await.unwrap();

    assert_eq!(node.store.count_artifacts(&tenant()).await.unwrap(), 0);
    assert!(node.store.list_global_rules(&tenant()).await.unwrap().is_empty());
    assert!(node
        .store
        .list_config_properties(&tenant())
        .await
        .unwrap()
        .is_empty());
    assert!(node.store.export_data(&tenant()).await.unwrap().is_empty());
}

#[tokio::test]
async fn downloads_are_single_use() {
    use common::dto::DownloadContext;

    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    let download_id = node
        .store
        .create_download(
            &tenant(),
            DownloadContext {
                context: serde_json::json!({"export": "g1"}),
                expires_at: chrono::Utc::now() + chrono::Duration::minutes(5),
            },
        )
        .await
        .expect("create download");

    let consumed = node
        .store
        .consume_download(&tenant(), &download_id)
        .await
        .expect("first consume succeeds");
    assert_eq!(consumed.context["export"], "g1");

    let err = node
        .store
        .consume_download(&tenant(), &download_id)
        .await
        .expect_err("second consume must fail");
    assert!(matches!(err, CoreError::NotFound { .. }));
}

#[tokio::test]
async fn search_filters_and_orders_artifacts() {
    use common::dto::{OrderBy, OrderDirection, SearchFilter};

    let journal = MemoryJournal::new(1);
    let node = spawn_node(&journal).await;

    for (artifact_id, schema_name) in [("zeta", "Z"), ("alpha", "A"), ("midway", "M")] {
        let schema = format!(r#"{{"type":"record","name":"{schema_name}","fields":[]}}"#);
        create_artifact(&node, "g1", artifact_id, content(schema.as_bytes())).await;
    }
    create_artifact(&node, "g2", "other", content(RECORD_SCHEMA)).await;

    let results = node
        .store
        .search_artifacts(
            &tenant(),
            &[SearchFilter::Group("g1".into())],
            OrderBy::ArtifactId,
            OrderDirection::Asc,
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(results.count, 3);
    let ids: Vec<&str> = results
        .artifacts
        .iter()
        .map(|a| a.artifact_id.as_str())
        .collect();
    assert_eq!(ids, vec!["alpha", "midway", "zeta"]);

    // Substring name filter against artifact ids.
    let results = node
        .store
        .search_artifacts(
            &tenant(),
            &[SearchFilter::Name("MID".into())],
            OrderBy::Name,
            OrderDirection::Asc,
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(results.count, 1);
    assert_eq!(results.artifacts[0].artifact_id, "midway");

    // Global id filter finds the owning artifact.
    let meta = node
        .store
        .get_version_meta(&tenant(), &Gav::new("g2", "other", "1"))
        .await
        .unwrap();
    let results = node
        .store
        .search_artifacts(
            &tenant(),
            &[SearchFilter::GlobalId(meta.global_id)],
            OrderBy::Name,
            OrderDirection::Asc,
            0,
            10,
        )
        .await
        .unwrap();
    assert_eq!(results.count, 1);
    assert_eq!(results.artifacts[0].artifact_id, "other");
}
