use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options. sqlite keeps a single connection so an
    // in-memory database survives for the pool's lifetime.
    if db_url.starts_with("sqlite") {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(100).min_connections(5);
    }
    opt.connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;
    ensure_indexes(&db).await?;

    Ok(db)
}

/// Create the lookup and uniqueness indexes the schema sync does not cover.
/// Uniqueness of coordinates is also enforced by apply-time preconditions;
/// the indexes make the invariant hold even against operator SQL.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    const STATEMENTS: &[&str] = &[
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_group_coords ON registry_group (tenant_id, group_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_artifact_coords ON artifact (tenant_id, group_id, artifact_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_version_coords ON artifact_version (tenant_id, group_id, artifact_id, version)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_version_global_id ON artifact_version (tenant_id, global_id)",
        "CREATE INDEX IF NOT EXISTS ix_version_content_id ON artifact_version (tenant_id, content_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_content_id ON content (tenant_id, content_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_content_hash ON content (tenant_id, content_hash)",
        "CREATE INDEX IF NOT EXISTS ix_content_reference_owner ON content_reference (tenant_id, content_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_global_rule ON global_rule (tenant_id, rule_type)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_artifact_rule ON artifact_rule (tenant_id, group_id, artifact_id, rule_type)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_comment_id ON version_comment (tenant_id, comment_id)",
        "CREATE INDEX IF NOT EXISTS ix_comment_global_id ON version_comment (tenant_id, global_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_role_mapping ON role_mapping (tenant_id, principal_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_config_property ON config_property (tenant_id, name)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_markdown_global_id ON version_markdown (tenant_id, global_id)",
        "CREATE UNIQUE INDEX IF NOT EXISTS ux_sequence_name ON id_sequence (tenant_id, name)",
    ];

    for statement in STATEMENTS {
        db.execute_unprepared(statement).await?;
    }
    Ok(())
}
