use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/groups", group_routes())
        .nest("/admin", admin_routes())
}

fn group_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::group::search_groups,
            handlers::group::create_group,
        ))
        .routes(routes!(
            handlers::group::get_group,
            handlers::group::update_group,
            handlers::group::delete_group,
        ))
        .nest("/{group_id}/artifacts", artifact_routes())
}

fn artifact_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::artifact::search_artifacts,
            handlers::artifact::create_artifact,
        ))
        .routes(routes!(
            handlers::artifact::get_artifact,
            handlers::artifact::delete_artifact,
        ))
        .routes(routes!(
            handlers::artifact::list_versions,
            handlers::artifact::create_version,
        ))
        .routes(routes!(
            handlers::artifact::get_version_meta,
            handlers::artifact::delete_version,
        ))
        .routes(routes!(handlers::artifact::get_version_content))
        .routes(routes!(handlers::artifact::update_version_state))
        .routes(routes!(
            handlers::rule::list_artifact_rules,
            handlers::rule::create_artifact_rule,
        ))
        .routes(routes!(handlers::rule::delete_artifact_rule))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest(
            "/rules",
            OpenApiRouter::new()
                .routes(routes!(
                    handlers::rule::list_global_rules,
                    handlers::rule::create_global_rule,
                ))
                .routes(routes!(
                    handlers::rule::update_global_rule,
                    handlers::rule::delete_global_rule,
                )),
        )
        .routes(routes!(handlers::admin::list_config_properties))
        .routes(routes!(
            handlers::admin::get_config_property,
            handlers::admin::set_config_property,
            handlers::admin::delete_config_property,
        ))
        .routes(routes!(
            handlers::admin::list_role_mappings,
            handlers::admin::create_role_mapping,
        ))
        .routes(routes!(
            handlers::admin::update_role_mapping,
            handlers::admin::delete_role_mapping,
        ))
}
