mod handlers;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::registry::SessionRegistry;

pub fn create_router(registry: SessionRegistry) -> Router {
    let api = Router::new()
        // Sessions
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/{id}", get(handlers::get_session))
        .route("/sessions/{id}", delete(handlers::close_session))
        .route("/sessions/{id}/toggle", post(handlers::toggle_feature))
        // Model
        .route("/sessions/{id}/model", get(handlers::export_model))
        .route("/sessions/{id}/model", post(handlers::edit_model))
        .route("/sessions/{id}/export", get(handlers::export_configuration))
        .route("/sessions/{id}/features", get(handlers::export_feature_list))
        .route("/sessions/{id}/tree", get(handlers::render_tree))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(registry)
}
