use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{collages, forums, handlers, sandbox, torrentgroup};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Routes acting as a site user
    let user_routes = Router::new()
        // Collages
        .route("/collages", post(collages::create_collage))
        .route("/collages/exists", get(collages::exists))
        .route("/collages/lookup", get(collages::lookup))
        .route("/collages/autocomplete", get(collages::autocomplete))
        .route("/collages/personal-name", get(collages::personal_name))
        .route("/collages/recover", post(collages::recover))
        .route("/collages/subscriptions", get(collages::subscriptions))
        .route("/collages/suggestions", delete(collages::flush_suggestions))
        .route(
            "/collages/suggestions/group/{id}",
            get(collages::suggest_group),
        )
        .route(
            "/collages/suggestions/artist/{id}",
            get(collages::suggest_artist),
        )
        .route(
            "/collages/{id}",
            get(collages::get_collage).delete(collages::delete_collage),
        )
        .route("/collages/{id}/groups", post(collages::add_group))
        .route("/collages/{id}/artists", post(collages::add_artist))
        .route("/collages/{id}/subscribe", post(collages::subscribe))
        .route("/collages/{id}/visit", post(collages::visit))
        // Torrent groups
        .route("/torrentgroup", get(torrentgroup::get_group))
        // Forums
        .route("/forums/threads", post(forums::create_thread))
        .route("/forums/threads/{id}", get(forums::get_thread))
        // Tools
        .route(
            "/tools/db-sandbox",
            get(sandbox::show).post(sandbox::execute),
        )
        .route("/log", get(handlers::site_log))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .merge(user_routes)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
