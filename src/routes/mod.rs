pub mod prediction;
pub mod schedule;

use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Json, Router};
use http::StatusCode;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    routes::{prediction::prediction_routes, schedule::schedule_routes},
    utils::state::AppState,
};

pub fn make_app(state: Arc<AppState>) -> Router {
    let app = Router::new()
        .route("/", get(health_check))
        .nest("/schedule", schedule_routes(state.clone()))
        .nest("/prediction", prediction_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    info!("Application initialized successfully");

    app
}

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"message": "Race winner predictions are served under /prediction"})),
    )
        .into_response()
}
