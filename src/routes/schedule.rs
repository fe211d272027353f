use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{handlers::schedule::get_schedule, utils::state::AppState};

pub fn schedule_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/{year}", get(get_schedule))
        .with_state(state)
}
