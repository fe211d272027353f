use std::sync::Arc;

use axum::{
    extract::State,
    middleware::from_fn,
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{
        middleware::auth_middleware,
        prediction::{get_prediction, post_prediction},
    },
    utils::state::AppState,
};

pub fn prediction_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let prediction_router = Router::new()
        .route("/", post(post_prediction))
        .route("/{year}/{grand_prix}", get(get_prediction))
        .with_state(state.clone());

    prediction_router.layer(from_fn(move |req, next| {
        auth_middleware(State(state.clone()), req, next)
    }))
}
