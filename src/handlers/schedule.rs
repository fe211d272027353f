use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{
    handlers::extract::ApiPath,
    models::{error::Error, prediction::Meeting},
    utils::state::AppState,
};

pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    ApiPath(year): ApiPath<i32>,
) -> Result<Json<Vec<Meeting>>, Error> {
    let meetings = state.source.schedule(year).await?;
    Ok(Json(meetings))
}
