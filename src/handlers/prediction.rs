use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    analysis::scoring::predict,
    handlers::extract::{ApiJson, ApiPath, ApiQuery},
    models::{error::Error, prediction::Prediction},
    source::file::WeekendFile,
    utils::{race_utils::normalize_gp_name, state::AppState},
};

#[derive(Deserialize, Debug, Default)]
pub struct PredictionQuery {
    pub top: Option<usize>,
}

fn trim(prediction: Prediction, params: &PredictionQuery) -> Prediction {
    match params.top {
        Some(n) => prediction.truncated(n),
        None => prediction,
    }
}

pub async fn get_prediction(
    State(state): State<Arc<AppState>>,
    ApiPath((year, grand_prix)): ApiPath<(i32, String)>,
    ApiQuery(params): ApiQuery<PredictionQuery>,
) -> Result<Json<Prediction>, Error> {
    let cache_key = format!("{year}:{}", normalize_gp_name(&grand_prix));
    if let Some(cached) = state.prediction_cache.get(&cache_key) {
        info!("Serving cached prediction for {}", cache_key);
        return Ok(Json(trim(cached, &params)));
    }

    let weekend = state.source.load_weekend(year, &grand_prix).await?;
    let prediction = predict(&weekend, &state.weights)?;
    info!(
        "Predicted {} to win the {} {}",
        prediction.winner, prediction.year, prediction.grand_prix
    );
    state
        .prediction_cache
        .insert(cache_key, prediction.clone());
    debug!("{} predictions cached", state.prediction_cache.len());

    Ok(Json(trim(prediction, &params)))
}

pub async fn post_prediction(
    ApiQuery(params): ApiQuery<PredictionQuery>,
    ApiJson(file): ApiJson<WeekendFile>,
) -> Result<Json<Prediction>, Error> {
    let weekend = file.to_weekend()?;
    let prediction = predict(&weekend, &file.weights())?;
    Ok(Json(trim(prediction, &params)))
}
