use std::sync::Arc;

use crate::{
    analysis::scoring::ScoringWeights,
    models::{cache::TtlCache, prediction::Prediction},
    source::{openf1::OpenF1Source, SessionSource},
    utils::config::Config,
};

pub struct AppState {
    pub config: Config,
    pub source: Arc<dyn SessionSource>,
    pub weights: ScoringWeights,
    pub prediction_cache: TtlCache<Prediction>,
}

impl AppState {
    pub fn init(config: Config) -> Result<Self, reqwest::Error> {
        let source = OpenF1Source::from_config(&config)?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    pub fn with_source(config: Config, source: Arc<dyn SessionSource>) -> Self {
        AppState {
            prediction_cache: TtlCache::new(config.cache_ttl_seconds),
            weights: ScoringWeights::default(),
            source,
            config,
        }
    }
}
