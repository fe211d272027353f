pub mod file;
pub mod openf1;

use async_trait::async_trait;

use crate::models::{error::PredictError, prediction::Meeting, session::WeekendData};

/// Where session results come from: the live timing API or a file the user
/// filled in by hand.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn schedule(&self, year: i32) -> Result<Vec<Meeting>, PredictError>;

    /// Loads practice and qualifying for a weekend. Sessions that are missing
    /// upstream come back empty rather than failing the whole weekend.
    async fn load_weekend(&self, year: i32, grand_prix: &str) -> Result<WeekendData, PredictError>;
}
