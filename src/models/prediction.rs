use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::session::SessionKind;

/// A driver's pace and mileage aggregated over the practice sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeProfile {
    pub driver: String,
    pub avg_fastest_lap: f64,
    pub consistency: f64,
    pub total_laps: u32,
    pub practice_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverPrediction {
    pub driver: String,
    pub qualifying_position: Option<u32>,
    pub practice_score: f64,
    /// Lower is better. Absent when the driver has no classified grid slot.
    pub final_score: Option<f64>,
    pub avg_fastest_lap: f64,
    pub consistency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub year: i32,
    pub grand_prix: String,
    pub winner: String,
    /// Percentage in [50, 100].
    pub confidence: Option<f64>,
    pub podium: Vec<String>,
    pub sessions_analyzed: Vec<SessionKind>,
    pub rankings: Vec<DriverPrediction>,
    pub generated_at: DateTime<Utc>,
}

impl Prediction {
    pub fn winner_entry(&self) -> Option<&DriverPrediction> {
        self.rankings.first()
    }

    pub fn top(&self, n: usize) -> &[DriverPrediction] {
        &self.rankings[..n.min(self.rankings.len())]
    }

    /// Drops every ranking after the first `n`; winner and podium are kept.
    pub fn truncated(mut self, n: usize) -> Self {
        self.rankings.truncate(n);
        self
    }
}

/// One event on the season calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub year: i32,
    pub name: String,
    pub location: Option<String>,
    pub country: Option<String>,
    pub date_start: Option<DateTime<Utc>>,
}
