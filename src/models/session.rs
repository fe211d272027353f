use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::models::error::PredictError;

/// The sessions of a race weekend that feed a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionKind {
    #[serde(rename = "FP1")]
    Fp1,
    #[serde(rename = "FP2")]
    Fp2,
    #[serde(rename = "FP3")]
    Fp3,
    #[serde(rename = "Sprint")]
    Sprint,
    #[serde(rename = "Qualifying", alias = "Q")]
    Qualifying,
}

impl SessionKind {
    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Fp1 => "FP1",
            SessionKind::Fp2 => "FP2",
            SessionKind::Fp3 => "FP3",
            SessionKind::Sprint => "Sprint",
            SessionKind::Qualifying => "Qualifying",
        }
    }

    /// Default weight of the session's fastest lap in the practice average.
    /// Later sessions weigh more.
    pub fn practice_weight(self) -> Option<f64> {
        match self {
            SessionKind::Fp1 => Some(0.15),
            SessionKind::Fp2 => Some(0.25),
            SessionKind::Fp3 => Some(0.35),
            SessionKind::Sprint => Some(0.25),
            SessionKind::Qualifying => None,
        }
    }

    pub fn is_practice(self) -> bool {
        self != SessionKind::Qualifying
    }

    /// Maps an OpenF1 `session_name` onto a session we analyse.
    pub fn from_openf1_name(external: &str) -> Option<Self> {
        match external {
            "Practice 1" => Some(SessionKind::Fp1),
            "Practice 2" => Some(SessionKind::Fp2),
            "Practice 3" => Some(SessionKind::Fp3),
            "Sprint" => Some(SessionKind::Sprint),
            "Qualifying" => Some(SessionKind::Qualifying),
            _ => None,
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionKind {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fp1" | "practice 1" => Ok(SessionKind::Fp1),
            "fp2" | "practice 2" => Ok(SessionKind::Fp2),
            "fp3" | "practice 3" => Ok(SessionKind::Fp3),
            "sprint" => Ok(SessionKind::Sprint),
            "q" | "qualifying" => Ok(SessionKind::Qualifying),
            other => Err(PredictError::InvalidData(format!(
                "unknown session '{other}'"
            ))),
        }
    }
}

/// A single timed lap. `duration` is in seconds and absent for laps
/// without a valid time (in/out laps, red flags, deleted laps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub driver: String,
    pub lap_number: u32,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSessionSummary {
    pub driver: String,
    pub session: SessionKind,
    pub fastest_lap: f64,
    pub average_lap: f64,
    pub consistency: Option<f64>,
    pub total_laps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResults {
    pub session: SessionKind,
    pub drivers: Vec<DriverSessionSummary>,
}

impl SessionResults {
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingEntry {
    pub driver: String,
    pub position: Option<u32>,
    pub q1: Option<f64>,
    pub q2: Option<f64>,
    pub q3: Option<f64>,
}

/// Everything loaded for one Grand Prix weekend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekendData {
    pub year: i32,
    pub grand_prix: String,
    pub practice: Vec<SessionResults>,
    pub qualifying: Vec<QualifyingEntry>,
}
