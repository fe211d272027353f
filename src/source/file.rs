use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{scoring::ScoringWeights, session_stats::{parse_lap_time, summarize_session}},
    models::{
        error::PredictError,
        prediction::Meeting,
        session::{Lap, QualifyingEntry, SessionKind, WeekendData},
    },
    source::SessionSource,
    utils::race_utils::normalize_gp_name,
};

/// A lap or qualifying time written either as seconds or as `m:ss.fff`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LapTimeValue {
    Seconds(f64),
    Text(String),
}

impl LapTimeValue {
    fn seconds(&self, context: &str) -> Result<f64, PredictError> {
        match self {
            LapTimeValue::Seconds(s) if s.is_finite() && *s > 0.0 => Ok(*s),
            LapTimeValue::Text(raw) => parse_lap_time(raw)
                .filter(|s| *s > 0.0)
                .ok_or_else(|| {
                    PredictError::InvalidData(format!("{context}: bad lap time '{raw}'"))
                }),
            LapTimeValue::Seconds(s) => Err(PredictError::InvalidData(format!(
                "{context}: bad lap time {s}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLap {
    pub driver: String,
    #[serde(default)]
    pub lap: Option<u32>,
    /// Missing for laps without a valid time.
    #[serde(default)]
    pub time: Option<LapTimeValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileQualifying {
    pub driver: String,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub q1: Option<LapTimeValue>,
    #[serde(default)]
    pub q2: Option<LapTimeValue>,
    #[serde(default)]
    pub q3: Option<LapTimeValue>,
}

/// Hand-entered session results for one weekend.
///
/// ```json
/// {
///   "year": 2025,
///   "grand_prix": "British Grand Prix",
///   "sessions": { "FP1": [{ "driver": "NOR", "time": "1:26.910" }] },
///   "qualifying": [{ "driver": "NOR", "position": 1, "q3": 84.9 }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekendFile {
    pub year: i32,
    pub grand_prix: String,
    #[serde(default)]
    pub sessions: BTreeMap<SessionKind, Vec<FileLap>>,
    #[serde(default)]
    pub qualifying: Vec<FileQualifying>,
    #[serde(default)]
    pub weights: Option<ScoringWeights>,
}

impl WeekendFile {
    pub async fn read(path: &Path) -> Result<Self, PredictError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| PredictError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights.clone().unwrap_or_default()
    }

    pub fn to_weekend(&self) -> Result<WeekendData, PredictError> {
        if self.sessions.contains_key(&SessionKind::Qualifying) {
            return Err(PredictError::InvalidData(
                "qualifying belongs in the \"qualifying\" list, not in \"sessions\"".into(),
            ));
        }

        let mut practice = Vec::new();
        for (kind, file_laps) in &self.sessions {
            let mut laps = Vec::with_capacity(file_laps.len());
            for (i, lap) in file_laps.iter().enumerate() {
                let context = format!("{kind} lap {} of {}", i + 1, lap.driver);
                laps.push(Lap {
                    driver: lap.driver.trim().to_uppercase(),
                    lap_number: lap.lap.unwrap_or(i as u32 + 1),
                    duration: lap.time.as_ref().map(|t| t.seconds(&context)).transpose()?,
                });
            }
            let results = summarize_session(*kind, &laps);
            if !results.is_empty() {
                practice.push(results);
            }
        }

        let mut qualifying = Vec::with_capacity(self.qualifying.len());
        for entry in &self.qualifying {
            let segment = |value: &Option<LapTimeValue>, name: &str| {
                value
                    .as_ref()
                    .map(|t| t.seconds(&format!("{name} of {}", entry.driver)))
                    .transpose()
            };
            qualifying.push(QualifyingEntry {
                driver: entry.driver.trim().to_uppercase(),
                position: entry.position,
                q1: segment(&entry.q1, "Q1")?,
                q2: segment(&entry.q2, "Q2")?,
                q3: segment(&entry.q3, "Q3")?,
            });
        }

        Ok(WeekendData {
            year: self.year,
            grand_prix: self.grand_prix.clone(),
            practice,
            qualifying,
        })
    }
}

/// Serves a single hand-entered weekend.
pub struct FileSource {
    weekend: WeekendFile,
}

impl FileSource {
    pub fn new(weekend: WeekendFile) -> Self {
        FileSource { weekend }
    }

    pub async fn open(path: &Path) -> Result<Self, PredictError> {
        Ok(Self::new(WeekendFile::read(path).await?))
    }

    pub fn weekend(&self) -> &WeekendFile {
        &self.weekend
    }
}

#[async_trait]
impl SessionSource for FileSource {
    async fn schedule(&self, year: i32) -> Result<Vec<Meeting>, PredictError> {
        if year != self.weekend.year {
            return Ok(Vec::new());
        }
        Ok(vec![Meeting {
            year,
            name: self.weekend.grand_prix.clone(),
            location: None,
            country: None,
            date_start: None,
        }])
    }

    async fn load_weekend(&self, year: i32, grand_prix: &str) -> Result<WeekendData, PredictError> {
        if year != self.weekend.year
            || normalize_gp_name(grand_prix) != normalize_gp_name(&self.weekend.grand_prix)
        {
            return Err(PredictError::GrandPrixNotFound {
                year,
                name: grand_prix.to_string(),
                available: self
                    .schedule(year)
                    .await?
                    .into_iter()
                    .map(|m| m.name)
                    .collect(),
            });
        }
        self.weekend.to_weekend()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"{
        "year": 2024,
        "grand_prix": "British Grand Prix",
        "sessions": {
            "FP1": [
                { "driver": "ham", "time": "1:27.500" },
                { "driver": "HAM", "time": 88.1 },
                { "driver": "VER", "time": 87.9 },
                { "driver": "VER" }
            ],
            "FP3": [
                { "driver": "HAM", "lap": 4, "time": 86.9 },
                { "driver": "VER", "lap": 7, "time": "1:27.000" }
            ]
        },
        "qualifying": [
            { "driver": "HAM", "position": 2, "q3": "1:25.819" },
            { "driver": "VER", "position": 1, "q1": 86.2, "q3": 85.8 }
        ]
    }"#;

    #[test]
    fn converts_laps_and_times() {
        let file: WeekendFile = serde_json::from_str(SAMPLE).unwrap();
        let weekend = file.to_weekend().unwrap();

        assert_eq!(weekend.practice.len(), 2);
        let fp1 = &weekend.practice[0];
        assert_eq!(fp1.session, SessionKind::Fp1);
        let ham = fp1.drivers.iter().find(|d| d.driver == "HAM").unwrap();
        assert_eq!(ham.total_laps, 2);
        assert!((ham.fastest_lap - 87.5).abs() < 1e-9);
        let ver = fp1.drivers.iter().find(|d| d.driver == "VER").unwrap();
        assert_eq!(ver.total_laps, 1);

        assert!((weekend.qualifying[0].q3.unwrap() - 85.819).abs() < 1e-9);
        assert_eq!(file.weights(), ScoringWeights::default());
    }

    #[test]
    fn rejects_unparseable_times() {
        let file: WeekendFile = serde_json::from_str(
            r#"{"year": 2024, "grand_prix": "X", "sessions": {"FP2": [{"driver": "NOR", "time": "quick"}]}}"#,
        )
        .unwrap();
        let err = file.to_weekend().unwrap_err();
        assert!(err.to_string().contains("quick"));
    }

    #[test]
    fn rejects_zero_text_times_like_zero_numbers() {
        for time in [r#""0:00.000""#, r#""0""#, "0.0"] {
            let json = format!(
                r#"{{"year": 2024, "grand_prix": "X",
                    "sessions": {{"FP1": [{{"driver": "NOR", "time": {time}}}]}}}}"#
            );
            let file: WeekendFile = serde_json::from_str(&json).unwrap();
            let err = file.to_weekend().unwrap_err();
            assert!(matches!(err, PredictError::InvalidData(_)), "{time}: {err}");
        }
    }

    #[test]
    fn partial_weights_override_defaults() {
        let file: WeekendFile = serde_json::from_str(
            r#"{"year": 2024, "grand_prix": "X", "weights": {"qualifying_weight": 1.0}}"#,
        )
        .unwrap();
        let weights = file.weights();
        assert_eq!(weights.qualifying_weight, 1.0);
        assert_eq!(weights.fp3, 0.35);
    }

    #[tokio::test]
    async fn file_source_serves_matching_weekend_only() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(SAMPLE.as_bytes()).unwrap();

        let source = FileSource::open(tmp.path()).await.unwrap();
        let weekend = source.load_weekend(2024, "british gp").await.unwrap();
        assert_eq!(weekend.qualifying.len(), 2);

        let err = source.load_weekend(2024, "Monaco").await.unwrap_err();
        match err {
            PredictError::GrandPrixNotFound { available, .. } => {
                assert_eq!(available, vec!["British Grand Prix".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let err = FileSource::open(Path::new("/nonexistent/weekend.json"))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("/nonexistent/weekend.json"));
    }
}
