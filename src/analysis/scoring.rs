//! Turns practice summaries and the qualifying classification into a ranked
//! race prediction.
//!
//! The practice score is a penalty (lower is better) built from three parts:
//! the gap of the driver's weighted fastest lap to the quickest driver, the
//! spread of their lap times, and a bonus for mileage. It is then blended
//! with the grid position into the final score.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    error::PredictError,
    prediction::{DriverPrediction, PracticeProfile, Prediction},
    session::{QualifyingEntry, SessionKind, SessionResults, WeekendData},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub fp1: f64,
    pub fp2: f64,
    pub fp3: f64,
    pub sprint: f64,
    /// Penalty points per second of gap to the fastest driver.
    pub lap_gap_scale: f64,
    /// Penalty points per second of lap-time standard deviation.
    pub consistency_scale: f64,
    /// Used when a driver's consistency is exactly zero.
    pub flat_consistency_penalty: f64,
    /// Assumed consistency (seconds) for drivers without enough laps to measure it.
    pub default_consistency: f64,
    /// Laps needed for the full mileage bonus.
    pub reliability_laps: f64,
    pub reliability_bonus: f64,
    pub qualifying_weight: f64,
    pub practice_weight: f64,
    pub practice_divisor: f64,
    /// Final-score gap at which confidence saturates.
    pub confidence_gap: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            fp1: SessionKind::Fp1.practice_weight().unwrap_or_default(),
            fp2: SessionKind::Fp2.practice_weight().unwrap_or_default(),
            fp3: SessionKind::Fp3.practice_weight().unwrap_or_default(),
            sprint: SessionKind::Sprint.practice_weight().unwrap_or_default(),
            lap_gap_scale: 1000.0,
            consistency_scale: 100.0,
            flat_consistency_penalty: 500.0,
            default_consistency: 10.0,
            reliability_laps: 50.0,
            reliability_bonus: 100.0,
            qualifying_weight: 0.6,
            practice_weight: 0.4,
            practice_divisor: 100.0,
            confidence_gap: 10.0,
        }
    }
}

impl ScoringWeights {
    pub fn session_weight(&self, session: SessionKind) -> f64 {
        match session {
            SessionKind::Fp1 => self.fp1,
            SessionKind::Fp2 => self.fp2,
            SessionKind::Fp3 => self.fp3,
            SessionKind::Sprint => self.sprint,
            SessionKind::Qualifying => 0.0,
        }
    }
}

#[derive(Default)]
struct DriverAccumulator {
    weighted_laps: Vec<(f64, f64)>,
    consistencies: Vec<f64>,
    total_laps: u32,
}

pub fn build_practice_profiles(
    practice: &[SessionResults],
    weights: &ScoringWeights,
) -> Vec<PracticeProfile> {
    let mut drivers: BTreeMap<&str, DriverAccumulator> = BTreeMap::new();
    for session in practice.iter().filter(|s| s.session.is_practice()) {
        let weight = weights.session_weight(session.session);
        for summary in &session.drivers {
            let acc = drivers.entry(summary.driver.as_str()).or_default();
            acc.weighted_laps.push((summary.fastest_lap, weight));
            if let Some(consistency) = summary.consistency {
                acc.consistencies.push(consistency);
            }
            acc.total_laps += summary.total_laps;
        }
    }

    let mut profiles: Vec<PracticeProfile> = drivers
        .into_iter()
        .filter(|(_, acc)| !acc.weighted_laps.is_empty())
        .map(|(driver, acc)| {
            let weight_sum: f64 = acc.weighted_laps.iter().map(|(_, w)| w).sum();
            let avg_fastest_lap = if weight_sum > 0.0 {
                acc.weighted_laps.iter().map(|(t, w)| t * w).sum::<f64>() / weight_sum
            } else {
                acc.weighted_laps.iter().map(|(t, _)| t).sum::<f64>()
                    / acc.weighted_laps.len() as f64
            };
            let consistency = if acc.consistencies.is_empty() {
                weights.default_consistency
            } else {
                acc.consistencies.iter().sum::<f64>() / acc.consistencies.len() as f64
            };
            PracticeProfile {
                driver: driver.to_string(),
                avg_fastest_lap,
                consistency,
                total_laps: acc.total_laps,
                practice_score: 0.0,
            }
        })
        .collect();

    let fastest_overall = profiles
        .iter()
        .map(|p| p.avg_fastest_lap)
        .fold(f64::INFINITY, f64::min);

    for profile in &mut profiles {
        let lap_time_score = (profile.avg_fastest_lap - fastest_overall) * weights.lap_gap_scale;
        let consistency_score = if profile.consistency == 0.0 {
            weights.flat_consistency_penalty
        } else {
            profile.consistency * weights.consistency_scale
        };
        let reliability = if weights.reliability_laps > 0.0 {
            (profile.total_laps as f64 / weights.reliability_laps).min(1.0)
        } else {
            1.0
        };
        profile.practice_score =
            lap_time_score + consistency_score - reliability * weights.reliability_bonus;
    }

    profiles
}

/// Ranks every qualifier that also ran in practice. Drivers missing from
/// practice are dropped; drivers without a grid position rank last.
pub fn score_weekend(
    practice: &[SessionResults],
    qualifying: &[QualifyingEntry],
    weights: &ScoringWeights,
) -> Vec<DriverPrediction> {
    let profiles: BTreeMap<String, PracticeProfile> = build_practice_profiles(practice, weights)
        .into_iter()
        .map(|p| (p.driver.clone(), p))
        .collect();

    let mut seen = HashSet::new();
    let mut rankings: Vec<DriverPrediction> = qualifying
        .iter()
        .filter(|entry| seen.insert(entry.driver.clone()))
        .filter_map(|entry| {
            let Some(profile) = profiles.get(&entry.driver) else {
                debug!("{} qualified but has no practice laps", entry.driver);
                return None;
            };
            let final_score = entry.position.map(|position| {
                position as f64 * weights.qualifying_weight
                    + profile.practice_score * weights.practice_weight / weights.practice_divisor
            });
            Some(DriverPrediction {
                driver: entry.driver.clone(),
                qualifying_position: entry.position,
                practice_score: profile.practice_score,
                final_score,
                avg_fastest_lap: profile.avg_fastest_lap,
                consistency: profile.consistency,
            })
        })
        .collect();

    rankings.sort_by(compare_predictions);
    rankings
}

fn compare_predictions(a: &DriverPrediction, b: &DriverPrediction) -> Ordering {
    fn none_last<T>(a: &Option<T>, b: &Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => cmp(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
    none_last(&a.final_score, &b.final_score, |x, y| x.total_cmp(y))
        .then_with(|| none_last(&a.qualifying_position, &b.qualifying_position, |x, y| x.cmp(y)))
        .then_with(|| a.driver.cmp(&b.driver))
}

/// Confidence that the leader wins, from the margin over the runner-up:
/// 50% for a dead heat, rising linearly to 100% at `confidence_gap`.
///
/// This replaces the `(1 - (leader - runner_up) / 10) * 100` heuristic.
/// Lower scores win, so `leader - runner_up` is never positive and that
/// formula reports more than 100% for any real margin.
pub fn confidence(rankings: &[DriverPrediction], weights: &ScoringWeights) -> Option<f64> {
    let leader = rankings.first()?.final_score?;
    let runner_up = rankings.get(1)?.final_score?;
    let gap = (runner_up - leader).max(0.0);
    let ratio = if weights.confidence_gap > 0.0 {
        (gap / weights.confidence_gap).min(1.0)
    } else {
        1.0
    };
    Some(50.0 + 50.0 * ratio)
}

pub fn predict(weekend: &WeekendData, weights: &ScoringWeights) -> Result<Prediction, PredictError> {
    let practice: Vec<SessionResults> = weekend
        .practice
        .iter()
        .filter(|s| s.session.is_practice() && !s.is_empty())
        .cloned()
        .collect();

    if practice.is_empty() {
        return Err(PredictError::InsufficientData(
            "no practice session has lap data".into(),
        ));
    }
    if weekend.qualifying.is_empty() {
        return Err(PredictError::InsufficientData(
            "no qualifying data available".into(),
        ));
    }

    let rankings = score_weekend(&practice, &weekend.qualifying, weights);
    let Some(leader) = rankings.first() else {
        return Err(PredictError::NoPredictions);
    };

    let mut sessions_analyzed: Vec<SessionKind> = practice.iter().map(|s| s.session).collect();
    sessions_analyzed.sort();
    sessions_analyzed.dedup();

    Ok(Prediction {
        year: weekend.year,
        grand_prix: weekend.grand_prix.clone(),
        winner: leader.driver.clone(),
        confidence: confidence(&rankings, weights),
        podium: rankings.iter().take(3).map(|r| r.driver.clone()).collect(),
        sessions_analyzed,
        rankings,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::DriverSessionSummary;

    fn summary(
        driver: &str,
        session: SessionKind,
        fastest: f64,
        sd: Option<f64>,
        laps: u32,
    ) -> DriverSessionSummary {
        DriverSessionSummary {
            driver: driver.into(),
            session,
            fastest_lap: fastest,
            average_lap: fastest + 1.0,
            consistency: sd,
            total_laps: laps,
        }
    }

    fn quali(driver: &str, position: Option<u32>) -> QualifyingEntry {
        QualifyingEntry {
            driver: driver.into(),
            position,
            q1: None,
            q2: None,
            q3: None,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn sample_practice() -> Vec<SessionResults> {
        vec![
            SessionResults {
                session: SessionKind::Fp1,
                drivers: vec![
                    summary("VER", SessionKind::Fp1, 88.0, Some(0.5), 20),
                    summary("NOR", SessionKind::Fp1, 88.4, Some(0.3), 25),
                ],
            },
            SessionResults {
                session: SessionKind::Fp3,
                drivers: vec![
                    summary("VER", SessionKind::Fp3, 87.0, Some(0.7), 30),
                    summary("NOR", SessionKind::Fp3, 87.2, None, 10),
                    summary("HAM", SessionKind::Fp3, 87.6, None, 1),
                ],
            },
        ]
    }

    #[test]
    fn practice_profile_uses_session_weights() {
        let profiles = build_practice_profiles(&sample_practice(), &ScoringWeights::default());
        let ver = profiles.iter().find(|p| p.driver == "VER").unwrap();

        // (88.0 * 0.15 + 87.0 * 0.35) / 0.5
        assert!(close(ver.avg_fastest_lap, 87.3));
        assert!(close(ver.consistency, 0.6));
        assert_eq!(ver.total_laps, 50);
        // fastest overall is VER: 0 + 0.6 * 100 - 1.0 * 100
        assert!(close(ver.practice_score, -40.0));
    }

    #[test]
    fn missing_consistency_falls_back_to_default() {
        let profiles = build_practice_profiles(&sample_practice(), &ScoringWeights::default());
        let ham = profiles.iter().find(|p| p.driver == "HAM").unwrap();
        assert!(close(ham.consistency, 10.0));
        // (87.6 - 87.3) * 1000 + 10 * 100 - (1 / 50) * 100
        assert!(close(ham.practice_score, 300.0 + 1000.0 - 2.0));
    }

    #[test]
    fn zero_spread_gets_flat_penalty() {
        let practice = vec![SessionResults {
            session: SessionKind::Fp2,
            drivers: vec![summary("ALB", SessionKind::Fp2, 90.0, Some(0.0), 50)],
        }];
        let profiles = build_practice_profiles(&practice, &ScoringWeights::default());
        assert!(close(profiles[0].practice_score, 500.0 - 100.0));
    }

    #[test]
    fn practice_pace_can_overturn_adjacent_grid_slots() {
        let qualifying = vec![quali("NOR", Some(1)), quali("VER", Some(2)), quali("HAM", Some(3))];
        let rankings = score_weekend(&sample_practice(), &qualifying, &ScoringWeights::default());

        // NOR: 0.6 + 220 * 0.004, VER: 1.2 - 40 * 0.004, HAM: 1.8 + 1298 * 0.004
        let order: Vec<&str> = rankings.iter().map(|r| r.driver.as_str()).collect();
        assert_eq!(order, vec!["VER", "NOR", "HAM"]);
        assert!(close(rankings[1].final_score.unwrap(), 1.48));
        assert!(close(rankings[0].final_score.unwrap(), 2.0 * 0.6 + -40.0 * 0.4 / 100.0));
    }

    #[test]
    fn unclassified_qualifiers_rank_last_and_practice_absentees_are_dropped() {
        let qualifying = vec![
            quali("VER", None),
            quali("NOR", Some(5)),
            quali("BOR", Some(1)),
            quali("NOR", Some(9)),
        ];
        let rankings = score_weekend(&sample_practice(), &qualifying, &ScoringWeights::default());
        let order: Vec<&str> = rankings.iter().map(|r| r.driver.as_str()).collect();
        assert_eq!(order, vec!["NOR", "VER"]);
        assert_eq!(rankings[0].qualifying_position, Some(5));
        assert_eq!(rankings[1].final_score, None);
    }

    #[test]
    fn confidence_grows_with_margin() {
        let weights = ScoringWeights::default();
        let entry = |driver: &str, score: f64| DriverPrediction {
            driver: driver.into(),
            qualifying_position: Some(1),
            practice_score: 0.0,
            final_score: Some(score),
            avg_fastest_lap: 90.0,
            consistency: 0.5,
        };
        assert_eq!(confidence(&[entry("A", 1.0), entry("B", 1.0)], &weights), Some(50.0));
        assert_eq!(confidence(&[entry("A", 1.0), entry("B", 6.0)], &weights), Some(75.0));
        assert_eq!(confidence(&[entry("A", 1.0), entry("B", 40.0)], &weights), Some(100.0));
        assert_eq!(confidence(&[entry("A", 1.0)], &weights), None);
    }

    #[test]
    fn predict_requires_practice_and_qualifying() {
        let weights = ScoringWeights::default();
        let mut weekend = WeekendData {
            year: 2024,
            grand_prix: "British Grand Prix".into(),
            practice: vec![],
            qualifying: vec![quali("VER", Some(1))],
        };
        assert!(matches!(
            predict(&weekend, &weights),
            Err(PredictError::InsufficientData(_))
        ));

        weekend.practice = sample_practice();
        weekend.qualifying.clear();
        assert!(matches!(
            predict(&weekend, &weights),
            Err(PredictError::InsufficientData(_))
        ));

        weekend.qualifying = vec![quali("PIA", Some(1))];
        assert!(matches!(predict(&weekend, &weights), Err(PredictError::NoPredictions)));
    }

    #[test]
    fn predict_reports_winner_and_podium() {
        let weekend = WeekendData {
            year: 2024,
            grand_prix: "British Grand Prix".into(),
            practice: sample_practice(),
            qualifying: vec![quali("HAM", Some(1)), quali("VER", Some(2)), quali("NOR", Some(3))],
        };
        let prediction = predict(&weekend, &ScoringWeights::default()).unwrap();

        assert_eq!(prediction.winner, "VER");
        assert_eq!(prediction.podium, vec!["VER", "NOR", "HAM"]);
        assert_eq!(prediction.sessions_analyzed, vec![SessionKind::Fp1, SessionKind::Fp3]);
        let confidence = prediction.confidence.unwrap();
        assert!((50.0..=100.0).contains(&confidence));
    }
}
