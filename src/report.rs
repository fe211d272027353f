use std::fmt::Write;

use crate::models::prediction::{DriverPrediction, Meeting, Prediction};

const RULE: &str = "==================================================";

fn seconds_or_na(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format!("{v:.3}s"))
        .unwrap_or_else(|| "N/A".to_string())
}

fn grid_slot(position: Option<u32>) -> String {
    position
        .map(|p| format!("P{p:>2}"))
        .unwrap_or_else(|| "P--".to_string())
}

fn ranking_line(rank: usize, entry: &DriverPrediction) -> String {
    let score = entry
        .final_score
        .map(|s| format!("{s:.2}"))
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "{rank:2}. {:<3} | Qual: {} | Avg Fast Lap: {} | Consistency: ±{} | Score: {}",
        entry.driver,
        grid_slot(entry.qualifying_position),
        seconds_or_na(Some(entry.avg_fastest_lap)),
        seconds_or_na(Some(entry.consistency)),
        score,
    )
}

/// Full race-winner report as printed by the CLI.
pub fn render_text(prediction: &Prediction, top_n: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "F1 {} {} Race Winner Prediction",
        prediction.grand_prix, prediction.year
    );
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "\nRACE WINNER PREDICTIONS");
    let _ = writeln!(out, "{RULE}");
    for (i, entry) in prediction.top(top_n).iter().enumerate() {
        let _ = writeln!(out, "{}", ranking_line(i + 1, entry));
    }

    if let Some(winner) = prediction.winner_entry() {
        let _ = writeln!(out, "\nPREDICTED WINNER: {}", winner.driver);
        let grid = grid_slot(winner.qualifying_position).replace(' ', "");
        let avg_fastest = seconds_or_na(Some(winner.avg_fastest_lap));
        let _ = writeln!(out, "   Starting Position: {grid}");
        let _ = writeln!(out, "   Average Fastest Lap: {avg_fastest}");
        if let Some(confidence) = prediction.confidence {
            let _ = writeln!(out, "   Prediction Confidence: {confidence:.1}%");
        }
    }

    const PLACES: [&str; 3] = ["1st", "2nd", "3rd"];
    if !prediction.podium.is_empty() {
        let _ = writeln!(out, "\nPREDICTED PODIUM:");
        for (place, driver) in PLACES.iter().zip(&prediction.podium) {
            let _ = writeln!(out, "   {place}: {driver}");
        }
    }

    let sessions: Vec<&str> = prediction
        .sessions_analyzed
        .iter()
        .map(|s| s.label())
        .collect();
    let _ = writeln!(out, "\nAnalysis based on:");
    let _ = writeln!(out, "   • Practice Sessions: {}", sessions.join(", "));
    let _ = writeln!(out, "   • Qualifying Results");
    let _ = writeln!(out, "   • Lap Time Consistency");
    let _ = writeln!(out, "   • Session Reliability");
    out
}

/// Short ranking used when a fallback season is shown for reference.
pub fn render_reference(prediction: &Prediction, top_n: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ANALYSIS (for reference)",
        prediction.year,
        prediction.grand_prix.to_uppercase()
    );
    let _ = writeln!(out, "{RULE}");
    for (i, entry) in prediction.top(top_n).iter().enumerate() {
        let score = entry
            .final_score
            .map(|s| format!("{s:.2}"))
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(out, "{}. {} - Score: {}", i + 1, entry.driver, score);
    }
    out
}

pub fn render_schedule(year: i32, meetings: &[Meeting]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Available F1 races for {year}:");
    if meetings.is_empty() {
        let _ = writeln!(out, "   (none published)");
    }
    for (i, meeting) in meetings.iter().enumerate() {
        let date = meeting
            .date_start
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "TBA".to_string());
        let _ = writeln!(
            out,
            "{:2}. {:<32} {:<20} {}",
            i + 1,
            meeting.name,
            meeting.location.as_deref().unwrap_or("-"),
            date
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::session::SessionKind;

    fn entry(driver: &str, position: Option<u32>, score: Option<f64>) -> DriverPrediction {
        DriverPrediction {
            driver: driver.into(),
            qualifying_position: position,
            practice_score: 0.0,
            final_score: score,
            avg_fastest_lap: 87.1234,
            consistency: 0.4567,
        }
    }

    fn prediction() -> Prediction {
        Prediction {
            year: 2024,
            grand_prix: "British Grand Prix".into(),
            winner: "VER".into(),
            confidence: Some(58.2),
            podium: vec!["VER".into(), "NOR".into()],
            sessions_analyzed: vec![SessionKind::Fp1, SessionKind::Fp3],
            rankings: vec![entry("VER", Some(2), Some(1.04)), entry("NOR", None, None)],
            generated_at: Utc.with_ymd_and_hms(2024, 7, 6, 16, 0, 0).unwrap(),
        }
    }

    #[test]
    fn ranking_lines_match_report_layout() {
        assert_eq!(
            ranking_line(1, &entry("VER", Some(2), Some(1.04))),
            " 1. VER | Qual: P 2 | Avg Fast Lap: 87.123s | Consistency: ±0.457s | Score: 1.04"
        );
        assert!(ranking_line(2, &entry("NOR", None, None)).contains("Qual: P-- "));
    }

    #[test]
    fn report_lists_winner_podium_and_sessions() {
        let text = render_text(&prediction(), 10);
        assert!(text.contains("PREDICTED WINNER: VER"));
        assert!(text.contains("Starting Position: P2\n"));
        assert!(text.contains("Prediction Confidence: 58.2%"));
        assert!(text.contains("   2nd: NOR"));
        assert!(!text.contains("3rd"));
        assert!(text.contains("Practice Sessions: FP1, FP3"));
    }

    #[test]
    fn reference_view_respects_limit() {
        let text = render_reference(&prediction(), 1);
        assert!(text.contains("1. VER - Score: 1.04"));
        assert!(!text.contains("NOR"));
    }

    #[test]
    fn schedule_shows_dates() {
        let meetings = vec![Meeting {
            year: 2025,
            name: "British Grand Prix".into(),
            location: Some("Silverstone".into()),
            country: Some("United Kingdom".into()),
            date_start: Some(Utc.with_ymd_and_hms(2025, 7, 4, 11, 30, 0).unwrap()),
        }];
        let text = render_schedule(2025, &meetings);
        assert!(text.contains("British Grand Prix"));
        assert!(text.contains("2025-07-04"));
    }
}
