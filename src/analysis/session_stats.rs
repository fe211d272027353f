use std::collections::BTreeMap;

use statrs::statistics::Statistics;

use crate::models::session::{DriverSessionSummary, Lap, SessionKind, SessionResults};

/// Reduces a session's laps to one summary per driver.
///
/// Laps without a valid duration are dropped before anything is computed, so
/// a driver who never set a time does not appear. Consistency is the sample
/// standard deviation of the remaining laps and needs at least two of them.
pub fn summarize_session(session: SessionKind, laps: &[Lap]) -> SessionResults {
    let mut by_driver: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for lap in laps {
        if let Some(duration) = lap.duration.filter(|d| d.is_finite() && *d > 0.0) {
            by_driver.entry(lap.driver.as_str()).or_default().push(duration);
        }
    }

    let mut drivers: Vec<DriverSessionSummary> = by_driver
        .into_iter()
        .map(|(driver, times)| {
            let fastest_lap = times.iter().copied().fold(f64::INFINITY, f64::min);
            let average_lap = times.iter().mean();
            let consistency = if times.len() > 1 {
                Some(times.iter().std_dev())
            } else {
                None
            };
            DriverSessionSummary {
                driver: driver.to_string(),
                session,
                fastest_lap,
                average_lap,
                consistency,
                total_laps: times.len() as u32,
            }
        })
        .collect();

    drivers.sort_by(|a, b| {
        a.fastest_lap
            .total_cmp(&b.fastest_lap)
            .then_with(|| a.driver.cmp(&b.driver))
    });

    SessionResults { session, drivers }
}

/// Parses `m:ss.fff` (or `h:mm:ss.fff`) and plain seconds into seconds.
pub fn parse_lap_time(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut seconds = 0.0;
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    for (i, part) in parts.iter().enumerate() {
        let value: f64 = part.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        // Only the trailing component may carry a fraction or exceed 59.
        if i + 1 < parts.len() && (value.fract() != 0.0 || (i > 0 && value >= 60.0)) {
            return None;
        }
        if i + 1 == parts.len() && parts.len() > 1 && value >= 60.0 {
            return None;
        }
        seconds = seconds * 60.0 + value;
    }
    Some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap(driver: &str, n: u32, duration: Option<f64>) -> Lap {
        Lap {
            driver: driver.into(),
            lap_number: n,
            duration,
        }
    }

    #[test]
    fn summarises_each_driver() {
        let laps = vec![
            lap("VER", 1, Some(90.0)),
            lap("VER", 2, Some(88.0)),
            lap("VER", 3, Some(89.0)),
            lap("NOR", 1, Some(87.5)),
            lap("NOR", 2, None),
        ];
        let results = summarize_session(SessionKind::Fp2, &laps);

        assert_eq!(results.session, SessionKind::Fp2);
        assert_eq!(results.drivers.len(), 2);

        let nor = &results.drivers[0];
        assert_eq!(nor.driver, "NOR");
        assert_eq!(nor.total_laps, 1);
        assert_eq!(nor.consistency, None);

        let ver = &results.drivers[1];
        assert_eq!(ver.fastest_lap, 88.0);
        assert!((ver.average_lap - 89.0).abs() < 1e-9);
        assert!((ver.consistency.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(ver.total_laps, 3);
    }

    #[test]
    fn drivers_without_valid_laps_are_omitted() {
        let laps = vec![lap("SAR", 1, None), lap("SAR", 2, Some(f64::NAN))];
        assert!(summarize_session(SessionKind::Fp1, &laps).is_empty());
    }

    #[test]
    fn parses_lap_time_formats() {
        assert_eq!(parse_lap_time("87.097"), Some(87.097));
        assert!((parse_lap_time("1:27.097").unwrap() - 87.097).abs() < 1e-9);
        assert!((parse_lap_time("1:00:01.5").unwrap() - 3601.5).abs() < 1e-9);
        assert_eq!(parse_lap_time("1:75.0"), None);
        assert_eq!(parse_lap_time("1.5:20.0"), None);
        assert_eq!(parse_lap_time("fast"), None);
        assert_eq!(parse_lap_time(""), None);
    }
}
