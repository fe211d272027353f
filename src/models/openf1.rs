use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::prediction::Meeting;

#[derive(Deserialize, Debug, Clone)]
pub struct MeetingRecord {
    pub meeting_key: u32,
    pub meeting_name: String,
    pub meeting_official_name: Option<String>,
    pub location: Option<String>,
    pub country_name: Option<String>,
    pub circuit_short_name: Option<String>,
    pub date_start: Option<DateTime<Utc>>,
    pub year: i32,
}

impl From<MeetingRecord> for Meeting {
    fn from(record: MeetingRecord) -> Self {
        Meeting {
            year: record.year,
            name: record.meeting_name,
            location: record.location,
            country: record.country_name,
            date_start: record.date_start,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionRecord {
    pub session_key: u32,
    pub session_name: String,
    pub date_start: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LapRecord {
    pub driver_number: u32,
    pub lap_number: u32,
    pub lap_duration: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DriverRecord {
    pub driver_number: u32,
    pub name_acronym: Option<String>,
}

/// `duration` is a single time for races and a `[Q1, Q2, Q3]` triple for
/// qualifying.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ResultDuration {
    Single(f64),
    Segments(Vec<Option<f64>>),
}

#[derive(Deserialize, Debug, Clone)]
pub struct SessionResultRecord {
    pub driver_number: u32,
    pub position: Option<u32>,
    #[serde(default)]
    pub duration: Option<ResultDuration>,
}

impl SessionResultRecord {
    pub fn segment(&self, index: usize) -> Option<f64> {
        match &self.duration {
            Some(ResultDuration::Segments(times)) => times.get(index).copied().flatten(),
            Some(ResultDuration::Single(time)) if index == 0 => Some(*time),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifying_result_reads_segments() {
        let record: SessionResultRecord = serde_json::from_str(
            r#"{"driver_number": 81, "position": 3, "duration": [86.1, 85.7, null], "dnf": false}"#,
        )
        .unwrap();
        assert_eq!(record.segment(0), Some(86.1));
        assert_eq!(record.segment(1), Some(85.7));
        assert_eq!(record.segment(2), None);
    }

    #[test]
    fn lap_with_null_duration_deserializes() {
        let lap: LapRecord = serde_json::from_str(
            r#"{"driver_number": 1, "lap_number": 1, "lap_duration": null, "is_pit_out_lap": true, "meeting_key": 1}"#,
        )
        .unwrap();
        assert_eq!(lap.lap_duration, None);
    }
}
