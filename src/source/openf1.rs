use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    analysis::session_stats::summarize_session,
    models::{
        cache::TtlCache,
        error::PredictError,
        openf1::{DriverRecord, LapRecord, MeetingRecord, SessionRecord, SessionResultRecord},
        prediction::Meeting,
        session::{Lap, QualifyingEntry, SessionKind, SessionResults, WeekendData},
    },
    source::SessionSource,
    utils::{config::Config, race_utils::find_meeting, rate_limiter::RateLimiter},
};

pub struct OpenF1Source {
    http_client: Client,
    base_url: String,
    limiter: RateLimiter,
    responses: TtlCache<Value>,
    include_sprint: bool,
}

impl OpenF1Source {
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(OpenF1Source {
            http_client,
            base_url: config.openf1_base_url.clone(),
            limiter: RateLimiter::new(
                config.max_concurrent_requests,
                config.min_request_delay_ms,
            ),
            responses: TtlCache::new(config.cache_ttl_seconds),
            include_sprint: config.include_sprint,
        })
    }

    /// GETs an OpenF1 collection. The API answers 404 for a filter that
    /// matches nothing, which we treat as an empty list.
    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, PredictError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let cache_key = format!(
            "{url}?{}",
            query
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&")
        );

        let body = match self.responses.get(&cache_key) {
            Some(body) => body,
            None => {
                let _guard = self.limiter.acquire().await?;
                debug!(
                    "GET {} ({} request slots free)",
                    cache_key,
                    self.limiter.available_permits()
                );
                let res = self.http_client.get(&url).query(query).send().await?;
                if res.status() == StatusCode::NOT_FOUND {
                    Value::Array(Vec::new())
                } else {
                    let body: Value = res.error_for_status()?.json().await?;
                    self.responses.insert(cache_key, body.clone());
                    body
                }
            }
        };

        if !body.is_array() {
            return Err(PredictError::InvalidData(format!(
                "{endpoint} did not return a list"
            )));
        }
        Ok(serde_json::from_value(body)?)
    }

    async fn meetings(&self, year: i32) -> Result<Vec<MeetingRecord>, PredictError> {
        let mut meetings: Vec<MeetingRecord> =
            self.fetch("meetings", &[("year", year.to_string())]).await?;
        meetings.sort_by_key(|m| m.date_start);
        Ok(meetings)
    }

    async fn sessions(&self, meeting_key: u32) -> Result<Vec<SessionRecord>, PredictError> {
        self.fetch("sessions", &[("meeting_key", meeting_key.to_string())])
            .await
    }

    async fn driver_codes(&self, session_key: u32) -> Result<HashMap<u32, String>, PredictError> {
        let drivers: Vec<DriverRecord> = self
            .fetch("drivers", &[("session_key", session_key.to_string())])
            .await?;
        Ok(driver_code_map(drivers))
    }

    async fn load_practice(
        &self,
        kind: SessionKind,
        session_key: u32,
    ) -> Result<SessionResults, PredictError> {
        let codes = self.driver_codes(session_key).await?;
        let records: Vec<LapRecord> = self
            .fetch("laps", &[("session_key", session_key.to_string())])
            .await?;
        let laps = laps_from_records(records, &codes);
        Ok(summarize_session(kind, &laps))
    }

    async fn load_qualifying(&self, session_key: u32) -> Result<Vec<QualifyingEntry>, PredictError> {
        let codes = self.driver_codes(session_key).await?;
        let results: Vec<SessionResultRecord> = self
            .fetch("session_result", &[("session_key", session_key.to_string())])
            .await?;
        Ok(qualifying_entries(results, &codes))
    }

    fn wants(&self, kind: SessionKind) -> bool {
        kind != SessionKind::Sprint || self.include_sprint
    }
}

#[async_trait]
impl SessionSource for OpenF1Source {
    async fn schedule(&self, year: i32) -> Result<Vec<Meeting>, PredictError> {
        Ok(self
            .meetings(year)
            .await?
            .into_iter()
            .map(Meeting::from)
            .collect())
    }

    async fn load_weekend(&self, year: i32, grand_prix: &str) -> Result<WeekendData, PredictError> {
        let meetings = self.meetings(year).await?;
        let meeting = find_meeting(grand_prix, &meetings).ok_or_else(|| {
            PredictError::GrandPrixNotFound {
                year,
                name: grand_prix.to_string(),
                available: meetings.iter().map(|m| m.meeting_name.clone()).collect(),
            }
        })?;
        info!(
            "Found GP data using name: '{}' (meeting {})",
            meeting.meeting_name, meeting.meeting_key
        );

        let now = Utc::now();
        let mut sessions: Vec<(SessionKind, SessionRecord)> = self
            .sessions(meeting.meeting_key)
            .await?
            .into_iter()
            .filter_map(|s| SessionKind::from_openf1_name(&s.session_name).map(|k| (k, s)))
            .filter(|(kind, _)| self.wants(*kind))
            .collect();
        sessions.sort_by_key(|(kind, _)| *kind);

        let mut practice = Vec::new();
        let mut qualifying = Vec::new();
        for (kind, session) in sessions {
            if session.date_start.is_some_and(|start| start > now) {
                info!("{} has not started yet", kind);
                continue;
            }
            if kind == SessionKind::Qualifying {
                info!("Loading Qualifying...");
                match self.load_qualifying(session.session_key).await {
                    Ok(entries) if !entries.is_empty() => {
                        info!("Qualifying: {} drivers loaded", entries.len());
                        qualifying = entries;
                    }
                    Ok(_) => warn!("No qualifying data available"),
                    Err(err) => warn!("Error loading qualifying: {}", err),
                }
                continue;
            }

            info!("Loading {}...", kind);
            match self.load_practice(kind, session.session_key).await {
                Ok(results) if !results.is_empty() => {
                    info!("{}: {} drivers loaded", kind, results.drivers.len());
                    practice.push(results);
                }
                Ok(_) => warn!("No data available for {}", kind),
                Err(err) => warn!("Error loading {}: {}", kind, err),
            }
        }

        Ok(WeekendData {
            year,
            grand_prix: meeting.meeting_name.clone(),
            practice,
            qualifying,
        })
    }
}

fn driver_code_map(drivers: Vec<DriverRecord>) -> HashMap<u32, String> {
    drivers
        .into_iter()
        .filter_map(|d| d.name_acronym.map(|code| (d.driver_number, code)))
        .collect()
}

fn driver_code(codes: &HashMap<u32, String>, number: u32) -> String {
    codes
        .get(&number)
        .cloned()
        .unwrap_or_else(|| number.to_string())
}

fn laps_from_records(records: Vec<LapRecord>, codes: &HashMap<u32, String>) -> Vec<Lap> {
    records
        .into_iter()
        .map(|r| Lap {
            driver: driver_code(codes, r.driver_number),
            lap_number: r.lap_number,
            duration: r.lap_duration,
        })
        .collect()
}

fn qualifying_entries(
    mut results: Vec<SessionResultRecord>,
    codes: &HashMap<u32, String>,
) -> Vec<QualifyingEntry> {
    results.sort_by_key(|r| (r.position.is_none(), r.position, r.driver_number));
    results
        .into_iter()
        .map(|r| QualifyingEntry {
            driver: driver_code(codes, r.driver_number),
            position: r.position,
            q1: r.segment(0),
            q2: r.segment(1),
            q3: r.segment(2),
        })
        .collect()
}
