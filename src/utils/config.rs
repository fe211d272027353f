use std::str::FromStr;

use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct JwkComponents {
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openf1_base_url: String,
    pub bind_addr: String,
    pub cache_ttl_seconds: i64,
    pub max_concurrent_requests: usize,
    pub min_request_delay_ms: u64,
    pub include_sprint: bool,
    pub log_level: String,
    /// When absent the prediction routes are served without authentication.
    pub jwk: Option<JwkComponents>,
    /// Problems found while reading the environment. Config is read before
    /// the subscriber exists, so these are logged by `log_warnings`.
    pub warnings: Vec<String>,
}

impl Config {
    pub fn init() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut warnings = Vec::new();
        let jwk = match (lookup("JWK_X"), lookup("JWK_Y")) {
            (Some(x), Some(y)) if !x.is_empty() && !y.is_empty() => Some(JwkComponents { x, y }),
            (None, None) => None,
            _ => {
                let message = "JWK_X and JWK_Y must both be set; authentication disabled";
                warnings.push(message.to_string());
                None
            }
        };

        Config {
            openf1_base_url: lookup("OPENF1_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.openf1.org/v1".to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
            cache_ttl_seconds: parse_or(&lookup, &mut warnings, "CACHE_TTL_SECONDS", 3600),
            max_concurrent_requests: parse_or(&lookup, &mut warnings, "MAX_CONCURRENT_REQUESTS", 3)
                .max(1),
            min_request_delay_ms: parse_or(&lookup, &mut warnings, "MIN_REQUEST_DELAY_MS", 350),
            include_sprint: parse_or(&lookup, &mut warnings, "INCLUDE_SPRINT", false),
            log_level: lookup("LOG_LEVEL")
                .unwrap_or_else(|| "info".to_string())
                .to_lowercase(),
            jwk,
            warnings,
        }
    }

    /// Emits the problems collected by `from_lookup`; call once tracing is up.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    warnings: &mut Vec<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warnings.push(format!("{key}={raw:?} is not valid, using default"));
            default
        }),
        None => default,
    }
}
