//! Client configuration.
//!
//! Values come from the environment (`RESEARCH_*` variables) on top of local
//! development defaults; callers may override any field
//! afterwards.

use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use crate::error::{ClientError, Result};

pub const ENV_BASE_URL: &str = "RESEARCH_BACKEND_BASE_URL";
pub const ENV_TOPIC_ENDPOINT: &str = "RESEARCH_TOPIC_ENDPOINT";
pub const ENV_POLL_INTERVAL_MS: &str = "RESEARCH_POLL_INTERVAL_MS";
pub const ENV_MAX_ATTEMPTS: &str = "RESEARCH_MAX_ATTEMPTS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "RESEARCH_REQUEST_TIMEOUT_SECS";
pub const ENV_SESSION_FILE: &str = "RESEARCH_SESSION_FILE";
pub const ENV_NOTICE_TTL_MS: &str = "RESEARCH_NOTICE_TTL_MS";

/// Shape of the single-topic endpoint. The backend has exposed both, so the
/// client is told which one to use instead of guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicEndpoint {
    /// `GET /research/{id}`
    #[default]
    Path,
    /// `GET /research/topic?topic_id={id}`
    Query,
}

impl FromStr for TopicEndpoint {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "path" => Ok(TopicEndpoint::Path),
            "query" => Ok(TopicEndpoint::Query),
            other => Err(ClientError::Config(format!(
                "unknown topic endpoint '{}', expected 'path' or 'query'",
                other
            ))),
        }
    }
}

impl fmt::Display for TopicEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicEndpoint::Path => f.write_str("path"),
            TopicEndpoint::Query => f.write_str("query"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub topic_endpoint: TopicEndpoint,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound on topic fetches per detail view; `None` polls until settled.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub session_file: Option<PathBuf>,
    #[serde(default = "default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_notice_ttl_ms() -> u64 {
    3_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            topic_endpoint: TopicEndpoint::default(),
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: None,
            request_timeout_secs: default_request_timeout_secs(),
            session_file: None,
            notice_ttl_ms: default_notice_ttl_ms(),
        }
    }
}

impl ClientConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_BASE_URL) {
            config.base_url = url.trim().to_string();
        }
        if let Some(endpoint) = get(ENV_TOPIC_ENDPOINT) {
            config.topic_endpoint = endpoint.parse()?;
        }
        if let Some(interval) = get(ENV_POLL_INTERVAL_MS) {
            config.poll_interval_ms = parse_number(ENV_POLL_INTERVAL_MS, &interval)?;
        }
        if let Some(attempts) = get(ENV_MAX_ATTEMPTS) {
            config.max_attempts = Some(parse_number(ENV_MAX_ATTEMPTS, &attempts)?);
        }
        if let Some(timeout) = get(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = parse_number(ENV_REQUEST_TIMEOUT_SECS, &timeout)?;
        }
        if let Some(path) = get(ENV_SESSION_FILE) {
            config.session_file = Some(PathBuf::from(path));
        }
        if let Some(ttl) = get(ENV_NOTICE_TTL_MS) {
            config.notice_ttl_ms = parse_number(ENV_NOTICE_TTL_MS, &ttl)?;
        }

        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }

    /// Location of the session file, falling back to `~/.research-client/session.json`.
    pub fn session_file_path(&self) -> PathBuf {
        if let Some(path) = &self.session_file {
            return path.clone();
        }
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        home.join(".research-client").join("session.json")
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ClientError::Config(format!("{} must be a number, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, "http://localhost:4000");
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.notice_ttl(), Duration::from_secs(3));
        assert_eq!(config.topic_endpoint, TopicEndpoint::Path);
        assert!(config.max_attempts.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, " http://research.internal:8080 "),
            (ENV_TOPIC_ENDPOINT, "Query"),
            (ENV_POLL_INTERVAL_MS, "500"),
            (ENV_MAX_ATTEMPTS, "10"),
            (ENV_SESSION_FILE, "/tmp/session.json"),
            (ENV_REQUEST_TIMEOUT_SECS, ""),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://research.internal:8080");
        assert_eq!(config.topic_endpoint, TopicEndpoint::Query);
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.max_attempts, Some(10));
        assert_eq!(config.session_file_path(), PathBuf::from("/tmp/session.json"));
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_POLL_INTERVAL_MS, "soon")])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));

        let err = ClientConfig::from_lookup(lookup(&[(ENV_TOPIC_ENDPOINT, "header")])).unwrap_err();
        assert!(err.to_string().contains("header"));
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "topic_endpoint": "query" }"#).unwrap();
        assert_eq!(config.topic_endpoint, TopicEndpoint::Query);
        assert_eq!(config.poll_interval_ms, 2_000);
        assert_eq!(config.base_url, "http://localhost:4000");
    }
}
