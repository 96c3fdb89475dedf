use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Lifecycle of a research job as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    #[default]
    Queued,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl TopicStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TopicStatus::Succeeded | TopicStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicStatus::Queued => "queued",
            TopicStatus::Running => "running",
            TopicStatus::Succeeded => "succeeded",
            TopicStatus::Failed => "failed",
            TopicStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A research job requested by the user. The client only ever holds a
/// possibly stale copy of the backend's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub topic: String,
    #[serde(default)]
    pub status: TopicStatus,
    #[serde(default, deserialize_with = "progress_percent")]
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultEnvelope>,
}

/// Accepts any JSON number (or null) and clamps it to a whole 0-100 percentage.
fn progress_percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if value.is_nan() {
        return Ok(0);
    }
    Ok(value.clamp(0.0, 100.0).round() as u8)
}

impl Topic {
    pub fn is_complete(&self) -> bool {
        self.progress >= 100
    }

    /// Error text reported by the backend, ignoring blank strings.
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
    }

    /// True once polling should stop: the job finished, reported an error,
    /// or reached a terminal status.
    pub fn is_settled(&self) -> bool {
        self.is_complete() || self.error_message().is_some() || self.status.is_terminal()
    }
}

/// One step of the research agent's process log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub step: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinalSynthesis {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Final output of a completed research job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_synthesis: Option<FinalSynthesis>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

/// `{ status, result }` wrapper returned by the result endpoint and embedded
/// in topics as `results`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResearchResult>,
}

impl ResultEnvelope {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopicsResponse {
    #[serde(default)]
    pub topics: Vec<Topic>,
}

#[derive(Debug, Serialize)]
pub struct CreateTopicRequest<'a> {
    pub topic: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTopicResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopicResponse {
    #[serde(default)]
    pub topic: Option<Topic>,
}
