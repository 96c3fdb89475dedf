use crate::models::{ResultEnvelope, Topic};

/// Local state of a single topic being followed.
#[derive(Debug, Clone, Default)]
pub struct TopicDetailView {
    topic_id: String,
    topic: Option<Topic>,
    result: Option<ResultEnvelope>,
    error: Option<String>,
    attempts: u32,
}

impl TopicDetailView {
    pub fn new(topic_id: impl Into<String>) -> Self {
        Self {
            topic_id: topic_id.into(),
            ..Self::default()
        }
    }

    pub fn topic_id(&self) -> &str {
        &self.topic_id
    }

    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    /// Result fetched after the topic settled, falling back to the one
    /// embedded in the topic itself.
    pub fn result(&self) -> Option<&ResultEnvelope> {
        self.result
            .as_ref()
            .or_else(|| self.topic.as_ref().and_then(|topic| topic.results.as_ref()))
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of topic fetches issued so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_settled(&self) -> bool {
        self.topic.as_ref().is_some_and(Topic::is_settled)
    }

    pub(crate) fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    pub(crate) fn apply_topic(&mut self, topic: Topic) {
        self.error = None;
        self.topic = Some(topic);
    }

    pub(crate) fn apply_result(&mut self, result: ResultEnvelope) {
        self.result = Some(result);
    }

    pub(crate) fn apply_error(&mut self, message: String) {
        self.error = Some(message);
    }
}
