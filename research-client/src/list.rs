use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{error, info};

use crate::{api::ResearchApi, detail::TopicDetailView, models::Topic};

/// Transient success message shown after a topic is created.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    shown_at: Instant,
    ttl: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < self.ttl
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible_at(Instant::now())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank input, nothing was sent.
    Skipped,
    Created { message: Option<String> },
    Failed,
}

/// Local state of the topic list: the last fetched topics, the inline error
/// and the current notice.
pub struct TopicListView {
    api: Arc<dyn ResearchApi>,
    topics: Option<Vec<Topic>>,
    error: Option<String>,
    notice: Option<Notice>,
    notice_ttl: Duration,
}

impl TopicListView {
    pub fn new(api: Arc<dyn ResearchApi>, notice_ttl: Duration) -> Self {
        Self {
            api,
            topics: None,
            error: None,
            notice: None,
            notice_ttl,
        }
    }

    /// Topics from the last successful fetch, `None` before the first one.
    pub fn topics(&self) -> Option<&[Topic]> {
        self.topics.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The notice, while it is still visible.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|notice| notice.is_visible())
    }

    pub fn find(&self, topic_id: &str) -> Option<&Topic> {
        self.topics()?.iter().find(|topic| topic.id == topic_id)
    }

    /// Detail view for one topic, seeded with the listed copy when there is one.
    pub fn open_topic(&self, topic_id: &str) -> TopicDetailView {
        let mut detail = TopicDetailView::new(topic_id);
        if let Some(topic) = self.find(topic_id) {
            detail.apply_topic(topic.clone());
        }
        detail
    }

    /// Most recently created topic with the given text.
    pub fn latest_matching(&self, text: &str) -> Option<&Topic> {
        let text = text.trim();
        self.topics()?
            .iter()
            .filter(|topic| topic.topic.trim() == text)
            .max_by_key(|topic| topic.created_at)
    }

    /// Re-fetch the list. Previous topics are kept when the fetch fails.
    pub async fn refresh(&mut self) -> bool {
        self.error = None;
        match self.api.list_topics().await {
            Ok(topics) => {
                info!("Fetched {} topics", topics.len());
                self.topics = Some(topics);
                true
            }
            Err(e) => {
                error!("Failed to fetch topics: {}", e);
                self.error = Some(e.user_message("Failed to fetch topics"));
                false
            }
        }
    }

    /// Queue a new topic. Whitespace-only input sends nothing.
    pub async fn submit(&mut self, topic: &str) -> SubmitOutcome {
        let topic = topic.trim();
        if topic.is_empty() {
            return SubmitOutcome::Skipped;
        }

        self.error = None;
        match self.api.create_topic(topic).await {
            Ok(response) => {
                info!("Created research topic '{}'", topic);
                if let Some(message) = &response.message {
                    self.notice = Some(Notice::new(message.clone(), self.notice_ttl));
                }
                self.refresh().await;
                SubmitOutcome::Created {
                    message: response.message,
                }
            }
            Err(e) => {
                error!("Failed to create topic '{}': {}", topic, e);
                self.error = Some(e.user_message("Failed to create topic"));
                SubmitOutcome::Failed
            }
        }
    }

    /// Delete a topic; it leaves the local list only once the backend agrees.
    pub async fn delete(&mut self, topic_id: &str) -> bool {
        self.error = None;
        match self.api.delete_topic(topic_id).await {
            Ok(()) => {
                info!("Deleted topic {}", topic_id);
                if let Some(topics) = self.topics.as_mut() {
                    topics.retain(|topic| topic.id != topic_id);
                }
                true
            }
            Err(e) => {
                error!("Failed to delete topic {}: {}", topic_id, e);
                self.error = Some(e.user_message("Failed to delete topic"));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedApi, topic};
    use std::sync::atomic::Ordering;

    fn view(api: &Arc<ScriptedApi>) -> TopicListView {
        TopicListView::new(api.clone(), Duration::from_secs(3))
    }

    #[tokio::test]
    async fn test_blank_submit_sends_nothing() {
        let api = Arc::new(ScriptedApi::default());
        let mut list = view(&api);

        assert_eq!(list.submit("   \t ").await, SubmitOutcome::Skipped);
        assert_eq!(list.submit("").await, SubmitOutcome::Skipped);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_creates_once_and_refreshes() {
        let api = Arc::new(ScriptedApi::with_topics(vec![topic("t-1", 0)]));
        *api.create_message.lock().unwrap() = Some("Research queued".to_string());
        let mut list = view(&api);

        let outcome = list.submit("  graphene  ").await;

        assert_eq!(
            outcome,
            SubmitOutcome::Created {
                message: Some("Research queued".to_string())
            }
        );
        assert_eq!(api.calls(), vec!["create:graphene", "list"]);
        assert_eq!(list.notice().unwrap().message, "Research queued");
        assert_eq!(list.topics().unwrap().len(), 1);
        assert!(list.error().is_none());
    }

    #[tokio::test]
    async fn test_submit_failure_shows_error_without_refresh() {
        let api = Arc::new(ScriptedApi::default());
        api.fail_create.store(true, Ordering::SeqCst);
        let mut list = view(&api);

        assert_eq!(list.submit("graphene").await, SubmitOutcome::Failed);
        assert_eq!(api.calls(), vec!["create:graphene"]);
        assert!(list.error().unwrap().starts_with("Network error occurred"));
        assert!(list.notice().is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_only_on_success() {
        let api = Arc::new(ScriptedApi::with_topics(vec![topic("t-1", 0), topic("t-2", 50)]));
        let mut list = view(&api);
        assert!(list.refresh().await);

        api.fail_delete.store(true, Ordering::SeqCst);
        assert!(!list.delete("t-1").await);
        assert_eq!(list.topics().unwrap().len(), 2);
        assert_eq!(
            list.error(),
            Some("Failed to delete topic: 500 - Internal Server Error")
        );

        api.fail_delete.store(false, Ordering::SeqCst);
        assert!(list.delete("t-1").await);
        assert!(list.error().is_none());
        let remaining: Vec<&str> = list.topics().unwrap().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(remaining, vec!["t-2"]);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_topics() {
        let api = Arc::new(ScriptedApi::with_topics(vec![topic("t-1", 10)]));
        let mut list = view(&api);
        assert!(list.refresh().await);

        api.fail_list.store(true, Ordering::SeqCst);
        assert!(!list.refresh().await);
        assert_eq!(list.topics().unwrap().len(), 1);
        assert!(list.error().unwrap().starts_with("Failed to fetch topics"));
    }

    #[tokio::test]
    async fn test_latest_matching_picks_newest() {
        let mut older = topic("t-1", 100);
        older.topic = "graphene".to_string();
        let mut newer = topic("t-2", 0);
        newer.topic = "graphene".to_string();
        newer.created_at = older.created_at + chrono::Duration::minutes(5);

        let api = Arc::new(ScriptedApi::with_topics(vec![older, newer]));
        let mut list = view(&api);
        list.refresh().await;

        assert_eq!(list.latest_matching(" graphene ").unwrap().id, "t-2");
        assert!(list.latest_matching("perovskite").is_none());
    }

    #[tokio::test]
    async fn test_open_topic_seeds_listed_copy() {
        let api = Arc::new(ScriptedApi::with_topics(vec![topic("t-1", 40)]));
        let mut list = view(&api);

        let unknown = list.open_topic("t-1");
        assert_eq!(unknown.topic_id(), "t-1");
        assert!(unknown.topic().is_none());

        list.refresh().await;
        let opened = list.open_topic("t-1");
        assert_eq!(opened.topic().unwrap().progress, 40);
        assert_eq!(opened.attempts(), 0);
        assert!(list.open_topic("t-9").topic().is_none());
        assert_eq!(api.calls(), vec!["list"]);
    }

    #[test]
    fn test_notice_expires() {
        let notice = Notice::new("done", Duration::from_secs(3));
        assert!(notice.is_visible());
        assert!(!notice.is_visible_at(Instant::now() + Duration::from_secs(4)));
    }
}
