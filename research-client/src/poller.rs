//! TopicPoller – follows one topic until its research job settles, then fetches the result.
//!
//! Each round trip fetches the topic once and hands the fresh copy to the
//! [`TopicDetailView`]. While the topic is not settled the poller waits a fixed
//! interval and tries again; there is no backoff. Once settled (progress 100,
//! an error reported by the backend, or a terminal status) the final result is
//! fetched exactly once.
//!
//! ## Lifetime
//! The loop is bound to a [`CancellationToken`]. Cancel the token when the view
//! goes away and the poller returns [`PollOutcome::Cancelled`] without issuing
//! another request; an in-flight request is dropped.
//!
//! ```rust,ignore
//! let cancel = CancellationToken::new();
//! let mut view = TopicDetailView::new(topic_id);
//! let outcome = poller.run(&mut view, &cancel, &mut NoopObserver).await;
//! ```
//!
//! ## Failures
//! A failed topic fetch ends the loop with [`PollOutcome::Failed`] and the
//! message stored on the view. A failed result fetch is recorded on the view
//! but the outcome stays [`PollOutcome::Completed`], since the topic itself did
//! settle.

use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    api::ResearchApi,
    config::ClientConfig,
    detail::TopicDetailView,
    models::{ResultEnvelope, Topic},
};

/// How a poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The topic settled and the result fetch was attempted.
    Completed,
    /// A topic fetch failed; the view carries the message.
    Failed,
    /// The cancellation token fired.
    Cancelled,
    /// The configured attempt limit was reached before the topic settled.
    Exhausted,
}

/// Result of a single topic fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    Pending,
    Settled,
    Failed,
}

/// Receives progress as the poller observes it.
pub trait PollObserver: Send {
    fn on_topic(&mut self, topic: &Topic);

    fn on_result(&mut self, _result: &ResultEnvelope) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl PollObserver for NoopObserver {
    fn on_topic(&mut self, _topic: &Topic) {}
}

impl<F> PollObserver for F
where
    F: FnMut(&Topic) + Send,
{
    fn on_topic(&mut self, topic: &Topic) {
        self(topic)
    }
}

#[derive(Clone)]
pub struct TopicPoller {
    api: Arc<dyn ResearchApi>,
    interval: Duration,
    max_attempts: Option<u32>,
}

impl TopicPoller {
    pub fn new(api: Arc<dyn ResearchApi>, interval: Duration) -> Self {
        Self {
            api,
            interval,
            max_attempts: None,
        }
    }

    pub fn from_config(api: Arc<dyn ResearchApi>, config: &ClientConfig) -> Self {
        Self::new(api, config.poll_interval()).with_max_attempts(config.max_attempts)
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Fetch the topic once and update the view.
    pub async fn step(&self, view: &mut TopicDetailView) -> PollStep {
        view.record_attempt();
        let fetched = self.api.get_topic(view.topic_id()).await;
        match fetched {
            Ok(topic) => {
                debug!(
                    "Topic {} at {}% ({})",
                    topic.id, topic.progress, topic.status
                );
                let settled = topic.is_settled();
                view.apply_topic(topic);
                if settled {
                    PollStep::Settled
                } else {
                    PollStep::Pending
                }
            }
            Err(e) => {
                warn!("Failed to fetch topic {}: {}", view.topic_id(), e);
                view.apply_error(e.user_message("Failed to fetch research details"));
                PollStep::Failed
            }
        }
    }

    /// Fetch the final result once and store it on the view.
    pub async fn fetch_result(&self, view: &mut TopicDetailView) -> Option<ResultEnvelope> {
        let fetched = self.api.get_result(view.topic_id()).await;
        match fetched {
            Ok(result) => {
                info!("Fetched result for topic {} ({})", view.topic_id(), result.status);
                view.apply_result(result.clone());
                Some(result)
            }
            Err(e) => {
                warn!("Failed to fetch result for topic {}: {}", view.topic_id(), e);
                view.apply_error(e.user_message("Failed to fetch research result"));
                None
            }
        }
    }

    /// Poll until the topic settles, a fetch fails, the attempt limit is hit
    /// or `cancel` fires.
    pub async fn run(
        &self,
        view: &mut TopicDetailView,
        cancel: &CancellationToken,
        observer: &mut dyn PollObserver,
    ) -> PollOutcome {
        info!("Polling topic {} every {:?}", view.topic_id(), self.interval);

        loop {
            if cancel.is_cancelled() {
                return self.cancelled(view);
            }

            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                step = self.step(view) => Some(step),
            };
            let Some(step) = step else {
                return self.cancelled(view);
            };

            if step != PollStep::Failed
                && let Some(topic) = view.topic()
            {
                observer.on_topic(topic);
            }

            match step {
                PollStep::Failed => return PollOutcome::Failed,
                PollStep::Settled => {
                    let result = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        result = self.fetch_result(view) => Some(result),
                    };
                    let Some(result) = result else {
                        return self.cancelled(view);
                    };
                    if let Some(result) = &result {
                        observer.on_result(result);
                    }
                    info!(
                        "Topic {} settled after {} fetches",
                        view.topic_id(),
                        view.attempts()
                    );
                    return PollOutcome::Completed;
                }
                PollStep::Pending => {
                    if let Some(max) = self.max_attempts
                        && view.attempts() >= max
                    {
                        warn!(
                            "Giving up on topic {} after {} fetches",
                            view.topic_id(),
                            max
                        );
                        return PollOutcome::Exhausted;
                    }
                }
            }

            let waited = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                _ = tokio::time::sleep(self.interval) => true,
            };
            if !waited {
                return self.cancelled(view);
            }
        }
    }

    fn cancelled(&self, view: &TopicDetailView) -> PollOutcome {
        info!("Stopped polling topic {}", view.topic_id());
        PollOutcome::Cancelled
    }
}
