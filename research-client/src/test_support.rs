use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crate::{
    api::ResearchApi,
    error::{ClientError, Result},
    models::{
        CreateTopicResponse, FinalSynthesis, ResearchResult, ResultEnvelope, Topic, TopicStatus,
    },
};

pub(crate) fn topic(id: &str, progress: u8) -> Topic {
    let status = match progress {
        0 => TopicStatus::Queued,
        100 => TopicStatus::Succeeded,
        _ => TopicStatus::Running,
    };
    Topic {
        id: id.to_string(),
        topic: format!("topic {}", id),
        status,
        progress,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
        completed_at: None,
        error: None,
        logs: None,
        results: None,
    }
}

pub(crate) fn rejected() -> ClientError {
    ClientError::Status {
        status: 500,
        reason: "Internal Server Error".to_string(),
    }
}

/// In-process backend that answers from a script and records every call.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    pub topics: Mutex<Vec<Topic>>,
    /// Replies to `get_topic`, consumed in order; the last one repeats.
    pub topic_replies: Mutex<VecDeque<std::result::Result<Topic, String>>>,
    /// Delay before each `get_topic` reply, as a slow backend would.
    pub topic_delay: Mutex<Option<Duration>>,
    pub create_message: Mutex<Option<String>>,
    pub fail_list: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_result: AtomicBool,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn with_topics(topics: Vec<Topic>) -> Self {
        let api = Self::default();
        *api.topics.lock().unwrap() = topics;
        api
    }

    pub fn with_topic_replies(replies: Vec<std::result::Result<Topic, String>>) -> Self {
        let api = Self::default();
        *api.topic_replies.lock().unwrap() = replies.into();
        api
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ResearchApi for ScriptedApi {
    async fn list_topics(&self) -> Result<Vec<Topic>> {
        self.record("list".to_string());
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(rejected());
        }
        Ok(self.topics.lock().unwrap().clone())
    }

    async fn create_topic(&self, topic: &str) -> Result<CreateTopicResponse> {
        self.record(format!("create:{}", topic));
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("connection reset".to_string()));
        }
        Ok(CreateTopicResponse {
            message: self.create_message.lock().unwrap().clone(),
        })
    }

    async fn delete_topic(&self, topic_id: &str) -> Result<()> {
        self.record(format!("delete:{}", topic_id));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(rejected());
        }
        self.topics.lock().unwrap().retain(|t| t.id != topic_id);
        Ok(())
    }

    async fn get_topic(&self, topic_id: &str) -> Result<Topic> {
        self.record(format!("topic:{}", topic_id));
        let delay = *self.topic_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut replies = self.topic_replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        match reply {
            Some(Ok(topic)) => Ok(topic),
            Some(Err(message)) => Err(ClientError::Transport(message)),
            None => Err(ClientError::MissingTopic(topic_id.to_string())),
        }
    }

    async fn get_result(&self, topic_id: &str) -> Result<ResultEnvelope> {
        self.record(format!("result:{}", topic_id));
        if self.fail_result.load(Ordering::SeqCst) {
            return Err(rejected());
        }
        Ok(ResultEnvelope {
            status: "success".to_string(),
            result: Some(ResearchResult {
                final_synthesis: Some(FinalSynthesis {
                    overview: format!("overview of {}", topic_id),
                    keywords: vec!["alpha".to_string()],
                }),
                articles: Vec::new(),
            }),
        })
    }
}
