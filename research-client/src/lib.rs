pub mod api;
pub mod config;
pub mod detail;
pub mod error;
pub mod list;
pub mod models;
pub mod poller;
pub mod render;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use api::{HttpResearchApi, ResearchApi, USER_HEADER};
pub use config::{ClientConfig, TopicEndpoint};
pub use detail::TopicDetailView;
pub use error::{ClientError, Result};
pub use list::{Notice, SubmitOutcome, TopicListView};
pub use models::{
    Article, FinalSynthesis, LogEntry, ResearchResult, ResultEnvelope, Topic, TopicStatus,
};
pub use poller::{NoopObserver, PollObserver, PollOutcome, PollStep, TopicPoller};
pub use session::{
    FileSessionStore, InMemorySessionStore, SESSION_KEY, SessionId, SessionStore,
    load_or_create_session, reset_session,
};
pub use tokio_util::sync::CancellationToken;
