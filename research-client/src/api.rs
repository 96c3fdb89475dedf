use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url, header::CONTENT_TYPE};
use tracing::{debug, warn};

use crate::{
    config::{ClientConfig, TopicEndpoint},
    error::{ClientError, Result},
    models::{
        CreateTopicRequest, CreateTopicResponse, ResultEnvelope, Topic, TopicResponse,
        TopicsResponse,
    },
    session::SessionId,
};

/// Header carrying the session identifier on every request.
pub const USER_HEADER: &str = "user";

/// Operations offered by the research backend
#[async_trait]
pub trait ResearchApi: Send + Sync {
    /// All topics belonging to the current session.
    async fn list_topics(&self) -> Result<Vec<Topic>>;

    /// Queue a new research job.
    async fn create_topic(&self, topic: &str) -> Result<CreateTopicResponse>;

    async fn delete_topic(&self, topic_id: &str) -> Result<()>;

    async fn get_topic(&self, topic_id: &str) -> Result<Topic>;

    /// Final result of a settled topic.
    async fn get_result(&self, topic_id: &str) -> Result<ResultEnvelope>;
}

/// `ResearchApi` over HTTP using reqwest.
#[derive(Clone)]
pub struct HttpResearchApi {
    client: reqwest::Client,
    base_url: Url,
    session: SessionId,
    topic_endpoint: TopicEndpoint,
}

impl HttpResearchApi {
    pub fn new(config: &ClientConfig, session: SessionId) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ClientError::Config(format!("invalid backend url '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "backend url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            session,
            topic_endpoint: config.topic_endpoint,
        })
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // checked in new(): the base url always accepts path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn topic_url(&self, topic_id: &str) -> Url {
        match self.topic_endpoint {
            TopicEndpoint::Path => self.url(&["research", topic_id]),
            TopicEndpoint::Query => {
                let mut url = self.url(&["research", "topic"]);
                url.query_pairs_mut().append_pair("topic_id", topic_id);
                url
            }
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_HEADER, self.session.as_str())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        debug!("{} {}", status, response.url());

        if !status.is_success() {
            warn!("Backend rejected {} with {}", response.url(), status);
            return Err(ClientError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ResearchApi for HttpResearchApi {
    async fn list_topics(&self) -> Result<Vec<Topic>> {
        let builder = self.request(Method::GET, self.url(&["research"]));
        let body: TopicsResponse = self.send(builder).await?.json().await?;
        Ok(body.topics)
    }

    async fn create_topic(&self, topic: &str) -> Result<CreateTopicResponse> {
        let builder = self
            .request(Method::POST, self.url(&["research"]))
            .json(&CreateTopicRequest { topic });
        let response = self.send(builder).await?;

        // a bare 2xx with no JSON body still counts as created
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(CreateTopicResponse::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn delete_topic(&self, topic_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, self.url(&["research", topic_id]));
        self.send(builder).await?;
        Ok(())
    }

    async fn get_topic(&self, topic_id: &str) -> Result<Topic> {
        let builder = self.request(Method::GET, self.topic_url(topic_id));
        let body: TopicResponse = self.send(builder).await?.json().await?;
        body.topic
            .ok_or_else(|| ClientError::MissingTopic(topic_id.to_string()))
    }

    async fn get_result(&self, topic_id: &str) -> Result<ResultEnvelope> {
        let mut url = self.url(&["research", "result"]);
        url.query_pairs_mut().append_pair("topic_id", topic_id);
        let builder = self.request(Method::GET, url);
        Ok(self.send(builder).await?.json().await?)
    }
}
