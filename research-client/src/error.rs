use thiserror::Error;

/// Errors raised while talking to the research backend or managing the session.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Backend returned {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("No topic data found for {0}")]
    MissingTopic(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Single line shown inline by a view when `action` fails.
    ///
    /// Backend rejections are reported against the action, transport problems
    /// as network errors, everything else by its own description.
    pub fn user_message(&self, action: &str) -> String {
        match self {
            ClientError::Status { status, reason } => {
                format!("{}: {} - {}", action, status, reason)
            }
            ClientError::Transport(details) => format!("Network error occurred: {}", details),
            ClientError::MissingTopic(_) => "No topic data found".to_string(),
            ClientError::Decode(details) => {
                format!("{}: unexpected response ({})", action, details)
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
