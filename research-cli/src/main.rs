mod commands;
mod progress;

use clap::{Parser, Subcommand};
use research_client::{ClientConfig, TopicEndpoint};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "research",
    author,
    version,
    about = "Submit research topics and follow their background jobs",
    long_about = None
)]
pub struct Cli {
    /// Backend base URL (defaults to RESEARCH_BACKEND_BASE_URL or http://localhost:4000)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Single-topic endpoint shape: `path` (/research/{id}) or `query` (/research/topic?topic_id=)
    #[arg(long, global = true)]
    topic_endpoint: Option<TopicEndpoint>,

    /// Delay between progress checks in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Stop following a topic after this many checks
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// File holding the session identifier
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all research topics of this session
    List,
    /// Submit a new research topic
    Submit {
        /// The topic text; several words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
        /// Follow the new topic until it finishes
        #[arg(long)]
        watch: bool,
    },
    /// Delete a topic
    Delete { id: String },
    /// Follow a topic until it finishes, then print its logs and result
    Show { id: String },
    /// Print the session identifier, creating it if needed
    Session {
        /// Discard the stored identifier and create a new one
        #[arg(long)]
        reset: bool,
    },
    /// Print the effective configuration
    Config,
}

impl Cli {
    fn config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(endpoint) = self.topic_endpoint {
            config.topic_endpoint = endpoint;
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
        if self.max_attempts.is_some() {
            config.max_attempts = self.max_attempts;
        }
        if let Some(path) = &self.session_file {
            config.session_file = Some(path.clone());
        }
        Ok(config)
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_cli=info,research_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config()?;

    commands::run(cli.command, config).await
}
