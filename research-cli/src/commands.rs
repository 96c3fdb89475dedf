use anyhow::{Context, Result, anyhow, bail};
use research_client::{
    CancellationToken, ClientConfig, FileSessionStore, HttpResearchApi, PollOutcome, ResearchApi,
    SubmitOutcome, TopicDetailView, TopicListView, TopicPoller, load_or_create_session,
    render::{render_detail_view, render_list_view},
    reset_session,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{Commands, progress::ProgressLine};

pub async fn run(command: Commands, config: ClientConfig) -> Result<()> {
    match command {
        Commands::List => list(&config).await,
        Commands::Submit { topic, watch } => submit(&config, &topic.join(" "), watch).await,
        Commands::Delete { id } => delete(&config, &id).await,
        Commands::Show { id } => show(&config, &id).await,
        Commands::Session { reset } => session(&config, reset).await,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("session file: {}", config.session_file_path().display());
            Ok(())
        }
    }
}

async fn connect(config: &ClientConfig) -> Result<Arc<dyn ResearchApi>> {
    let store = FileSessionStore::new(config.session_file_path());
    let session = load_or_create_session(&store)
        .await
        .with_context(|| format!("failed to load session from {}", store.path().display()))?;
    let api = HttpResearchApi::new(config, session)?;
    info!("Using backend {}", config.base_url);
    Ok(Arc::new(api))
}

fn print_list(view: &TopicListView) {
    print!("{}", render_list_view(view));
    if view.topics().is_some_and(|topics| topics.is_empty()) {
        println!("No research topics yet.");
    }
}

async fn list(config: &ClientConfig) -> Result<()> {
    let api = connect(config).await?;
    let mut view = TopicListView::new(api, config.notice_ttl());

    view.refresh().await;
    print_list(&view);
    match view.error() {
        Some(error) => bail!("{}", error),
        None => Ok(()),
    }
}

async fn submit(config: &ClientConfig, topic: &str, watch: bool) -> Result<()> {
    let api = connect(config).await?;
    let mut view = TopicListView::new(api.clone(), config.notice_ttl());

    match view.submit(topic).await {
        SubmitOutcome::Skipped => bail!("topic must not be empty"),
        SubmitOutcome::Failed => {
            bail!("{}", view.error().unwrap_or("failed to create topic"))
        }
        SubmitOutcome::Created { .. } => print_list(&view),
    }

    if !watch {
        return Ok(());
    }
    let topic_id = view
        .latest_matching(topic)
        .map(|created| created.id.clone())
        .ok_or_else(|| anyhow!("submitted topic '{}' not found in the refreshed list", topic))?;
    follow(api, config, view.open_topic(&topic_id)).await
}

async fn show(config: &ClientConfig, topic_id: &str) -> Result<()> {
    let api = connect(config).await?;
    let mut list = TopicListView::new(api.clone(), config.notice_ttl());

    // polling fetches the topic even when the list is unavailable
    if !list.refresh().await {
        warn!("Opening {} without the topic list: {}", topic_id, list.error().unwrap_or(""));
    }
    follow(api, config, list.open_topic(topic_id)).await
}

async fn delete(config: &ClientConfig, topic_id: &str) -> Result<()> {
    let api = connect(config).await?;
    let mut view = TopicListView::new(api, config.notice_ttl());

    view.refresh().await;
    if !view.delete(topic_id).await {
        bail!("{}", view.error().unwrap_or("failed to delete topic"));
    }
    println!("Deleted {}", topic_id);
    print_list(&view);
    Ok(())
}

async fn follow(
    api: Arc<dyn ResearchApi>,
    config: &ClientConfig,
    mut view: TopicDetailView,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let poller = TopicPoller::from_config(api, config);
    let mut progress = ProgressLine::new();
    let outcome = poller.run(&mut view, &cancel, &mut progress).await;
    ctrl_c.abort();
    progress.finish();

    print!("{}", render_detail_view(&view));
    match outcome {
        PollOutcome::Completed => Ok(()),
        PollOutcome::Cancelled => {
            eprintln!("Stopped following {}", view.topic_id());
            Ok(())
        }
        PollOutcome::Exhausted => bail!(
            "topic {} still running after {} checks",
            view.topic_id(),
            view.attempts()
        ),
        PollOutcome::Failed => bail!(
            "{}",
            view.error().unwrap_or("failed to fetch research details")
        ),
    }
}

async fn session(config: &ClientConfig, reset: bool) -> Result<()> {
    let store = FileSessionStore::new(config.session_file_path());
    let session = if reset {
        reset_session(&store).await?
    } else {
        load_or_create_session(&store).await?
    };
    println!("{}", session);
    Ok(())
}
