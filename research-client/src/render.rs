//! Plain-text rendering of topics, logs and results for terminal output.

use chrono::{DateTime, Local, Utc};
use std::fmt::Write;

use crate::{
    detail::TopicDetailView,
    list::TopicListView,
    models::{Article, LogEntry, ResultEnvelope, Topic},
};

const BAR_WIDTH: usize = 20;

fn local_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn local_date(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

fn tags(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|keyword| format!("[{}]", keyword))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_progress_bar(progress: u8) -> String {
    let progress = progress.min(100) as usize;
    let filled = progress * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        progress
    )
}

/// Compact summary used in the topic list.
pub fn render_topic_card(topic: &Topic) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  ({})", topic.topic, topic.id);
    let _ = writeln!(out, "  Status: {}", topic.status);
    let _ = writeln!(out, "  Progress: {}%", topic.progress);
    let _ = writeln!(out, "  Created: {}", local_date(&topic.created_at));
    if let Some(completed_at) = &topic.completed_at {
        let _ = writeln!(out, "  Completed: {}", local_date(completed_at));
    }
    out
}

/// Empty when nothing has been fetched yet or the list is empty.
pub fn render_topic_list(topics: Option<&[Topic]>) -> String {
    let Some(topics) = topics.filter(|topics| !topics.is_empty()) else {
        return String::new();
    };

    let mut out = String::from("Research Topics\n\n");
    for topic in topics {
        out.push_str(&render_topic_card(topic));
        out.push('\n');
    }
    out
}

pub fn render_topic_details(topic: &Topic) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", topic.topic);
    let _ = writeln!(out);
    let _ = writeln!(out, "Research Details");
    let _ = writeln!(out, "  Status: {}", topic.status);
    let _ = writeln!(out, "  Progress: {}", render_progress_bar(topic.progress));
    let _ = writeln!(out, "  Created: {}", local_time(&topic.created_at));
    if let Some(completed_at) = &topic.completed_at {
        let _ = writeln!(out, "  Completed: {}", local_time(completed_at));
    }
    if let Some(error) = topic.error_message() {
        let _ = writeln!(out, "  Error: {}", error);
    }
    out
}

pub fn render_logs(logs: Option<&[LogEntry]>) -> String {
    let Some(logs) = logs.filter(|logs| !logs.is_empty()) else {
        return String::new();
    };

    let mut out = String::from("Process Logs\n");
    for log in logs {
        match &log.created_at {
            Some(at) => {
                let _ = writeln!(out, "  - {} ({})", log.step, local_time(at));
            }
            None => {
                let _ = writeln!(out, "  - {}", log.step);
            }
        }
        if !log.message.is_empty() {
            let _ = writeln!(out, "    {}", log.message);
        }
        if let Some(meta) = log.meta.as_ref().filter(|meta| !meta.is_null()) {
            let pretty = serde_json::to_string_pretty(meta).unwrap_or_else(|_| meta.to_string());
            for line in pretty.lines() {
                let _ = writeln!(out, "      {}", line);
            }
        }
    }
    out
}

fn render_article(out: &mut String, index: usize, article: &Article) {
    let _ = writeln!(out, "  {}. {}", index + 1, article.title);
    if !article.url.is_empty() {
        let _ = writeln!(out, "     {}", article.url);
    }
    if !article.summary.is_empty() {
        let _ = writeln!(out, "     {}", article.summary);
    }
    if !article.keywords.is_empty() {
        let _ = writeln!(out, "     {}", tags(&article.keywords));
    }
}

/// Summary, keyword tags and linked articles. Empty without a result body.
pub fn render_result(envelope: Option<&ResultEnvelope>) -> String {
    let Some(result) = envelope.and_then(|envelope| envelope.result.as_ref()) else {
        return String::new();
    };

    let mut out = String::from("Research Results\n");
    if let Some(synthesis) = &result.final_synthesis {
        let _ = writeln!(out, "\nSummary");
        let _ = writeln!(out, "  {}", synthesis.overview);
        if !synthesis.keywords.is_empty() {
            let _ = writeln!(out, "  Keywords: {}", tags(&synthesis.keywords));
        }
    }
    if !result.articles.is_empty() {
        let _ = writeln!(out, "\nArticles");
        for (index, article) in result.articles.iter().enumerate() {
            render_article(&mut out, index, article);
        }
    }
    out
}

/// Everything the list view currently shows: error, notice and topics.
pub fn render_list_view(view: &TopicListView) -> String {
    let mut out = String::new();
    if let Some(error) = view.error() {
        let _ = writeln!(out, "Error: {}", error);
    }
    if let Some(notice) = view.notice() {
        let _ = writeln!(out, "Success! {}", notice.message);
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&render_topic_list(view.topics()));
    out
}

/// Full detail page, or the error when the topic never loaded.
pub fn render_detail_view(view: &TopicDetailView) -> String {
    let Some(topic) = view.topic() else {
        return format!("{}\n", view.error().unwrap_or("Research not found"));
    };

    let sections = [
        render_topic_details(topic),
        render_logs(topic.logs.as_deref()),
        render_result(view.result()),
    ];
    let mut out = sections
        .into_iter()
        .filter(|section| !section.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if let Some(error) = view.error() {
        let _ = writeln!(out, "\nError: {}", error);
    }
    out
}
