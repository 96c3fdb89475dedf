use research_client::{PollObserver, ResultEnvelope, Topic, render::render_progress_bar};
use std::io::{IsTerminal, Write};

/// Single self-overwriting status line on stderr while a topic is followed.
pub struct ProgressLine {
    interactive: bool,
    drawn: bool,
    last_progress: Option<u8>,
}

impl ProgressLine {
    pub fn new() -> Self {
        Self {
            interactive: std::io::stderr().is_terminal(),
            drawn: false,
            last_progress: None,
        }
    }

    /// Move past the status line so later output starts on a fresh line.
    pub fn finish(&mut self) {
        if self.drawn && self.interactive {
            eprintln!();
        }
        self.drawn = false;
    }
}

impl PollObserver for ProgressLine {
    fn on_topic(&mut self, topic: &Topic) {
        let line = format!("{} {}", render_progress_bar(topic.progress), topic.status);
        if self.interactive {
            eprint!("\r{:<40}", line);
            let _ = std::io::stderr().flush();
            self.drawn = true;
        } else if self.last_progress != Some(topic.progress) {
            // non-terminal: one line per change
            eprintln!("{}", line);
        }
        self.last_progress = Some(topic.progress);
    }

    fn on_result(&mut self, result: &ResultEnvelope) {
        self.finish();
        if !result.is_success() {
            eprintln!("Result status: {}", result.status);
        }
    }
}
