use std::time::Instant;

use anyhow::Result;
use tokio::time::sleep;
use tracing::warn;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::controller::log_viewer::{LogContent, LogViewer, NO_LOGS};
use crate::process::LogStream;
use crate::view::SafeText;

pub(crate) async fn run(config: &AppConfig, id: u64, stream: LogStream, follow: bool) -> Result<()> {
    let mut viewer = LogViewer::new(ApiClient::from_config(config), config.follow_interval);
    viewer.set_stream(stream).await;
    viewer.open(id, id.to_string()).await;

    let mut printed = match viewer.content() {
        LogContent::Lines(lines) => {
            print_lines(lines);
            lines.clone()
        }
        LogContent::Failed(message) => anyhow::bail!(load_failure(message)),
        LogContent::Loading => Vec::new(),
    };

    if follow {
        follow_logs(&mut viewer, &mut printed).await;
    }

    Ok(())
}

fn print_lines(lines: &[String]) {
    if lines.is_empty() {
        println!("{NO_LOGS}");
        return;
    }
    for line in lines {
        println!("{}", SafeText::escape(line));
    }
}

async fn follow_logs(viewer: &mut LogViewer<ApiClient>, printed: &mut Vec<String>) {
    println!("Following {} logs (Ctrl-C to stop)...", viewer.stream());
    viewer.toggle_follow(Instant::now()).await;
    let interval = viewer.follow_interval();

    loop {
        emit_appended(viewer, printed);
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = sleep(interval) => {}
        }
        viewer.tick(Instant::now()).await;
    }

    viewer.close();
}

fn emit_appended(viewer: &LogViewer<ApiClient>, printed: &mut Vec<String>) {
    match viewer.content() {
        LogContent::Lines(lines) => {
            for line in appended_lines(printed, lines) {
                println!("{}", SafeText::escape(line));
            }
            *printed = lines.clone();
        }
        LogContent::Failed(message) => warn!("{}", load_failure(message)),
        LogContent::Loading => {}
    }
}

/// Lines of `current` that were not part of `previous`.
///
/// The supervisor returns a bounded tail, so older lines may have scrolled off
/// the front; the longest suffix of `previous` that prefixes `current` is
/// treated as already printed.
fn appended_lines<'a>(previous: &[String], current: &'a [String]) -> &'a [String] {
    let max_overlap = previous.len().min(current.len());
    for overlap in (1..=max_overlap).rev() {
        if previous[previous.len() - overlap..] == current[..overlap] {
            return &current[overlap..];
        }
    }
    current
}

fn load_failure(message: &str) -> String {
    format!("Failed to load logs: {}", SafeText::escape(message))
}
