use std::time::{Duration, Instant};

use tracing::debug;

use crate::api::Supervisor;
use crate::process::LogStream;
use crate::ticker::PollTimer;
use crate::view::SafeText;

pub const NO_LOGS: &str = "No logs available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogContent {
    #[default]
    Loading,
    Lines(Vec<String>),
    Failed(String),
}

impl LogContent {
    /// Lines as they should appear in the viewer, escaped for the terminal.
    pub fn display_lines(&self) -> Vec<SafeText> {
        match self {
            LogContent::Loading => vec![SafeText::escape("Loading...")],
            LogContent::Lines(lines) if lines.is_empty() => vec![SafeText::escape(NO_LOGS)],
            LogContent::Lines(lines) => lines.iter().map(|line| SafeText::escape(line)).collect(),
            LogContent::Failed(message) => {
                vec![SafeText::escape(&format!("Failed to load logs: {message}"))]
            }
        }
    }
}

/// Modal log viewer for a single process.
///
/// Follow mode is a 2 second poll owned by the viewer; closing the viewer always
/// cancels it.
#[derive(Debug)]
pub struct LogViewer<S> {
    api: S,
    target: Option<LogTarget>,
    stream: LogStream,
    content: LogContent,
    follow: PollTimer,
    scroll_from_bottom: usize,
}

impl<S: Supervisor> LogViewer<S> {
    pub fn new(api: S, follow_interval: Duration) -> Self {
        Self {
            api,
            target: None,
            stream: LogStream::default(),
            content: LogContent::default(),
            follow: PollTimer::new(follow_interval),
            scroll_from_bottom: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn stream(&self) -> LogStream {
        self.stream
    }

    pub fn content(&self) -> &LogContent {
        &self.content
    }

    pub fn title(&self) -> String {
        match self.target.as_ref() {
            Some(target) => format!("Logs: {}", SafeText::escape(&target.name)),
            None => "Logs".to_string(),
        }
    }

    pub fn is_following(&self) -> bool {
        self.follow.is_active()
    }

    pub fn follow_label(&self) -> &'static str {
        if self.is_following() {
            "Stop Following"
        } else {
            "Follow Logs"
        }
    }

    pub fn follow_interval(&self) -> Duration {
        self.follow.period()
    }

    #[cfg(test)]
    pub fn active_timers(&self) -> usize {
        usize::from(self.follow.is_active())
    }

    pub fn scroll_from_bottom(&self) -> usize {
        self.scroll_from_bottom
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let max = match &self.content {
            LogContent::Lines(items) => items.len().saturating_sub(1),
            _ => 0,
        };
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines).min(max);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }

    /// Points the viewer at a process and loads its logs once.
    pub async fn open(&mut self, id: u64, name: impl Into<String>) {
        self.target = Some(LogTarget {
            id,
            name: name.into(),
        });
        self.content = LogContent::Loading;
        self.refresh_now().await;
    }

    pub async fn set_stream(&mut self, stream: LogStream) {
        self.stream = stream;
        self.refresh_now().await;
    }

    /// Re-fetches the current target and jumps to the newest line.
    pub async fn refresh_now(&mut self) {
        let Some(target) = self.target.as_ref() else {
            return;
        };

        self.content = match self.api.process_logs(target.id, self.stream).await {
            Ok(result) => LogContent::Lines(result.logs),
            Err(err) => {
                debug!("loading {} logs of process {} failed: {err}", self.stream, target.id);
                LogContent::Failed(err.to_string())
            }
        };
        self.scroll_from_bottom = 0;
    }

    /// Starts or cancels follow mode. Starting also fetches right away.
    /// Does nothing while the viewer is closed.
    pub async fn toggle_follow(&mut self, now: Instant) {
        if !self.is_open() {
            return;
        }

        if self.follow.stop() {
            return;
        }
        self.follow.start(now);
        self.refresh_now().await;
    }

    /// Fetches when the follow timer fires; returns whether it did.
    pub async fn tick(&mut self, now: Instant) -> bool {
        if self.is_open() && self.follow.fire_if_due(now) {
            self.refresh_now().await;
            true
        } else {
            false
        }
    }

    pub fn close(&mut self) {
        self.follow.stop();
        self.target = None;
        self.content = LogContent::Loading;
        self.scroll_from_bottom = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{LogContent, LogViewer, NO_LOGS};
    use crate::controller::fake::{process, FakeSupervisor};
    use crate::process::LogStream;

    fn viewer(fake: &FakeSupervisor) -> LogViewer<&FakeSupervisor> {
        LogViewer::new(fake, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn open_fetches_once_for_current_stream() {
        let fake = FakeSupervisor::with_processes(vec![process(3, "api", true)]);
        *fake.logs.borrow_mut() = vec!["booting".to_string(), "ready".to_string()];
        let mut logs = viewer(&fake);

        logs.open(3, "api").await;
        assert!(logs.is_open());
        assert_eq!(logs.title(), "Logs: api");
        assert_eq!(fake.calls(), vec!["logs 3 out"]);
        assert_eq!(
            logs.content(),
            &LogContent::Lines(vec!["booting".to_string(), "ready".to_string()])
        );
    }

    #[tokio::test]
    async fn switching_stream_refetches() {
        let fake = FakeSupervisor::default();
        let mut logs = viewer(&fake);
        logs.open(1, "worker").await;
        logs.set_stream(LogStream::Err).await;

        assert_eq!(fake.calls(), vec!["logs 1 out", "logs 1 err"]);
        let lines = logs.content().display_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].as_str(), NO_LOGS);
    }

    #[tokio::test]
    async fn fetch_failure_is_shown_inline() {
        let fake = FakeSupervisor::default();
        let mut logs = viewer(&fake);
        fake.fail_next(500);

        logs.open(1, "worker").await;
        let lines = logs.content().display_lines();
        assert!(lines[0]
            .as_str()
            .starts_with("Failed to load logs: HTTP error! status: 500"));
        assert!(logs.is_open());
    }

    #[tokio::test]
    async fn toggling_follow_twice_leaves_no_timer() {
        let fake = FakeSupervisor::default();
        let mut logs = viewer(&fake);
        let now = Instant::now();
        logs.open(2, "db").await;

        logs.toggle_follow(now).await;
        assert!(logs.is_following());
        assert_eq!(logs.follow_label(), "Stop Following");
        assert_eq!(logs.active_timers(), 1);

        logs.toggle_follow(now).await;
        assert!(!logs.is_following());
        assert_eq!(logs.follow_label(), "Follow Logs");
        assert_eq!(logs.active_timers(), 0);
    }

    #[tokio::test]
    async fn follow_polls_every_two_seconds() {
        let fake = FakeSupervisor::default();
        let mut logs = viewer(&fake);
        let now = Instant::now();
        logs.open(2, "db").await;
        logs.toggle_follow(now).await;

        assert!(!logs.tick(now + Duration::from_secs(1)).await);
        assert!(logs.tick(now + Duration::from_secs(2)).await);
        assert!(logs.tick(now + Duration::from_secs(4)).await);
        assert_eq!(fake.calls().len(), 4, "open + toggle + two ticks");
    }

    #[tokio::test]
    async fn close_while_following_cancels_timer() {
        let fake = FakeSupervisor::default();
        let mut logs = viewer(&fake);
        let now = Instant::now();
        logs.open(2, "db").await;
        logs.toggle_follow(now).await;

        logs.close();
        assert!(!logs.is_open());
        assert_eq!(logs.active_timers(), 0);
        assert!(!logs.tick(now + Duration::from_secs(10)).await);
    }

    #[tokio::test]
    async fn follow_is_ignored_while_closed() {
        let fake = FakeSupervisor::default();
        let mut logs = viewer(&fake);
        logs.toggle_follow(Instant::now()).await;
        assert_eq!(logs.active_timers(), 0);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn refresh_pins_view_to_newest_line() {
        let fake = FakeSupervisor::default();
        *fake.logs.borrow_mut() = (0..50).map(|idx| format!("line {idx}")).collect();
        let mut logs = viewer(&fake);
        logs.open(1, "noisy").await;

        logs.scroll_up(10);
        assert_eq!(logs.scroll_from_bottom(), 10);
        logs.scroll_up(1_000);
        assert_eq!(logs.scroll_from_bottom(), 49);

        logs.refresh_now().await;
        assert_eq!(logs.scroll_from_bottom(), 0);
    }

    #[tokio::test]
    async fn log_lines_are_escaped() {
        let fake = FakeSupervisor::default();
        *fake.logs.borrow_mut() = vec!["\x1b[31mred\x1b[0m".to_string()];
        let mut logs = viewer(&fake);
        logs.open(1, "color").await;

        let lines = logs.content().display_lines();
        assert!(!lines[0].as_str().contains('\x1b'));
    }
}
