use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the supervisor's process list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessSummary {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub pid: Option<i64>,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub restarts: u64,
    #[serde(default)]
    pub stats: Option<ProcessStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProcessStats {
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory_usage: Option<MemoryUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MemoryUsage {
    #[serde(default)]
    pub rss: u64,
}

impl ProcessSummary {
    pub fn cpu_percent(&self) -> Option<f64> {
        self.stats.as_ref().and_then(|stats| stats.cpu_percent)
    }

    pub fn memory_rss(&self) -> Option<u64> {
        self.stats
            .as_ref()
            .and_then(|stats| stats.memory_usage.as_ref())
            .map(|memory| memory.rss)
    }

    /// Pid of a live process; zero and negative values count as absent.
    pub fn live_pid(&self) -> Option<i64> {
        self.pid.filter(|pid| *pid > 0)
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessAction {
    Start,
    Stop,
    Restart,
    Remove,
}

impl ProcessAction {
    pub fn is_destructive(self) -> bool {
        matches!(self, ProcessAction::Stop | ProcessAction::Remove)
    }

    /// Past participle used in success notifications.
    pub fn past_tense(self) -> &'static str {
        match self {
            ProcessAction::Start => "started",
            ProcessAction::Stop => "stopped",
            ProcessAction::Restart => "restarted",
            ProcessAction::Remove => "removed",
        }
    }
}

impl std::fmt::Display for ProcessAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            ProcessAction::Start => "start",
            ProcessAction::Stop => "stop",
            ProcessAction::Restart => "restart",
            ProcessAction::Remove => "remove",
        };
        write!(f, "{value}")
    }
}

/// Body of `POST /process/{id}/action`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionRequest {
    pub method: ProcessAction,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogStream {
    #[default]
    Out,
    Err,
}

impl LogStream {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStream::Out => "out",
            LogStream::Err => "err",
        }
    }

    pub fn next(self) -> Self {
        match self {
            LogStream::Out => LogStream::Err,
            LogStream::Err => LogStream::Out,
        }
    }
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of `GET /process/{id}/logs/{stream}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProcessLogs {
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Body of `POST /process/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewProcess {
    pub name: Option<String>,
    pub script: String,
    pub path: String,
    pub watch: Option<String>,
}
