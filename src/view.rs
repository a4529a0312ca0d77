//! View model for the process list.
//!
//! Everything a supervisor sends back is untrusted text. It enters the view as
//! [`SafeText`], which neutralises terminal control sequences on construction, so
//! renderers cannot forget to escape.

use chrono::{DateTime, Utc};

use crate::format::{format_cpu, format_memory, format_uptime, NOT_AVAILABLE};
use crate::process::{ProcessAction, ProcessSummary};

pub const EMPTY_TITLE: &str = "No processes running";
pub const EMPTY_HINT: &str = "Start a new process to get started";

/// Text that is safe to write to a terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SafeText(String);

impl SafeText {
    pub fn escape(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len());
        for ch in raw.chars() {
            match ch {
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                ch if ch.is_control() => {
                    out.push_str(&ch.escape_unicode().to_string());
                }
                ch => out.push(ch),
            }
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SafeText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatusBadge {
    Running,
    Stopped,
}

impl StatusBadge {
    pub fn label(self) -> &'static str {
        match self {
            StatusBadge::Running => "Running",
            StatusBadge::Stopped => "Stopped",
        }
    }
}

/// Button offered on a row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RowAction {
    Start,
    Restart,
    Stop,
    Logs,
    Remove,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            RowAction::Start => "Start",
            RowAction::Restart => "Restart",
            RowAction::Stop => "Stop",
            RowAction::Logs => "Logs",
            RowAction::Remove => "Remove",
        }
    }

    /// Supervisor action triggered by the button, if any.
    pub fn process_action(self) -> Option<ProcessAction> {
        match self {
            RowAction::Start => Some(ProcessAction::Start),
            RowAction::Restart => Some(ProcessAction::Restart),
            RowAction::Stop => Some(ProcessAction::Stop),
            RowAction::Remove => Some(ProcessAction::Remove),
            RowAction::Logs => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRow {
    pub id: u64,
    pub name: SafeText,
    pub script: SafeText,
    pub status: StatusBadge,
    pub pid: String,
    pub uptime: String,
    pub cpu: String,
    pub memory: String,
    pub restarts: String,
    pub actions: Vec<RowAction>,
}

impl ProcessRow {
    pub fn from_summary(process: &ProcessSummary, now: DateTime<Utc>) -> Self {
        let status = if process.running {
            StatusBadge::Running
        } else {
            StatusBadge::Stopped
        };
        let uptime = match (process.running, process.started) {
            (true, Some(started)) => format_uptime(started, now),
            _ => NOT_AVAILABLE.to_string(),
        };
        let mut actions = if process.running {
            vec![RowAction::Restart, RowAction::Stop]
        } else {
            vec![RowAction::Start]
        };
        actions.extend([RowAction::Logs, RowAction::Remove]);

        Self {
            id: process.id,
            name: SafeText::escape(&process.name),
            script: SafeText::escape(&process.script),
            status,
            pid: process
                .live_pid()
                .map_or_else(|| NOT_AVAILABLE.to_string(), |pid| pid.to_string()),
            uptime,
            cpu: format_cpu(process.cpu_percent()),
            memory: format_memory(process.memory_rss()),
            restarts: process.restarts.to_string(),
            actions,
        }
    }

    pub fn offers(&self, action: RowAction) -> bool {
        self.actions.contains(&action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessListView {
    Empty,
    Rows(Vec<ProcessRow>),
}

impl ProcessListView {
    /// Rows keep the supervisor's ordering.
    pub fn build(processes: &[ProcessSummary], now: DateTime<Utc>) -> Self {
        if processes.is_empty() {
            return Self::Empty;
        }
        Self::Rows(
            processes
                .iter()
                .map(|process| ProcessRow::from_summary(process, now))
                .collect(),
        )
    }

    pub fn rows(&self) -> &[ProcessRow] {
        match self {
            Self::Empty => &[],
            Self::Rows(rows) => rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
