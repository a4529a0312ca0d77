//! Transient notifications shown by the dashboard and echoed by CLI commands.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static NEXT_TOAST_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

impl std::fmt::Display for ToastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
        };
        write!(f, "{value}")
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: String,
    pub message: String,
    pub kind: ToastKind,
    pub duration: Option<Duration>,
    shown_at: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.duration
            .map(|duration| now.saturating_duration_since(self.shown_at) >= duration)
            .unwrap_or(false)
    }
}

/// Insertion-ordered toast list. The queue never schedules anything itself:
/// whoever owns the event loop calls [`ToastQueue::prune_expired`].
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
}

impl ToastQueue {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: impl Into<String>, kind: ToastKind, duration: Option<Duration>) {
        self.show_at(message, kind, duration, Instant::now());
    }

    pub fn show_at(
        &mut self,
        message: impl Into<String>,
        kind: ToastKind,
        duration: Option<Duration>,
        now: Instant,
    ) {
        let seq = NEXT_TOAST_ID.fetch_add(1, Ordering::Relaxed) + 1;
        self.toasts.push(Toast {
            id: format!("toast-{seq}"),
            message: message.into(),
            kind,
            duration,
            shown_at: now,
        });
    }

    pub fn success(&mut self, message: impl Into<String>, duration: Option<Duration>) {
        self.show(message, ToastKind::Success, duration);
    }

    pub fn error(&mut self, message: impl Into<String>, duration: Option<Duration>) {
        self.show(message, ToastKind::Error, duration);
    }

    pub fn info(&mut self, message: impl Into<String>, duration: Option<Duration>) {
        self.show(message, ToastKind::Info, duration);
    }

    /// Removes the toast with `id`; unknown ids are ignored.
    pub fn close(&mut self, id: &str) {
        self.toasts.retain(|toast| toast.id != id);
    }

    pub fn prune_expired(&mut self, now: Instant) {
        self.toasts.retain(|toast| !toast.is_expired(now));
    }

    #[cfg(test)]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }
}
