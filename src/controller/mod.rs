//! State machines behind the CLI commands and the dashboard.

pub mod detail;
pub mod log_viewer;
pub mod process_list;

use std::collections::VecDeque;
use std::time::Duration;

use crate::toast::ToastQueue;

/// How long a toast stays on the dashboard.
pub const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Guard consulted before a destructive action is sent.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirmer used once the user already agreed (`--yes`, dialog answered).
#[derive(Debug, Default, Copy, Clone)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// User-facing feedback: toasts for everything, plus a blocking alert for errors.
#[derive(Debug, Default)]
pub struct Notices {
    toasts: ToastQueue,
    alerts: VecDeque<String>,
}

impl Notices {
    pub fn success(&mut self, message: impl Into<String>) {
        self.toasts.success(message, Some(TOAST_DURATION));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.toasts.info(message, Some(TOAST_DURATION));
    }

    /// Repeats of the newest pending alert only raise a toast.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.toasts.error(message.clone(), Some(TOAST_DURATION));
        if self.alerts.back() != Some(&message) {
            self.alerts.push_back(message);
        }
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    /// Oldest alert the user has not acknowledged yet.
    pub fn alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn acknowledge_alert(&mut self) {
        self.alerts.pop_front();
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        self.alerts.drain(..).collect()
    }
}
