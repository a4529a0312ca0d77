//! Terminal styling helpers shared by the CLI tables and the dashboard.

use std::io::{self, IsTerminal};
use std::sync::OnceLock;

use crate::toast::ToastKind;
use crate::view::StatusBadge;

fn colors_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        if std::env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if std::env::var("TERM")
            .map(|term| term.eq_ignore_ascii_case("dumb"))
            .unwrap_or(false)
        {
            return false;
        }

        io::stdout().is_terminal()
    })
}

/// Wraps `value` in an SGR sequence when stdout is a colour terminal.
pub fn paint(value: &str, code: &str) -> String {
    if colors_enabled() {
        format!("\x1b[{code}m{value}\x1b[0m")
    } else {
        value.to_string()
    }
}

pub fn table_header(value: &str) -> String {
    paint(value, "1;36")
}

pub fn table_border(value: &str) -> String {
    paint(value, "2;34")
}

pub fn status_code(status: StatusBadge) -> &'static str {
    match status {
        StatusBadge::Running => "1;32",
        StatusBadge::Stopped => "2;37",
    }
}

/// Colours an already padded status cell.
pub fn style_status_cell(padded: &str, status: StatusBadge) -> String {
    paint(padded, status_code(status))
}

pub fn toast_code(kind: ToastKind) -> &'static str {
    match kind {
        ToastKind::Success => "1;32",
        ToastKind::Error => "1;31",
        ToastKind::Info => "1;34",
    }
}

pub fn style_toast(message: &str, kind: ToastKind) -> String {
    paint(message, toast_code(kind))
}
