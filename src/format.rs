//! Human-readable renderings of raw supervisor values.

use chrono::{DateTime, Utc};

pub const NOT_AVAILABLE: &str = "N/A";

/// Elapsed time since `started`, rendered in the coarsest unit that keeps the
/// number readable.
pub fn format_uptime(started: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(started).num_seconds().max(0);

    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3_600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3_600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

pub fn format_memory(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes.filter(|value| *value > 0) else {
        return NOT_AVAILABLE.to_string();
    };

    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        return format!("{kb:.0}K");
    }
    let mb = kb / 1024.0;
    if mb < 1024.0 {
        return format!("{mb:.1}M");
    }
    format!("{:.2}G", mb / 1024.0)
}

pub fn format_cpu(percent: Option<f64>) -> String {
    match percent {
        Some(value) if value.is_finite() => format!("{value:.1}%"),
        _ => NOT_AVAILABLE.to_string(),
    }
}
