use std::io::{self, BufRead, Write};

use anyhow::Result;
use chrono::Utc;

use crate::api::{ApiClient, Supervisor};
use crate::config::AppConfig;
use crate::controller::process_list::ProcessListController;
use crate::controller::Confirm;
use crate::toast::ToastKind;
use crate::ui::{style_status_cell, style_toast, table_border, table_header};
use crate::view::{ProcessListView, SafeText, EMPTY_HINT, EMPTY_TITLE};

pub(crate) fn list_controller(config: &AppConfig) -> ProcessListController<ApiClient> {
    ProcessListController::new(
        ApiClient::from_config(config),
        config.refresh_interval,
        config.default_path.clone(),
    )
}

/// Prints pending toasts and turns pending alerts into the command's error.
pub(crate) fn report<S: Supervisor>(controller: &mut ProcessListController<S>) -> Result<()> {
    let notices = controller.notices_mut();
    for toast in notices.toasts_mut().drain() {
        if toast.kind != ToastKind::Error {
            let message = SafeText::escape(&toast.message).to_string();
            println!("{}", style_toast(&message, toast.kind));
        }
    }

    let alerts: Vec<String> = notices
        .take_alerts()
        .iter()
        .map(|alert| SafeText::escape(alert).to_string())
        .collect();
    if alerts.is_empty() {
        Ok(())
    } else {
        anyhow::bail!(alerts.join("\n"))
    }
}

pub(crate) fn print_snapshot(controller: &ProcessListController<ApiClient>) {
    print_process_table(&controller.render(Utc::now()));
}

/// Asks on the terminal; anything but `y`/`yes` declines.
#[derive(Debug, Default)]
pub(crate) struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(_) => false,
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

const HEADERS: [&str; 9] = [
    "ID", "NAME", "SCRIPT", "STATUS", "PID", "UPTIME", "CPU", "MEMORY", "RESTARTS",
];
const STATUS_COL: usize = 3;

fn print_process_table(view: &ProcessListView) {
    print!("{}", process_table(view));
}

fn process_table(view: &ProcessListView) -> String {
    if view.is_empty() {
        return format!("{EMPTY_TITLE}\n{EMPTY_HINT}\n");
    }

    let rows: Vec<[String; 9]> = view
        .rows()
        .iter()
        .map(|row| {
            [
                row.id.to_string(),
                row.name.to_string(),
                row.script.to_string(),
                row.status.label().to_string(),
                row.pid.clone(),
                row.uptime.clone(),
                row.cpu.clone(),
                row.memory.clone(),
                row.restarts.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let border = border_line(&widths);
    out.push_str(&border);
    out.push_str(&table_line(
        &HEADERS.map(|header| header.to_string()),
        &widths,
        |_, cell| table_header(cell),
    ));
    out.push_str(&border);
    for (row, view_row) in rows.iter().zip(view.rows()) {
        out.push_str(&table_line(row, &widths, |idx, cell| {
            if idx == STATUS_COL {
                style_status_cell(cell, view_row.status)
            } else {
                cell.to_string()
            }
        }));
    }
    out.push_str(&border);
    out
}

fn border_line(widths: &[usize; 9]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&format!("-{}-+", "-".repeat(*width)));
    }
    format!("{}\n", table_border(&line))
}

fn table_line(
    cells: &[String; 9],
    widths: &[usize; 9],
    style: impl Fn(usize, &str) -> String,
) -> String {
    let mut line = String::from("|");
    for (idx, cell) in cells.iter().enumerate() {
        let padding = widths[idx].saturating_sub(cell.chars().count());
        let padded = format!("{cell}{}", " ".repeat(padding));
        line.push_str(&format!(" {} |", style(idx, &padded)));
    }
    line.push('\n');
    line
}
