use std::cmp::min;
use std::io::{stdout, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use crossterm::cursor;
use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};

use crate::api::{ApiClient, Supervisor};
use crate::config::AppConfig;
use crate::controller::detail::{DetailState, ProcessDetail};
use crate::controller::log_viewer::LogViewer;
use crate::controller::process_list::{confirmation_prompt, CreateField, ProcessListController};
use crate::controller::AssumeYes;
use crate::process::ProcessAction;
use crate::router::Router;
use crate::ui::{paint, status_code, toast_code};
use crate::view::{ProcessRow, RowAction, SafeText, EMPTY_HINT, EMPTY_TITLE};

const INPUT_POLL: Duration = Duration::from_millis(90);
const MIN_WIDTH: usize = 80;
const MIN_HEIGHT: usize = 20;
const FRAME: &str = "1;36";

pub(crate) async fn run(config: &AppConfig, interval_ms: Option<u64>) -> Result<()> {
    let refresh_interval = interval_ms
        .map(Duration::from_millis)
        .unwrap_or(config.refresh_interval);
    let mut session = Session::new(ApiClient::from_config(config), config, refresh_interval);
    let _guard = TerminalGuard::enter()?;

    session.boot(Instant::now()).await;
    let mut needs_full_clear = true;

    while !session.should_exit {
        session.pump(Instant::now()).await;
        draw_frame(&session, needs_full_clear)?;
        needs_full_clear = false;

        if event::poll(INPUT_POLL).context("failed polling terminal input")? {
            match event::read().context("failed reading terminal input")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    needs_full_clear = session.handle_key(key).await;
                }
                Event::Mouse(mouse) => session.handle_mouse(mouse),
                Event::FocusLost => session.processes.suspend(),
                Event::FocusGained => session.regain_focus(Instant::now()).await,
                Event::Resize(_, _) => needs_full_clear = true,
                _ => {}
            }
        }
    }

    session.teardown();
    Ok(())
}

/// Everything the dashboard owns; dropping it cancels all timers.
struct Session<S> {
    processes: ProcessListController<S>,
    logs: LogViewer<S>,
    router: Router,
    detail: ProcessDetail<S>,
    selected: usize,
    modal: Modal,
    create_field: CreateField,
    should_exit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modal {
    None,
    Menu(MenuChoice),
    Confirm { id: u64, action: ProcessAction },
    Create,
    Rename { id: u64, input: String },
    Logs,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
enum MenuChoice {
    #[default]
    Resume,
    Quit,
}

impl<S: Supervisor + Clone> Session<S> {
    fn new(api: S, config: &AppConfig, refresh_interval: Duration) -> Self {
        let router = Router::from_url(&config.page_url);
        let detail = ProcessDetail::new(api.clone(), router.mount());
        Self {
            processes: ProcessListController::new(
                api.clone(),
                refresh_interval,
                config.default_path.clone(),
            ),
            logs: LogViewer::new(api, config.follow_interval),
            router,
            detail,
            selected: 0,
            modal: Modal::None,
            create_field: CreateField::default(),
            should_exit: false,
        }
    }

    async fn boot(&mut self, now: Instant) {
        self.processes.refresh().await;
        self.processes.start_auto_refresh(now);
        self.clamp_selection();
    }

    /// Fires due timers, follows fragment changes and expires toasts.
    /// Polling waits while an alert is up so an outage raises it once.
    async fn pump(&mut self, now: Instant) {
        if self.processes.notices().alert().is_none() {
            if self.processes.tick(now).await {
                self.after_change().await;
            }
            self.logs.tick(now).await;
        }
        self.detail.sync().await;
        self.processes
            .notices_mut()
            .toasts_mut()
            .prune_expired(now);
    }

    async fn regain_focus(&mut self, now: Instant) {
        if self.processes.refresh().await {
            self.after_change().await;
        }
        self.processes.resume(now);
    }

    /// Keeps the selection and the detail pane in step with a new snapshot.
    async fn after_change(&mut self) {
        self.clamp_selection();
        self.detail.reload().await;
    }

    fn teardown(&mut self) {
        self.logs.close();
        self.processes.stop_auto_refresh();
    }

    fn clamp_selection(&mut self) {
        let len = self.processes.snapshot().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn selected_row(&self) -> Option<ProcessRow> {
        self.processes
            .snapshot()
            .get(self.selected)
            .map(|process| ProcessRow::from_summary(process, Utc::now()))
    }

    /// Returns whether the next frame needs a full clear.
    async fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_exit = true;
            return false;
        }

        if self.processes.notices().alert().is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.processes.notices_mut().acknowledge_alert();
                return true;
            }
            return false;
        }

        match self.modal.clone() {
            Modal::None => self.handle_table_key(key).await,
            Modal::Menu(choice) => self.handle_menu_key(key, choice),
            Modal::Confirm { id, action } => self.handle_confirm_key(key, id, action).await,
            Modal::Create => self.handle_create_key(key).await,
            Modal::Rename { id, input } => self.handle_rename_key(key, id, input).await,
            Modal::Logs => self.handle_logs_key(key).await,
        }
    }

    /// Wheel scrolling moves the selection, or the log view while it is open.
    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let up = match mouse.kind {
            MouseEventKind::ScrollUp => true,
            MouseEventKind::ScrollDown => false,
            _ => return,
        };
        match self.modal {
            Modal::Logs if up => self.logs.scroll_up(3),
            Modal::Logs => self.logs.scroll_down(3),
            Modal::None if up => self.selected = self.selected.saturating_sub(1),
            Modal::None => {
                if self.selected + 1 < self.processes.snapshot().len() {
                    self.selected += 1;
                }
            }
            _ => {}
        }
    }

    async fn handle_table_key(&mut self, key: KeyEvent) -> bool {
        let row = self.selected_row();
        match key.code {
            KeyCode::Char('q') => self.should_exit = true,
            KeyCode::Esc => {
                self.modal = Modal::Menu(MenuChoice::Resume);
                return true;
            }
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.processes.snapshot().len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('g') => {
                self.processes.refresh().await;
                self.after_change().await;
            }
            KeyCode::Enter => {
                if let Some(row) = row {
                    self.router.navigate(&row.id.to_string());
                }
            }
            KeyCode::Backspace => self.router.clear(),
            KeyCode::Char('c') => {
                let latest = self
                    .processes
                    .notices()
                    .toasts()
                    .latest()
                    .map(|toast| toast.id.clone());
                if let Some(id) = latest {
                    self.processes.notices_mut().toasts_mut().close(&id);
                }
            }
            KeyCode::Char('n') => {
                self.processes.open_create_form();
                self.create_field = CreateField::default();
                self.modal = Modal::Create;
                return true;
            }
            KeyCode::Char(ch) => {
                let Some(row) = row else {
                    return false;
                };
                return self.handle_row_key(ch, row).await;
            }
            _ => {}
        }
        false
    }

    async fn handle_row_key(&mut self, ch: char, row: ProcessRow) -> bool {
        let action = match ch {
            's' => RowAction::Start,
            'r' => RowAction::Restart,
            'x' => RowAction::Stop,
            'd' => RowAction::Remove,
            'l' => RowAction::Logs,
            'R' => {
                self.modal = Modal::Rename {
                    id: row.id,
                    input: self
                        .processes
                        .process(row.id)
                        .map(|process| process.name.clone())
                        .unwrap_or_default(),
                };
                return true;
            }
            _ => return false,
        };
        if !row.offers(action) {
            return false;
        }

        match action.process_action() {
            Some(action) if action.is_destructive() => {
                self.modal = Modal::Confirm { id: row.id, action };
                true
            }
            Some(action) => {
                let done = match action {
                    ProcessAction::Restart => self.processes.restart(row.id).await,
                    _ => self.processes.start(row.id).await,
                };
                if done {
                    self.after_change().await;
                }
                false
            }
            None => {
                let name = self
                    .processes
                    .process(row.id)
                    .map(|process| process.name.clone())
                    .unwrap_or_else(|| row.id.to_string());
                self.logs.open(row.id, name).await;
                self.modal = Modal::Logs;
                true
            }
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent, choice: MenuChoice) -> bool {
        match key.code {
            KeyCode::Esc => {
                self.modal = Modal::None;
                return true;
            }
            KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
                self.modal = Modal::Menu(MenuChoice::Resume);
            }
            KeyCode::Right
            | KeyCode::Down
            | KeyCode::Tab
            | KeyCode::Char('l')
            | KeyCode::Char('j') => {
                self.modal = Modal::Menu(MenuChoice::Quit);
            }
            KeyCode::Enter => match choice {
                MenuChoice::Resume => {
                    self.modal = Modal::None;
                    return true;
                }
                MenuChoice::Quit => self.should_exit = true,
            },
            KeyCode::Char('q') => self.should_exit = true,
            _ => {}
        }
        false
    }

    async fn handle_confirm_key(&mut self, key: KeyEvent, id: u64, action: ProcessAction) -> bool {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.modal = Modal::None;
                let done = match action {
                    ProcessAction::Remove => self.processes.remove(id, &mut AssumeYes).await,
                    _ => self.processes.stop(id, &mut AssumeYes).await,
                };
                if done {
                    self.after_change().await;
                }
                true
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.modal = Modal::None;
                true
            }
            _ => false,
        }
    }

    async fn handle_create_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => {
                self.processes.cancel_create();
                self.modal = Modal::None;
                return true;
            }
            KeyCode::Tab | KeyCode::Down => self.create_field = self.create_field.next(),
            KeyCode::BackTab | KeyCode::Up => self.create_field = self.create_field.previous(),
            KeyCode::Enter => {
                if self.processes.submit_create().await {
                    self.modal = Modal::None;
                    self.after_change().await;
                    return true;
                }
            }
            KeyCode::Backspace => {
                if let Some(form) = self.processes.create_form_mut() {
                    form.field_mut(self.create_field).pop();
                }
            }
            KeyCode::Char(ch) => {
                if let Some(form) = self.processes.create_form_mut() {
                    form.field_mut(self.create_field).push(ch);
                }
            }
            _ => {}
        }
        false
    }

    async fn handle_rename_key(&mut self, key: KeyEvent, id: u64, mut input: String) -> bool {
        match key.code {
            KeyCode::Esc => {
                self.modal = Modal::None;
                return true;
            }
            KeyCode::Enter => {
                self.modal = Modal::None;
                if self.processes.rename(id, &input).await {
                    self.after_change().await;
                }
                return true;
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(ch) => input.push(ch),
            _ => return false,
        }
        self.modal = Modal::Rename { id, input };
        false
    }

    async fn handle_logs_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.logs.close();
                self.modal = Modal::None;
                return true;
            }
            KeyCode::Char('f') => {
                self.logs.toggle_follow(Instant::now()).await;
                let message = if self.logs.is_following() {
                    "Following logs"
                } else {
                    "Stopped following logs"
                };
                self.processes.notices_mut().info(message);
            }
            KeyCode::Char('r') => self.logs.refresh_now().await,
            KeyCode::Char('t') => {
                let next = self.logs.stream().next();
                self.logs.set_stream(next).await;
            }
            KeyCode::Up | KeyCode::Char('k') => self.logs.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.logs.scroll_down(1),
            KeyCode::PageUp => self.logs.scroll_up(10),
            KeyCode::PageDown => self.logs.scroll_down(10),
            _ => {}
        }
        false
    }
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed enabling raw mode")?;
        let mut out = stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture,
            EnableFocusChange
        )
            .context("failed entering alternate screen")?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut out = stdout();
        let _ = execute!(
            out,
            DisableFocusChange,
            DisableMouseCapture,
            cursor::Show,
            LeaveAlternateScreen
        );
    }
}

fn draw_frame<S: Supervisor>(session: &Session<S>, clear_all: bool) -> Result<()> {
    let (width, height) = terminal::size().context("failed reading terminal size")?;
    let lines = render_lines(session, width as usize, height as usize);

    let mut frame = Vec::<u8>::new();
    for line in &lines {
        frame.extend_from_slice(line.as_bytes());
        frame.extend_from_slice(b"\r\n");
    }

    let mut out = stdout();
    execute!(out, cursor::MoveTo(0, 0)).context("failed moving cursor")?;
    if clear_all {
        execute!(out, Clear(ClearType::All)).context("failed clearing terminal frame")?;
    }
    out.write_all(&frame)
        .context("failed writing terminal dashboard frame")?;
    execute!(out, Clear(ClearType::FromCursorDown)).context("failed clearing trailing area")?;
    out.flush().context("failed flushing terminal frame")?;
    Ok(())
}

/// Builds the whole screen; the last `height` lines never scroll.
fn render_lines<S: Supervisor>(session: &Session<S>, width: usize, height: usize) -> Vec<String> {
    if width < MIN_WIDTH || height < MIN_HEIGHT {
        return vec![paint(
            "Terminal too small for pmconsole ui. Resize to at least 80x20.",
            "1;31",
        )];
    }

    let mut lines = Vec::with_capacity(height);
    let route = session.router.fragment();
    let title = format!(
        " PMCONSOLE  │  {}  │ refresh {} │ #{} │ Esc menu · q quit · n new · Enter details ",
        Local::now().format("%H:%M:%S"),
        refresh_label(&session.processes),
        if route.is_empty() { "-" } else { route.as_str() },
    );
    lines.push(paint(&frame_line("╔", "╗", width, '═'), FRAME));
    lines.push(paint(&frame_content_line(&title, width), FRAME));
    lines.push(paint(&frame_line("╠", "╣", width, '═'), FRAME));
    lines.push(frame_content_line(&toast_line(session), width));
    lines.push(paint(&frame_line("╠", "╣", width, '═'), FRAME));

    // Trailing rows: two separators, footer, bottom border, plus one spare so the
    // final "\r\n" never scrolls the screen.
    let body_height = height.saturating_sub(lines.len() + 5 + DETAIL_LINES);
    let body = match &session.modal {
        Modal::Logs => log_lines(session, body_height),
        Modal::Create => create_form_lines(session, body_height),
        _ => table_lines(session, body_height),
    };
    for line in body {
        lines.push(frame_content_line(&line, width));
    }

    lines.push(paint(&frame_line("╠", "╣", width, '═'), FRAME));
    for line in detail_lines(session) {
        lines.push(frame_content_line(&line, width));
    }
    lines.push(paint(&frame_line("╠", "╣", width, '═'), FRAME));
    lines.push(frame_content_line(&footer_line(session), width));
    lines.push(paint(&frame_line("╚", "╝", width, '═'), FRAME));

    if let Some(message) = session.processes.notices().alert() {
        overlay_dialog(
            &mut lines,
            width,
            " ERROR ",
            &alert_body(message),
            "1;31",
        );
    } else {
        match &session.modal {
            Modal::Menu(choice) => {
                let buttons = match choice {
                    MenuChoice::Resume => {
                        format!("{}    [Quit]", paint(" Resume ", "1;30;42"))
                    }
                    MenuChoice::Quit => {
                        format!("[Resume]    {}", paint(" Quit ", "1;37;41"))
                    }
                };
                overlay_dialog(
                    &mut lines,
                    width,
                    " MENU ",
                    &["Arrows/Tab + Enter".to_string(), String::new(), buttons],
                    "1;34",
                );
            }
            Modal::Confirm { action, .. } => overlay_dialog(
                &mut lines,
                width,
                " CONFIRM ",
                &[
                    confirmation_prompt(*action),
                    String::new(),
                    "[y] yes    [n] no".to_string(),
                ],
                "1;33",
            ),
            Modal::Rename { input, .. } => overlay_dialog(
                &mut lines,
                width,
                " RENAME ",
                &[
                    format!("New name: {}▏", SafeText::escape(input)),
                    String::new(),
                    "Enter save · Esc cancel".to_string(),
                ],
                "1;34",
            ),
            _ => {}
        }
    }

    lines.truncate(height);
    lines
}

const DETAIL_LINES: usize = 3;

fn alert_body(message: &str) -> [String; 3] {
    [
        SafeText::escape(message).to_string(),
        String::new(),
        "Enter to dismiss".to_string(),
    ]
}

fn refresh_label<S: Supervisor>(processes: &ProcessListController<S>) -> String {
    if processes.is_auto_refreshing() {
        let left = processes
            .next_refresh_due()
            .map(|due| due.saturating_duration_since(Instant::now()).as_secs())
            .unwrap_or(0);
        format!("in {left}s")
    } else {
        "paused".to_string()
    }
}

fn toast_line<S: Supervisor>(session: &Session<S>) -> String {
    match session.processes.notices().toasts().latest() {
        Some(toast) => paint(
            &format!(" {}", SafeText::escape(&toast.message)),
            toast_code(toast.kind),
        ),
        None => " ".to_string(),
    }
}

fn footer_line<S: Supervisor>(session: &Session<S>) -> String {
    match &session.modal {
        Modal::Logs => format!(
            " f {} · t stream · r refresh · ↑/↓ scroll · Esc close ",
            session.logs.follow_label().to_lowercase()
        ),
        Modal::Create => " Tab next field · Enter create · Esc cancel ".to_string(),
        _ => " s start · r restart · x stop · d remove · l logs · R rename · g refresh · c dismiss "
            .to_string(),
    }
}

const COLUMNS: [(&str, usize); 9] = [
    ("ID", 4),
    ("NAME", 16),
    ("SCRIPT", 20),
    ("STATUS", 8),
    ("PID", 7),
    ("UPTIME", 11),
    ("CPU", 6),
    ("MEMORY", 9),
    ("RST", 4),
];

fn table_lines<S: Supervisor>(session: &Session<S>, height: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(height);
    let header = COLUMNS
        .iter()
        .map(|(name, width)| pad(name, *width))
        .collect::<Vec<_>>()
        .join(" │ ");
    lines.push(paint(&format!(" {header}"), "1;36"));

    let view = session.processes.render(Utc::now());
    let visible = height.saturating_sub(1).max(1);
    if view.is_empty() {
        if session.processes.has_loaded() {
            lines.push(format!(" {EMPTY_TITLE}"));
            lines.push(paint(&format!(" {EMPTY_HINT}"), "2;37"));
        } else {
            lines.push(" Loading...".to_string());
        }
    } else {
        let start = if session.selected >= visible {
            session.selected + 1 - visible
        } else {
            0
        };
        let end = min(view.rows().len(), start + visible);
        for (idx, row) in view.rows().iter().enumerate().take(end).skip(start) {
            lines.push(table_row(row, idx == session.selected));
        }
    }

    lines.resize(height, String::new());
    lines
}

fn table_row(row: &ProcessRow, selected: bool) -> String {
    let cells = [
        pad(&row.id.to_string(), COLUMNS[0].1),
        pad(&truncate(row.name.as_str(), COLUMNS[1].1), COLUMNS[1].1),
        pad(&truncate(row.script.as_str(), COLUMNS[2].1), COLUMNS[2].1),
        paint(&pad(row.status.label(), COLUMNS[3].1), status_code(row.status)),
        pad(&row.pid, COLUMNS[4].1),
        pad(&row.uptime, COLUMNS[5].1),
        pad(&row.cpu, COLUMNS[6].1),
        pad(&row.memory, COLUMNS[7].1),
        pad(&row.restarts, COLUMNS[8].1),
    ];
    let mark = if selected { "▸" } else { " " };
    let line = format!("{mark}{}", cells.join(" │ "));
    if selected {
        paint(&line, "48;5;236")
    } else {
        line
    }
}

fn log_lines<S: Supervisor>(session: &Session<S>, height: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(height);
    lines.push(paint(
        &format!(
            " {}  [{}]{}",
            session.logs.title(),
            session.logs.stream(),
            if session.logs.is_following() {
                "  following"
            } else {
                ""
            }
        ),
        "1;37",
    ));

    let content = session.logs.content().display_lines();
    let visible = height.saturating_sub(1);
    let end = content
        .len()
        .saturating_sub(session.logs.scroll_from_bottom());
    let start = end.saturating_sub(visible);
    for line in &content[start..end] {
        lines.push(format!(" {line}"));
    }

    lines.resize(height, String::new());
    lines
}

fn create_form_lines<S: Supervisor>(session: &Session<S>, height: usize) -> Vec<String> {
    let mut lines = vec![paint(" New process", "1;37"), String::new()];
    if let Some(form) = session.processes.create_form() {
        for field in CreateField::ALL {
            let value = form.field(field);
            let shown = if value.is_empty() && field == CreateField::Path {
                paint(session.processes.default_path(), "2;37")
            } else {
                SafeText::escape(value).to_string()
            };
            let cursor = if field == session.create_field { "▏" } else { "" };
            let label = format!("{:>8}: ", field.label());
            let label = if field == session.create_field {
                paint(&label, "1;36")
            } else {
                label
            };
            lines.push(format!(" {label}{shown}{cursor}"));
        }
    }
    lines.resize(height, String::new());
    lines
}

fn detail_lines<S: Supervisor>(session: &Session<S>) -> Vec<String> {
    let mut lines = match session.detail.state() {
        DetailState::Hidden => vec![paint(" Enter on a row shows its details", "2;37")],
        DetailState::Failed(message) => vec![paint(
            &format!(
                " Failed to load details of #{}: {}",
                SafeText::escape(session.detail.selected().unwrap_or("-")),
                SafeText::escape(message)
            ),
            "1;31",
        )],
        DetailState::Loaded(process) => {
            let row = ProcessRow::from_summary(process, Utc::now());
            let started = process
                .started
                .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "N/A".to_string());
            vec![
                paint(
                    &format!(" Selected: {} (id {})  {}", row.name, row.id, row.status.label()),
                    "1;37",
                ),
                format!(
                    " Script: {}  │  Actions: {}",
                    row.script,
                    row.actions
                        .iter()
                        .map(|action| action.label())
                        .collect::<Vec<_>>()
                        .join(" · ")
                ),
                format!(
                    " PID {}  •  Started {}  •  Uptime {}  •  CPU {}  •  Memory {}  •  Restarts {}",
                    row.pid, started, row.uptime, row.cpu, row.memory, row.restarts
                ),
            ]
        }
    };
    lines.resize(DETAIL_LINES, String::new());
    lines
}

/// Replaces the middle of `lines` with a centred box.
fn overlay_dialog(lines: &mut [String], width: usize, title: &str, body: &[String], code: &str) {
    let inner = body
        .iter()
        .map(|line| visible_len(line))
        .chain([visible_len(title), 30])
        .max()
        .unwrap_or(30)
        .min(width.saturating_sub(8))
        + 2;
    let margin = (width.saturating_sub(inner + 2)) / 2;
    let mut dialog = Vec::with_capacity(body.len() + 2);
    dialog.push(paint(&format!("╔{}╗", centered_fill(title, inner, '═')), code));
    for line in body {
        let clipped = truncate_visible_ansi(line, inner.saturating_sub(2));
        let padding = inner.saturating_sub(visible_len(&clipped) + 1);
        dialog.push(format!(
            "{} {clipped}{}{}",
            paint("║", code),
            " ".repeat(padding),
            paint("║", code)
        ));
    }
    dialog.push(paint(&format!("╚{}╝", "═".repeat(inner)), code));

    let top = lines.len().saturating_sub(dialog.len()) / 2;
    for (offset, row) in dialog.into_iter().enumerate() {
        if let Some(line) = lines.get_mut(top + offset) {
            *line = format!("{}{row}", " ".repeat(margin));
        }
    }
}

fn centered_fill(text: &str, width: usize, fill: char) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }
    let left = (width - len) / 2;
    let right = width - len - left;
    format!(
        "{}{text}{}",
        fill.to_string().repeat(left),
        fill.to_string().repeat(right)
    )
}

fn frame_line(left: &str, right: &str, width: usize, fill: char) -> String {
    format!(
        "{left}{}{right}",
        fill.to_string().repeat(width.saturating_sub(2))
    )
}

fn frame_content_line(content: &str, width: usize) -> String {
    let inner = width.saturating_sub(2);
    let clipped = if visible_len(content) > inner {
        truncate_visible_ansi(content, inner)
    } else {
        content.to_string()
    };
    let padding = inner.saturating_sub(visible_len(&clipped));
    format!("║{clipped}{}║", " ".repeat(padding))
}

/// Printable width, skipping CSI sequences.
fn visible_len(value: &str) -> usize {
    let mut len = 0usize;
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }
        len += 1;
    }
    len
}

fn truncate_visible_ansi(value: &str, max_visible: usize) -> String {
    let mut out = String::new();
    let mut visible = 0usize;
    let mut saw_escape = false;
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            saw_escape = true;
            out.push(ch);
            if chars.peek() == Some(&'[') {
                out.push('[');
                chars.next();
                for next in chars.by_ref() {
                    out.push(next);
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            continue;
        }
        if visible >= max_visible {
            break;
        }
        out.push(ch);
        visible += 1;
    }

    if saw_escape {
        out.push_str("\x1b[0m");
    }
    out
}

fn truncate(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }
    if max_len <= 1 {
        return "…".to_string();
    }
    let mut output: String = value.chars().take(max_len - 1).collect();
    output.push('…');
    output
}

fn pad(value: &str, width: usize) -> String {
    let current = visible_len(value);
    if current >= width {
        value.to_string()
    } else {
        format!("{value}{}", " ".repeat(width - current))
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crossterm::event::{KeyCode, KeyEvent};

    use super::{
        alert_body, centered_fill, detail_lines, frame_content_line, overlay_dialog, pad,
        truncate, truncate_visible_ansi, visible_len, Modal, Session,
    };
    use crate::config::AppConfig;
    use crate::controller::detail::DetailState;
    use crate::controller::fake::{process, FakeSupervisor};
    use crate::process::ProcessAction;

    const REFRESH: Duration = Duration::from_secs(5);

    fn session<'a>(fake: &'a FakeSupervisor, page_url: &str) -> Session<&'a FakeSupervisor> {
        let config = AppConfig::from_parts(page_url, None, REFRESH, "/srv".to_string())
            .expect("expected config to build");
        Session::new(fake, &config, REFRESH)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    #[tokio::test]
    async fn outage_raises_one_alert_until_acknowledged() {
        let fake = FakeSupervisor::default();
        for _ in 0..130 {
            fake.fail_next(503);
        }
        let mut session = session(&fake, "http://127.0.0.1:9876/app");
        let start = Instant::now();

        session.boot(start).await;
        for n in 1..=120u32 {
            session.pump(start + REFRESH * n).await;
        }
        assert_eq!(fake.calls(), vec!["list".to_string()]);
        assert!(session.processes.notices().alert().is_some());

        assert!(session.handle_key(key(KeyCode::Enter)).await);
        assert!(session.processes.notices().alert().is_none());
        session.pump(start + REFRESH * 121).await;
        assert_eq!(fake.calls().len(), 2);
        assert_eq!(session.processes.notices_mut().take_alerts().len(), 1);
    }

    #[tokio::test]
    async fn stopping_the_shown_process_reloads_its_details() {
        let fake = FakeSupervisor::with_processes(vec![process(1, "api", true)]);
        let mut session = session(&fake, "http://127.0.0.1:9876/app#1");
        let start = Instant::now();

        session.boot(start).await;
        session.pump(start).await;
        assert!(matches!(session.detail.state(), DetailState::Loaded(p) if p.running));

        session.modal = Modal::Confirm { id: 1, action: ProcessAction::Stop };
        assert!(session.handle_key(key(KeyCode::Char('y'))).await);
        assert_eq!(session.modal, Modal::None);
        assert!(matches!(session.detail.state(), DetailState::Loaded(p) if !p.running));
        assert!(detail_lines(&session)[0].contains("Stopped"));
    }

    #[tokio::test]
    async fn auto_refresh_reloads_details() {
        let fake = FakeSupervisor::with_processes(vec![process(1, "api", true)]);
        let mut session = session(&fake, "http://127.0.0.1:9876/app#1");
        let start = Instant::now();

        session.boot(start).await;
        session.pump(start).await;
        fake.processes.borrow_mut()[0].restarts = 4;

        session.pump(start + REFRESH).await;
        assert!(matches!(session.detail.state(), DetailState::Loaded(p) if p.restarts == 4));
    }

    #[tokio::test]
    async fn failed_details_name_the_selection() {
        let fake = FakeSupervisor::default();
        let mut session = session(&fake, "http://127.0.0.1:9876/app#42");

        session.pump(Instant::now()).await;
        let line = &detail_lines(&session)[0];
        assert!(line.contains("Failed to load details of #42"));
        assert!(line.contains("status: 404"));
    }

    #[test]
    fn alert_body_neutralises_control_sequences() {
        let body = alert_body("Failed to load processes: \x1b[2J\x1b]0;pwned\x07");
        assert!(body.iter().all(|line| !line.contains('\x1b') && !line.contains('\x07')));
        assert!(body[0].starts_with("Failed to load processes: "));
        assert_eq!(body[2], "Enter to dismiss");
    }

    #[test]
    fn visible_len_ignores_ansi_sequences() {
        assert_eq!(visible_len("\x1b[1;32mRunning\x1b[0m"), 7);
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("supervisor", 6), "super…");
        assert_eq!(truncate("api", 6), "api");
    }

    #[test]
    fn pad_counts_printable_width_only() {
        let padded = pad("\x1b[1mid\x1b[0m", 4);
        assert_eq!(visible_len(&padded), 4);
    }

    #[test]
    fn content_line_fills_frame_width() {
        let line = frame_content_line(" hello ", 20);
        assert_eq!(visible_len(&line), 20);
        let long = frame_content_line(&"x".repeat(50), 20);
        assert_eq!(visible_len(&long), 20);
    }

    #[test]
    fn truncated_ansi_text_is_reset() {
        let clipped = truncate_visible_ansi("\x1b[31mabcdef\x1b[0m", 3);
        assert_eq!(visible_len(&clipped), 3);
        assert!(clipped.ends_with("\x1b[0m"));
    }

    #[test]
    fn dialog_lands_in_the_middle() {
        let mut lines = vec![String::new(); 11];
        overlay_dialog(&mut lines, 80, " CONFIRM ", &["Sure?".to_string()], "1;33");
        assert!(lines[4].contains("CONFIRM"));
        assert!(lines[5].contains("Sure?"));
        assert!(lines[0].is_empty());
    }

    #[test]
    fn centered_fill_balances_both_sides() {
        assert_eq!(centered_fill("ab", 6, '='), "==ab==");
    }
}
