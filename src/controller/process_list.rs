use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::Supervisor;
use crate::process::{NewProcess, ProcessAction, ProcessSummary};
use crate::ticker::PollTimer;
use crate::view::ProcessListView;

use super::{Confirm, Notices};

/// Fields of the "new process" form, kept verbatim while the form is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateForm {
    pub name: String,
    pub script: String,
    pub path: String,
    pub watch: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CreateField {
    Name,
    #[default]
    Script,
    Path,
    Watch,
}

impl CreateField {
    pub const ALL: [CreateField; 4] = [
        CreateField::Name,
        CreateField::Script,
        CreateField::Path,
        CreateField::Watch,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CreateField::Name => "Name",
            CreateField::Script => "Script",
            CreateField::Path => "Path",
            CreateField::Watch => "Watch",
        }
    }

    pub fn next(self) -> Self {
        match self {
            CreateField::Name => CreateField::Script,
            CreateField::Script => CreateField::Path,
            CreateField::Path => CreateField::Watch,
            CreateField::Watch => CreateField::Name,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            CreateField::Name => CreateField::Watch,
            CreateField::Script => CreateField::Name,
            CreateField::Path => CreateField::Script,
            CreateField::Watch => CreateField::Path,
        }
    }
}

impl CreateForm {
    pub fn field(&self, field: CreateField) -> &str {
        match field {
            CreateField::Name => &self.name,
            CreateField::Script => &self.script,
            CreateField::Path => &self.path,
            CreateField::Watch => &self.watch,
        }
    }

    pub fn field_mut(&mut self, field: CreateField) -> &mut String {
        match field {
            CreateField::Name => &mut self.name,
            CreateField::Script => &mut self.script,
            CreateField::Path => &mut self.path,
            CreateField::Watch => &mut self.watch,
        }
    }

    /// Builds the request body; `None` while the script is missing.
    pub fn to_request(&self, default_path: &str) -> Option<NewProcess> {
        let script = self.script.trim();
        if script.is_empty() {
            return None;
        }

        Some(NewProcess {
            name: non_empty(&self.name),
            script: script.to_string(),
            path: non_empty(&self.path).unwrap_or_else(|| default_path.to_string()),
            watch: non_empty(&self.watch),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Drives the process list: snapshot refreshes, row actions and process creation.
///
/// The rendered rows always come from the last successful `GET /list`; actions
/// never touch the snapshot directly and only show up after the follow-up refresh.
#[derive(Debug)]
pub struct ProcessListController<S> {
    api: S,
    snapshot: Vec<ProcessSummary>,
    loaded: bool,
    notices: Notices,
    auto_refresh: PollTimer,
    create_form: Option<CreateForm>,
    default_path: String,
}

impl<S: Supervisor> ProcessListController<S> {
    pub fn new(api: S, refresh_interval: Duration, default_path: impl Into<String>) -> Self {
        Self {
            api,
            snapshot: Vec::new(),
            loaded: false,
            notices: Notices::default(),
            auto_refresh: PollTimer::new(refresh_interval),
            create_form: None,
            default_path: default_path.into(),
        }
    }

    pub fn snapshot(&self) -> &[ProcessSummary] {
        &self.snapshot
    }

    /// Whether at least one refresh has succeeded.
    pub fn has_loaded(&self) -> bool {
        self.loaded
    }

    pub fn process(&self, id: u64) -> Option<&ProcessSummary> {
        self.snapshot.iter().find(|process| process.id == id)
    }

    pub fn render(&self, now: DateTime<Utc>) -> ProcessListView {
        ProcessListView::build(&self.snapshot, now)
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    /// Replaces the snapshot; on failure the previous one stays on screen.
    pub async fn refresh(&mut self) -> bool {
        match self.api.list_processes().await {
            Ok(processes) => {
                debug!("refreshed process list ({} entries)", processes.len());
                self.snapshot = processes;
                self.loaded = true;
                true
            }
            Err(err) => {
                debug!("process list refresh failed: {err}");
                self.notices
                    .error(format!("Failed to load processes: {err}"));
                false
            }
        }
    }

    pub async fn start(&mut self, id: u64) -> bool {
        self.run_action(id, ProcessAction::Start).await
    }

    pub async fn restart(&mut self, id: u64) -> bool {
        self.run_action(id, ProcessAction::Restart).await
    }

    pub async fn stop(&mut self, id: u64, confirm: &mut impl Confirm) -> bool {
        self.perform(id, ProcessAction::Stop, confirm).await
    }

    pub async fn remove(&mut self, id: u64, confirm: &mut impl Confirm) -> bool {
        self.perform(id, ProcessAction::Remove, confirm).await
    }

    /// Runs `action`, asking `confirm` first when the action is destructive.
    /// A refused confirmation sends nothing and returns `false`.
    pub async fn perform(
        &mut self,
        id: u64,
        action: ProcessAction,
        confirm: &mut impl Confirm,
    ) -> bool {
        if action.is_destructive() && !confirm.confirm(&confirmation_prompt(action)) {
            debug!("{action} of process {id} cancelled by user");
            return false;
        }
        self.run_action(id, action).await
    }

    async fn run_action(&mut self, id: u64, action: ProcessAction) -> bool {
        match self.api.perform_action(id, action).await {
            Ok(_) => {
                self.notices
                    .success(format!("Process {} successfully", action.past_tense()));
                self.refresh().await;
                true
            }
            Err(err) => {
                self.notices
                    .error(format!("Failed to {action} process: {err}"));
                false
            }
        }
    }

    pub async fn rename(&mut self, id: u64, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            self.notices
                .error("Failed to rename process: name cannot be empty");
            return false;
        }

        match self.api.rename_process(id, name).await {
            Ok(_) => {
                self.notices.success("Process renamed successfully");
                self.refresh().await;
                true
            }
            Err(err) => {
                self.notices
                    .error(format!("Failed to rename process: {err}"));
                false
            }
        }
    }

    pub fn open_create_form(&mut self) {
        if self.create_form.is_none() {
            self.create_form = Some(CreateForm::default());
        }
    }

    pub fn create_form(&self) -> Option<&CreateForm> {
        self.create_form.as_ref()
    }

    pub fn create_form_mut(&mut self) -> Option<&mut CreateForm> {
        self.create_form.as_mut()
    }

    /// Closes the form; entered values are discarded.
    pub fn cancel_create(&mut self) {
        self.create_form = None;
    }

    pub fn default_path(&self) -> &str {
        &self.default_path
    }

    /// Submits the open form. On success the form is closed and the list
    /// refreshed; on failure the form stays open with its values.
    pub async fn submit_create(&mut self) -> bool {
        let Some(form) = self.create_form.as_ref() else {
            return false;
        };
        let Some(request) = form.to_request(&self.default_path) else {
            self.notices
                .error("Failed to create process: script is required");
            return false;
        };

        match self.api.create_process(&request).await {
            Ok(_) => {
                self.notices.success("Process created successfully");
                self.create_form = None;
                self.refresh().await;
                true
            }
            Err(err) => {
                self.notices
                    .error(format!("Failed to create process: {err}"));
                false
            }
        }
    }

    /// Arms periodic refresh; a second call while armed does nothing.
    pub fn start_auto_refresh(&mut self, now: Instant) -> bool {
        self.auto_refresh.start(now)
    }

    pub fn stop_auto_refresh(&mut self) -> bool {
        self.auto_refresh.stop()
    }

    /// Console lost visibility (terminal focus lost).
    pub fn suspend(&mut self) {
        self.stop_auto_refresh();
    }

    /// Console became visible again.
    pub fn resume(&mut self, now: Instant) {
        self.start_auto_refresh(now);
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.auto_refresh.is_active()
    }

    pub fn next_refresh_due(&self) -> Option<Instant> {
        self.auto_refresh.next_due()
    }

    #[cfg(test)]
    pub fn active_timers(&self) -> usize {
        usize::from(self.auto_refresh.is_active())
    }

    /// Refreshes when the auto-refresh timer fires; returns whether it did.
    pub async fn tick(&mut self, now: Instant) -> bool {
        if self.auto_refresh.fire_if_due(now) {
            self.refresh().await;
            true
        } else {
            false
        }
    }
}

pub fn confirmation_prompt(action: ProcessAction) -> String {
    format!("Are you sure you want to {action} this process?")
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use chrono::Utc;

    use super::{confirmation_prompt, CreateField, CreateForm, ProcessListController};
    use crate::controller::fake::{process, FakeSupervisor};
    use crate::controller::AssumeYes;
    use crate::process::ProcessAction;
    use crate::toast::ToastKind;

    fn controller(fake: &FakeSupervisor) -> ProcessListController<&FakeSupervisor> {
        ProcessListController::new(fake, Duration::from_secs(5), "/tmp")
    }

    fn last_toast(controller: &ProcessListController<&FakeSupervisor>) -> (ToastKind, String) {
        let toast = controller
            .notices()
            .toasts()
            .latest()
            .expect("expected a toast");
        (toast.kind, toast.message.clone())
    }

    #[tokio::test]
    async fn empty_list_renders_empty_state() {
        let fake = FakeSupervisor::default();
        let mut list = controller(&fake);

        assert!(list.refresh().await);
        let view = list.render(Utc::now());
        assert!(view.is_empty());
        assert_eq!(view.rows().len(), 0);
    }

    #[tokio::test]
    async fn rows_match_supervisor_order() {
        let fake = FakeSupervisor::with_processes(vec![
            process(3, "c", true),
            process(1, "a", false),
            process(2, "b", true),
        ]);
        let mut list = controller(&fake);

        list.refresh().await;
        let ids: Vec<u64> = list.render(Utc::now()).rows().iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn refresh_twice_renders_identical_view() {
        let fake = FakeSupervisor::with_processes(vec![process(1, "a", true)]);
        let mut list = controller(&fake);
        let now = Utc::now();

        list.refresh().await;
        let first = list.render(now);
        list.refresh().await;
        let second = list.render(now);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_snapshot_and_alerts() {
        let fake = FakeSupervisor::with_processes(vec![process(1, "a", true)]);
        let mut list = controller(&fake);
        list.refresh().await;

        fake.processes.borrow_mut().clear();
        fake.fail_next(503);
        assert!(!list.refresh().await);

        assert_eq!(list.snapshot().len(), 1, "stale snapshot must survive");
        let (kind, message) = last_toast(&list);
        assert_eq!(kind, ToastKind::Error);
        assert!(message.starts_with("Failed to load processes: HTTP error! status: 503"));
        assert!(list.notices().alert().is_some());
    }

    #[tokio::test]
    async fn start_refreshes_after_success() {
        let fake = FakeSupervisor::with_processes(vec![process(4, "job", false)]);
        let mut list = controller(&fake);
        list.refresh().await;

        assert!(list.start(4).await);
        assert_eq!(fake.calls(), vec!["list", "start 4", "list"]);
        assert_eq!(
            last_toast(&list),
            (ToastKind::Success, "Process started successfully".to_string())
        );
        assert!(list.process(4).map(|p| p.running).unwrap_or(false));
    }

    #[tokio::test]
    async fn failed_action_skips_refresh() {
        let fake = FakeSupervisor::with_processes(vec![process(4, "job", true)]);
        let mut list = controller(&fake);
        fake.fail_next(500);

        assert!(!list.restart(4).await);
        assert_eq!(fake.calls(), vec!["restart 4"]);
        let (kind, message) = last_toast(&list);
        assert_eq!(kind, ToastKind::Error);
        assert!(message.starts_with("Failed to restart process:"));
        assert_eq!(list.notices().alert(), Some(message.as_str()));
    }

    #[tokio::test]
    async fn destructive_actions_require_confirmation() {
        let fake = FakeSupervisor::with_processes(vec![process(2, "db", true)]);
        let mut list = controller(&fake);

        let mut prompts = Vec::new();
        let mut decline = |prompt: &str| {
            prompts.push(prompt.to_string());
            false
        };
        assert!(!list.stop(2, &mut decline).await);
        assert!(!list.remove(2, &mut decline).await);
        assert_eq!(
            prompts,
            vec![
                "Are you sure you want to stop this process?".to_string(),
                "Are you sure you want to remove this process?".to_string()
            ]
        );
        assert!(fake.calls().is_empty(), "declined actions must not be sent");
        assert!(list.notices().toasts().is_empty());

        assert!(list.remove(2, &mut AssumeYes).await);
        assert_eq!(fake.calls(), vec!["remove 2", "list"]);
        assert!(list.render(Utc::now()).is_empty());
    }

    #[tokio::test]
    async fn start_and_restart_skip_confirmation() {
        let fake = FakeSupervisor::with_processes(vec![process(1, "a", false)]);
        let mut list = controller(&fake);
        let mut refuse = |_: &str| -> bool { panic!("confirmation must not be requested") };

        assert!(list.perform(1, ProcessAction::Start, &mut refuse).await);
        assert!(list.perform(1, ProcessAction::Restart, &mut refuse).await);
        assert_eq!(list.process(1).map(|p| p.restarts), Some(1));
    }

    #[tokio::test]
    async fn create_without_name_closes_form_and_shows_row() {
        let fake = FakeSupervisor::default();
        let mut list = controller(&fake);
        list.refresh().await;

        list.open_create_form();
        if let Some(form) = list.create_form_mut() {
            form.script = "/bin/true".to_string();
        }
        assert!(list.submit_create().await);

        assert!(list.create_form().is_none(), "form should close on success");
        assert_eq!(
            last_toast(&list),
            (ToastKind::Success, "Process created successfully".to_string())
        );
        list.refresh().await;
        let view = list.render(Utc::now());
        assert!(view
            .rows()
            .iter()
            .any(|row| row.script.as_str() == "/bin/true"));
    }

    #[tokio::test]
    async fn failed_create_keeps_form_values() {
        let fake = FakeSupervisor::default();
        let mut list = controller(&fake);
        list.open_create_form();
        if let Some(form) = list.create_form_mut() {
            form.name = "web".to_string();
            form.script = "node app.js".to_string();
        }
        fake.fail_next(400);

        assert!(!list.submit_create().await);
        let form = list.create_form().expect("form should stay open");
        assert_eq!(form.name, "web");
        assert_eq!(form.script, "node app.js");
        assert!(last_toast(&list).1.starts_with("Failed to create process:"));
    }

    #[tokio::test]
    async fn create_without_script_sends_nothing() {
        let fake = FakeSupervisor::default();
        let mut list = controller(&fake);
        list.open_create_form();

        assert!(!list.submit_create().await);
        assert!(fake.calls().is_empty());
        assert!(list.create_form().is_some());
        assert_eq!(
            list.notices().alert(),
            Some("Failed to create process: script is required")
        );
    }

    #[test]
    fn create_form_fills_defaults() {
        let form = CreateForm {
            name: "  ".to_string(),
            script: " /bin/true ".to_string(),
            path: String::new(),
            watch: String::new(),
        };
        let request = form.to_request("/home/app").expect("script is present");
        assert_eq!(request.name, None);
        assert_eq!(request.script, "/bin/true");
        assert_eq!(request.path, "/home/app");
        assert_eq!(request.watch, None);
    }

    #[test]
    fn create_fields_cycle() {
        let mut field = CreateField::default();
        let mut seen = Vec::new();
        for _ in 0..CreateField::ALL.len() {
            seen.push(field);
            field = field.next();
        }
        assert_eq!(field, CreateField::default());
        assert_eq!(seen.len(), 4);
        assert_eq!(CreateField::Name.previous(), CreateField::Watch);
    }

    #[tokio::test]
    async fn rename_refreshes_on_success() {
        let fake = FakeSupervisor::with_processes(vec![process(1, "old", true)]);
        let mut list = controller(&fake);

        assert!(list.rename(1, "new").await);
        assert_eq!(fake.calls(), vec!["rename 1 new", "list"]);
        assert_eq!(list.process(1).map(|p| p.name.as_str()), Some("new"));
    }

    #[tokio::test]
    async fn auto_refresh_ticks_and_suspends() {
        let fake = FakeSupervisor::default();
        let mut list = controller(&fake);
        let now = Instant::now();

        assert!(list.start_auto_refresh(now));
        assert!(!list.start_auto_refresh(now), "second start is a no-op");
        assert_eq!(list.active_timers(), 1);

        assert!(!list.tick(now + Duration::from_secs(1)).await);
        assert!(list.tick(now + Duration::from_secs(5)).await);
        assert_eq!(fake.calls(), vec!["list"]);

        list.suspend();
        assert_eq!(list.active_timers(), 0);
        assert!(!list.tick(now + Duration::from_secs(60)).await);

        list.resume(now + Duration::from_secs(60));
        assert!(list.is_auto_refreshing());
    }

    #[test]
    fn prompts_name_the_action() {
        assert_eq!(
            confirmation_prompt(ProcessAction::Stop),
            "Are you sure you want to stop this process?"
        );
    }
}
