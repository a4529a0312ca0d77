use tracing::debug;

use crate::api::Supervisor;
use crate::process::ProcessSummary;
use crate::router::DetailSelector;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState {
    /// No process selected; nothing is rendered.
    #[default]
    Hidden,
    Loaded(ProcessSummary),
    Failed(String),
}

/// Detail pane keyed by the id currently selected in the location fragment.
#[derive(Debug)]
pub struct ProcessDetail<S> {
    api: S,
    selector: DetailSelector,
    key: Option<String>,
    state: DetailState,
}

impl<S: Supervisor> ProcessDetail<S> {
    pub fn new(api: S, selector: DetailSelector) -> Self {
        Self {
            api,
            selector,
            key: None,
            state: DetailState::Hidden,
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn selected(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Picks up fragment changes and loads the newly selected process.
    /// Returns whether the key changed.
    pub async fn sync(&mut self) -> bool {
        self.selector.sync();
        let wanted = self.selector.selected().map(str::to_string);
        if wanted == self.key && self.state != DetailState::Hidden {
            return false;
        }
        if wanted.is_none() && self.key.is_none() {
            return false;
        }

        self.key = wanted;
        self.reload().await;
        true
    }

    pub async fn reload(&mut self) {
        let Some(key) = self.key.as_deref() else {
            self.state = DetailState::Hidden;
            return;
        };
        let Ok(id) = key.parse::<u64>() else {
            self.state = DetailState::Failed(format!("unknown process id: {key}"));
            return;
        };

        self.state = match self.api.process_info(id).await {
            Ok(process) => DetailState::Loaded(process),
            Err(err) => {
                debug!("loading details of process {id} failed: {err}");
                DetailState::Failed(err.to_string())
            }
        };
    }
}
