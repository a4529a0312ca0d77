//! Location fragment routing for the detail pane.
//!
//! The [`Router`] owns the current `#fragment` and publishes it on a watch
//! channel; a [`DetailSelector`] turns that signal into the selected process id.

use tokio::sync::watch;
use url::Url;

#[derive(Debug)]
pub struct Router {
    location: watch::Sender<String>,
}

impl Router {
    pub fn new(fragment: &str) -> Self {
        let (location, _) = watch::channel(normalize(fragment));
        Self { location }
    }

    pub fn from_url(url: &Url) -> Self {
        Self::new(url.fragment().unwrap_or_default())
    }

    pub fn fragment(&self) -> String {
        self.location.borrow().clone()
    }

    /// Equivalent of assigning `location.hash`; unchanged fragments publish nothing.
    pub fn navigate(&self, fragment: &str) {
        let fragment = normalize(fragment);
        self.location.send_if_modified(|current| {
            if *current == fragment {
                false
            } else {
                *current = fragment;
                true
            }
        });
    }

    pub fn clear(&self) {
        self.navigate("");
    }

    pub fn mount(&self) -> DetailSelector {
        DetailSelector::mount(self.location.subscribe())
    }
}

fn normalize(fragment: &str) -> String {
    let fragment = fragment.trim();
    fragment.strip_prefix('#').unwrap_or(fragment).to_string()
}

/// Selected entity id derived from the location fragment.
#[derive(Debug)]
pub struct DetailSelector {
    location: watch::Receiver<String>,
    selected: Option<String>,
}

impl DetailSelector {
    fn mount(mut location: watch::Receiver<String>) -> Self {
        let selected = selection_from(&location.borrow_and_update());
        Self { location, selected }
    }

    /// Applies a pending fragment change, returning whether one was seen.
    pub fn sync(&mut self) -> bool {
        if !self.location.has_changed().unwrap_or(false) {
            return false;
        }
        self.selected = selection_from(&self.location.borrow_and_update());
        true
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

fn selection_from(fragment: &str) -> Option<String> {
    if fragment.is_empty() {
        None
    } else {
        Some(fragment.to_string())
    }
}
