//! Dialog capability for hosts without a UI

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use hatch_plugin_api::{Alert, AlertStyle, Confirm, Dialog};

/// A prompt shown through a [`HeadlessDialog`] and how it was answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    Confirm {
        title: String,
        subtitle: String,
        approved: bool,
    },
    Alert {
        title: String,
        subtitle: String,
    },
    PickDirectory {
        title: String,
        picked: Option<PathBuf>,
    },
}

/// [`Dialog`] that logs every prompt and answers with fixed replies
#[derive(Debug)]
pub struct HeadlessDialog {
    approve: bool,
    directory: Option<PathBuf>,
    events: Mutex<Vec<DialogEvent>>,
}

impl HeadlessDialog {
    /// Answer every confirmation with `approve`; directory pickers are
    /// dismissed
    pub fn new(approve: bool) -> Self {
        Self {
            approve,
            directory: None,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Builder: answer directory pickers with `directory`
    pub fn with_directory(mut self, directory: impl AsRef<Path>) -> Self {
        self.directory = Some(directory.as_ref().to_path_buf());
        self
    }

    /// Prompts shown so far, oldest first
    pub fn events(&self) -> Vec<DialogEvent> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<DialogEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Dialog for HeadlessDialog {
    fn confirm(&self, request: &Confirm) -> bool {
        tracing::info!(
            title = %request.title,
            subtitle = %request.subtitle,
            approved = self.approve,
            "Confirmation requested"
        );
        self.lock().push(DialogEvent::Confirm {
            title: request.title.clone(),
            subtitle: request.subtitle.clone(),
            approved: self.approve,
        });
        self.approve
    }

    fn alert(&self, request: &Alert) {
        match request.style {
            AlertStyle::Critical => {
                tracing::error!(title = %request.title, subtitle = %request.subtitle, "Alert")
            }
            AlertStyle::Warning => {
                tracing::warn!(title = %request.title, subtitle = %request.subtitle, "Alert")
            }
            AlertStyle::Informational => {
                tracing::info!(title = %request.title, subtitle = %request.subtitle, "Alert")
            }
        }
        self.lock().push(DialogEvent::Alert {
            title: request.title.clone(),
            subtitle: request.subtitle.clone(),
        });
    }

    fn pick_directory(&self, title: &str) -> Option<PathBuf> {
        tracing::info!(title = %title, picked = ?self.directory, "Directory requested");
        self.lock().push(DialogEvent::PickDirectory {
            title: title.to_string(),
            picked: self.directory.clone(),
        });
        self.directory.clone()
    }
}
