//! Admin event manager.
//!
//! Every mutation is fire-and-refresh: after the request the full list is
//! fetched again, so the panel never reasons about partial state. Unlike a
//! silent page script, failures are surfaced in [`AdminPanel::banner`].

use crate::backend::{Backend, BackendError};
use checkin_core::{Event, EventId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Event name required")]
    NameRequired,
    #[error("rename cancelled")]
    Cancelled,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Blocking user interaction: alerts and a single-line prompt.
pub trait Dialog {
    fn alert(&mut self, message: &str);
    /// `None` when dismissed.
    fn prompt(&mut self, message: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Delete,
    Update,
}

/// An action bound to one row's event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAction {
    pub kind: ActionKind,
    pub id: EventId,
}

/// A rendered list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub id: EventId,
    pub label: String,
    pub delete: RowAction,
    pub update: RowAction,
}

impl From<Event> for EventRow {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            delete: RowAction { kind: ActionKind::Delete, id: event.id },
            update: RowAction { kind: ActionKind::Update, id: event.id },
            label: event.name,
        }
    }
}

pub struct AdminPanel<B> {
    backend: B,
    rows: Vec<EventRow>,
    banner: Option<String>,
}

impl<B: Backend> AdminPanel<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            rows: Vec::new(),
            banner: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn rows(&self) -> &[EventRow] {
        &self.rows
    }

    /// Visible error from the last failed operation, if any.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Fetch all events as a one-shot sequence.
    pub async fn list(&self) -> Result<std::vec::IntoIter<Event>, BackendError> {
        Ok(self.backend.list_events().await?.into_iter())
    }

    /// Reload and re-render the rows. On failure the previous rows stay;
    /// on success any earlier banner is cleared.
    pub async fn load(&mut self) -> Result<&[EventRow], AdminError> {
        self.refresh().await?;
        self.banner = None;
        Ok(&self.rows)
    }

    /// Reload. A failure sets the banner; success leaves it as it was.
    async fn refresh(&mut self) -> Result<(), AdminError> {
        match self.list().await {
            Ok(events) => {
                self.rows = events.map(EventRow::from).collect();
                tracing::debug!(count = self.rows.len(), "event list rendered");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load events");
                self.banner = Some(format!("❌ Could not load events: {err}"));
                Err(err.into())
            }
        }
    }

    pub async fn create(&mut self, name: &str, dialog: &mut impl Dialog) -> Result<(), AdminError> {
        if name.is_empty() {
            dialog.alert("Event name required");
            return Err(AdminError::NameRequired);
        }
        let result = self.backend.create_event(name).await;
        self.finish("create", result).await
    }

    /// Delete without confirmation.
    pub async fn delete(&mut self, id: EventId) -> Result<(), AdminError> {
        let result = self.backend.delete_event(id).await;
        self.finish("delete", result).await
    }

    /// Prompt for a new name; a dismissed or empty answer sends nothing.
    pub async fn update(
        &mut self,
        id: EventId,
        dialog: &mut impl Dialog,
    ) -> Result<(), AdminError> {
        let Some(name) = dialog.prompt("Enter new name:").filter(|n| !n.is_empty()) else {
            return Err(AdminError::Cancelled);
        };
        let result = self.backend.update_event(id, &name).await;
        self.finish("update", result).await
    }

    /// Run a row's action.
    pub async fn invoke(
        &mut self,
        action: RowAction,
        dialog: &mut impl Dialog,
    ) -> Result<(), AdminError> {
        match action.kind {
            ActionKind::Delete => self.delete(action.id).await,
            ActionKind::Update => self.update(action.id, dialog).await,
        }
    }

    /// Record the mutation outcome, then reload regardless.
    async fn finish(
        &mut self,
        op: &str,
        result: Result<(), BackendError>,
    ) -> Result<(), AdminError> {
        self.banner = None;
        if let Err(err) = &result {
            tracing::warn!(op, error = %err, "event mutation failed");
            self.banner = Some(format!("❌ {err}"));
        }
        let reloaded = self.refresh().await;
        result?;
        reloaded
    }
}
