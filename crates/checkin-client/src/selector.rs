//! Event drop-down shared by the identify and register workflows.

use crate::backend::{Backend, BackendError};
use checkin_core::{Event, EventId};

/// Label of the empty first option.
pub const PLACEHOLDER: &str = "Select Event";

/// One option as shown to the user: `(value, label)`; the placeholder has an empty value.
pub type SelectOption = (String, String);

#[derive(Debug, Default, Clone)]
pub struct EventSelector {
    events: Vec<Event>,
    selected: Option<EventId>,
}

impl EventSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch events and replace the options. Resets the selection to the placeholder.
    pub async fn load<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<(), BackendError> {
        let events = backend.list_events().await?;
        tracing::debug!(count = events.len(), "event options loaded");
        self.replace(events);
        Ok(())
    }

    pub fn replace(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events = events.into_iter().collect();
        self.selected = None;
    }

    /// Options in display order, placeholder first.
    pub fn options(&self) -> Vec<SelectOption> {
        std::iter::once((String::new(), PLACEHOLDER.to_string()))
            .chain(self.events.iter().map(|e| (e.id.to_string(), e.name.clone())))
            .collect()
    }

    /// Select a listed event. Returns false (selection unchanged) for unknown ids.
    pub fn select(&mut self, id: EventId) -> bool {
        if self.events.iter().any(|e| e.id == id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    /// Back to the placeholder.
    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<EventId> {
        self.selected
    }

    pub fn selected_event(&self) -> Option<&Event> {
        let id = self.selected?;
        self.events.iter().find(|e| e.id == id)
    }
}
