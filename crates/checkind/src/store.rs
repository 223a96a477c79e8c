//! In-memory event and face store.

use checkin_core::api::{FaceSummary, MatchedUser};
use checkin_core::{Embedding, Event, EventId, FaceRecord, Matcher};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Event name required")]
    NameRequired,
    #[error("Event already exists")]
    DuplicateName,
    #[error("Event not found")]
    EventNotFound(EventId),
}

/// Outcome of matching a query face against one event's registrations.
#[derive(Debug)]
pub enum Identification {
    NoFaces,
    NoMatch { similarity: f32 },
    Match { user: MatchedUser, similarity: f32 },
}

#[derive(Default)]
struct Inner {
    events: BTreeMap<EventId, String>,
    faces: Vec<FaceRecord>,
    last_event_id: i64,
    last_face_id: i64,
}

impl Inner {
    fn name_taken(&self, name: &str, except: Option<EventId>) -> bool {
        self.events
            .iter()
            .any(|(id, existing)| existing == name && Some(*id) != except)
    }
}

#[derive(Default)]
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in id order.
    pub async fn list_events(&self) -> Vec<Event> {
        let inner = self.inner.read().await;
        inner
            .events
            .iter()
            .map(|(id, name)| Event { id: *id, name: name.clone() })
            .collect()
    }

    pub async fn event(&self, id: EventId) -> Option<Event> {
        let inner = self.inner.read().await;
        inner.events.get(&id).map(|name| Event { id, name: name.clone() })
    }

    pub async fn create_event(&self, name: &str) -> Result<Event, StoreError> {
        if name.is_empty() {
            return Err(StoreError::NameRequired);
        }
        let mut inner = self.inner.write().await;
        if inner.name_taken(name, None) {
            return Err(StoreError::DuplicateName);
        }
        inner.last_event_id += 1;
        let id = EventId(inner.last_event_id);
        inner.events.insert(id, name.to_string());
        Ok(Event { id, name: name.to_string() })
    }

    pub async fn rename_event(&self, id: EventId, name: &str) -> Result<Event, StoreError> {
        if name.is_empty() {
            return Err(StoreError::NameRequired);
        }
        let mut inner = self.inner.write().await;
        if !inner.events.contains_key(&id) {
            return Err(StoreError::EventNotFound(id));
        }
        if inner.name_taken(name, Some(id)) {
            return Err(StoreError::DuplicateName);
        }
        inner.events.insert(id, name.to_string());
        Ok(Event { id, name: name.to_string() })
    }

    /// Remove an event and every face registered under it.
    /// Returns the number of faces removed.
    pub async fn delete_event(&self, id: EventId) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.events.remove(&id).is_none() {
            return Err(StoreError::EventNotFound(id));
        }
        let before = inner.faces.len();
        inner.faces.retain(|f| f.event_id != id);
        Ok(before - inner.faces.len())
    }

    /// Register a face under an existing event.
    pub async fn add_face(
        &self,
        name: &str,
        event_id: EventId,
        embedding: Embedding,
        image: Vec<u8>,
    ) -> Result<FaceSummary, StoreError> {
        let mut inner = self.inner.write().await;
        let event_name = inner
            .events
            .get(&event_id)
            .cloned()
            .ok_or(StoreError::EventNotFound(event_id))?;

        inner.last_face_id += 1;
        let id = inner.last_face_id;
        inner.faces.push(FaceRecord {
            id,
            name: name.to_string(),
            event_id,
            embedding,
            image,
            created_at: chrono::Utc::now().to_rfc3339(),
        });

        Ok(FaceSummary {
            id,
            name: name.to_string(),
            event_id,
            event_name,
        })
    }

    pub async fn faces(&self) -> Vec<FaceSummary> {
        let inner = self.inner.read().await;
        inner
            .faces
            .iter()
            .filter_map(|f| {
                let event_name = inner.events.get(&f.event_id)?;
                Some(FaceSummary {
                    id: f.id,
                    name: f.name.clone(),
                    event_id: f.event_id,
                    event_name: event_name.clone(),
                })
            })
            .collect()
    }

    /// Match a query face against the faces registered under one event.
    pub async fn identify(
        &self,
        event_id: EventId,
        query: &Embedding,
        matcher: &dyn Matcher,
        threshold: f32,
    ) -> Identification {
        let inner = self.inner.read().await;
        let gallery: Vec<&FaceRecord> =
            inner.faces.iter().filter(|f| f.event_id == event_id).collect();
        if gallery.is_empty() {
            return Identification::NoFaces;
        }

        let result = matcher.compare(query, &gallery, threshold);
        match result.index.map(|i| gallery[i]) {
            Some(face) if result.matched => Identification::Match {
                user: MatchedUser {
                    id: Some(face.id),
                    name: face.name.clone(),
                    event_name: inner.events.get(&event_id).cloned().unwrap_or_default(),
                },
                similarity: result.similarity,
            },
            _ => Identification::NoMatch {
                similarity: result.similarity,
            },
        }
    }
}
