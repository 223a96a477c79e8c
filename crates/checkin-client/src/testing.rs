//! In-memory doubles for workflow tests.

use crate::admin::Dialog;
use crate::backend::{Backend, BackendError, RegisterReply};
use async_trait::async_trait;
use checkin_core::api::{FaceSummary, IdentifyResponse, RegisterResponse};
use checkin_core::{Event, EventId};
use checkin_hw::{CameraError, Frame, ReadyState, VideoSource};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MockState {
    events: Vec<Event>,
    calls: Vec<String>,
    identify_reply: IdentifyResponse,
    register_reply: Option<RegisterReply>,
    reject_mutations: Option<String>,
    fail_transport: Option<String>,
}

/// Backend that keeps events in memory and records every request as
/// `"METHOD /path args"`.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn with_events(events: &[(i64, &str)]) -> Self {
        let backend = Self::default();
        backend.lock().events = events
            .iter()
            .map(|&(id, name)| Event { id: EventId(id), name: name.to_string() })
            .collect();
        backend
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make create/update/delete answer 400 with `message`.
    pub fn reject_mutations(&self, message: &str) {
        self.lock().reject_mutations = Some(message.to_string());
    }

    /// Make every later request fail before a response is read.
    pub fn fail_transport(&self, message: &str) {
        self.lock().fail_transport = Some(message.to_string());
    }

    pub fn recover_transport(&self) {
        self.lock().fail_transport = None;
    }

    pub fn set_identify_reply(&self, reply: IdentifyResponse) {
        self.lock().identify_reply = reply;
    }

    pub fn set_register_reply(&self, reply: RegisterReply) {
        self.lock().register_reply = Some(reply);
    }

    /// Record the call, then apply the transport and rejection switches.
    fn begin(
        &self,
        call: String,
        mutation: bool,
    ) -> Result<MutexGuard<'_, MockState>, BackendError> {
        let mut state = self.lock();
        state.calls.push(call);
        if let Some(message) = &state.fail_transport {
            return Err(BackendError::Decode(message.clone()));
        }
        if mutation {
            if let Some(message) = &state.reject_mutations {
                return Err(BackendError::Status { status: 400, message: Some(message.clone()) });
            }
        }
        Ok(state)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_events(&self) -> Result<Vec<Event>, BackendError> {
        let state = self.begin("GET /admin/events".into(), false)?;
        Ok(state.events.clone())
    }

    async fn create_event(&self, name: &str) -> Result<(), BackendError> {
        let mut state = self.begin(format!("POST /admin/events {name}"), true)?;
        let next = state.events.iter().map(|e| e.id.0).max().unwrap_or(0) + 1;
        state.events.push(Event { id: EventId(next), name: name.to_string() });
        Ok(())
    }

    async fn update_event(&self, id: EventId, name: &str) -> Result<(), BackendError> {
        let mut state = self.begin(format!("PUT /admin/events/{id} {name}"), true)?;
        match state.events.iter_mut().find(|e| e.id == id) {
            Some(event) => {
                event.name = name.to_string();
                Ok(())
            }
            None => Err(BackendError::Status {
                status: 404,
                message: Some("Event not found".into()),
            }),
        }
    }

    async fn delete_event(&self, id: EventId) -> Result<(), BackendError> {
        let mut state = self.begin(format!("DELETE /admin/events/{id}"), true)?;
        state.events.retain(|e| e.id != id);
        Ok(())
    }

    async fn list_faces(&self) -> Result<Vec<FaceSummary>, BackendError> {
        let _state = self.begin("GET /admin/faces".into(), false)?;
        Ok(Vec::new())
    }

    async fn identify(
        &self,
        event_id: EventId,
        _jpeg: Vec<u8>,
    ) -> Result<IdentifyResponse, BackendError> {
        let state = self.begin(format!("POST /identify {event_id}"), false)?;
        Ok(state.identify_reply.clone())
    }

    async fn register(
        &self,
        name: &str,
        event_id: EventId,
        _jpeg: Vec<u8>,
    ) -> Result<RegisterReply, BackendError> {
        let state = self.begin(format!("POST /register {name} {event_id}"), false)?;
        if let Some(reply) = &state.register_reply {
            return Ok(reply.clone());
        }
        let event_name = state
            .events
            .iter()
            .find(|e| e.id == event_id)
            .map(|e| e.name.clone())
            .unwrap_or_default();
        Ok(RegisterReply::Registered(RegisterResponse {
            id: Some(1),
            name: name.to_string(),
            event_name,
        }))
    }
}

/// Dialog that answers every prompt the same way and records alerts.
#[derive(Default)]
pub struct ScriptedDialog {
    answer: Option<String>,
    pub alerts: Vec<String>,
}

impl ScriptedDialog {
    pub fn answering(answer: Option<&str>) -> Self {
        Self {
            answer: answer.map(str::to_owned),
            alerts: Vec::new(),
        }
    }
}

impl Dialog for ScriptedDialog {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn prompt(&mut self, _message: &str) -> Option<String> {
        self.answer.clone()
    }
}

/// Video source with a fixed ready-state and reported size.
pub struct FakeSource {
    state: ReadyState,
    dimensions: (u32, u32),
    frame_size: (u32, u32),
}

impl FakeSource {
    pub fn ready(width: u32, height: u32) -> Self {
        Self::with_state(ReadyState::HaveEnoughData, width, height)
    }

    pub fn with_state(state: ReadyState, width: u32, height: u32) -> Self {
        Self {
            state,
            dimensions: (width, height),
            frame_size: (width, height),
        }
    }

    /// Grab frames at a size other than the reported one.
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width, height);
        self
    }
}

impl VideoSource for FakeSource {
    fn start(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        self.state
    }

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        let (width, height) = self.frame_size;
        let data = (0..width * height).map(|i| (i % 251) as u8).collect();
        Ok(Frame { data, width, height, sequence: 0 })
    }
}
