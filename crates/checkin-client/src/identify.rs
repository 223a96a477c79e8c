//! Identify-by-face workflow: capture and submit in one action.

use crate::backend::{Backend, BackendError};
use crate::selector::EventSelector;
use checkin_core::api::MatchedUser;
use checkin_hw::jpeg::IDENTIFY_JPEG_QUALITY;
use checkin_hw::{encode_jpeg, CameraError, CameraSession, CameraState, ReadyState, VideoSource};
use thiserror::Error;

const DEFAULT_NO_MATCH: &str = "No match in this event";

#[derive(Error, Debug)]
pub enum IdentifyError {
    #[error("Please select an event first")]
    NoEvent,
    #[error("Camera not ready, please wait...")]
    NotReady,
    #[error("Camera has no picture yet, please wait...")]
    NoPicture,
    #[error("Failed to capture image")]
    CaptureFailed,
    #[error("Error identifying: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdentifyOutcome {
    Matched(MatchedUser),
    /// Server message, or the default when none was given.
    NoMatch(String),
}

pub struct IdentifyWorkflow<B, V> {
    backend: B,
    camera: CameraSession<V>,
    events: EventSelector,
    result: String,
}

impl<B: Backend, V: VideoSource> IdentifyWorkflow<B, V> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            camera: CameraSession::new(),
            events: EventSelector::new(),
            result: String::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn camera(&self) -> &CameraSession<V> {
        &self.camera
    }

    pub fn events(&self) -> &EventSelector {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventSelector {
        &mut self.events
    }

    /// Text shown to the user after the last step.
    pub fn result(&self) -> &str {
        &self.result
    }

    pub async fn load_events(&mut self) -> Result<(), BackendError> {
        self.events.load(&self.backend).await
    }

    /// Acquire the camera. A refusal is reported in the result text and is final.
    pub fn init_camera<F>(&mut self, open: F) -> &CameraState
    where
        F: FnOnce() -> Result<V, CameraError>,
    {
        if let CameraState::Denied(reason) = self.camera.acquire(open) {
            self.result = format!("Camera access denied or error: {reason}");
        }
        self.camera.state()
    }

    /// Check the capture preconditions, grab and encode a frame, then ask
    /// the backend for a match within the selected event.
    pub async fn capture_and_identify(&mut self) -> Result<IdentifyOutcome, IdentifyError> {
        match self.try_identify().await {
            Ok(outcome) => {
                self.result = match &outcome {
                    IdentifyOutcome::Matched(user) => {
                        format!("✅ Match found: {} ({})", user.name, user.event_name)
                    }
                    IdentifyOutcome::NoMatch(message) => format!("❌ {message}"),
                };
                Ok(outcome)
            }
            Err(err) => {
                self.result = format!("❌ {err}");
                Err(err)
            }
        }
    }

    async fn try_identify(&mut self) -> Result<IdentifyOutcome, IdentifyError> {
        let event_id = self.events.selected().ok_or(IdentifyError::NoEvent)?;

        if self.camera.ready_state() != ReadyState::HaveEnoughData {
            return Err(IdentifyError::NotReady);
        }
        let (width, height) = self.camera.dimensions();
        if width == 0 || height == 0 {
            return Err(IdentifyError::NoPicture);
        }

        let jpeg = self
            .camera
            .grab_frame()
            .map_err(|e| {
                tracing::warn!(error = %e, "frame grab failed");
                IdentifyError::CaptureFailed
            })
            .and_then(|frame| {
                encode_jpeg(&frame, IDENTIFY_JPEG_QUALITY).map_err(|e| {
                    tracing::warn!(error = %e, "jpeg encoding failed");
                    IdentifyError::CaptureFailed
                })
            })?;

        self.result = "Identifying...".to_string();
        tracing::info!(event_id = %event_id, bytes = jpeg.len(), "identifying");

        let response = self.backend.identify(event_id, jpeg).await?;
        match (response.matched, response.user) {
            (true, Some(user)) => Ok(IdentifyOutcome::Matched(user)),
            (true, None) => {
                Err(BackendError::Decode("match reported without a user".into()).into())
            }
            (false, _) => Ok(IdentifyOutcome::NoMatch(
                response.message.unwrap_or_else(|| DEFAULT_NO_MATCH.to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSource, MockBackend};
    use checkin_core::api::IdentifyResponse;
    use checkin_core::EventId;

    fn workflow(source: FakeSource) -> IdentifyWorkflow<MockBackend, FakeSource> {
        let mut wf = IdentifyWorkflow::new(MockBackend::with_events(&[(1, "Expo")]));
        wf.init_camera(|| Ok(source));
        wf
    }

    async fn selected(source: FakeSource) -> IdentifyWorkflow<MockBackend, FakeSource> {
        let mut wf = workflow(source);
        wf.load_events().await.unwrap();
        assert!(wf.events_mut().select(EventId(1)));
        wf.backend().clear_calls();
        wf
    }

    #[tokio::test]
    async fn test_match_shows_name_and_event() {
        let mut wf = selected(FakeSource::ready(32, 24)).await;
        wf.backend().set_identify_reply(IdentifyResponse {
            matched: true,
            user: Some(MatchedUser { id: None, name: "Ann".into(), event_name: "Expo".into() }),
            message: None,
        });

        let outcome = wf.capture_and_identify().await.unwrap();
        assert!(matches!(outcome, IdentifyOutcome::Matched(_)));
        assert!(wf.result().contains("Ann"));
        assert!(wf.result().contains("Expo"));
        assert_eq!(wf.backend().calls(), vec!["POST /identify 1"]);
    }

    #[tokio::test]
    async fn test_no_match_uses_server_message_or_default() {
        let mut wf = selected(FakeSource::ready(32, 24)).await;

        wf.backend().set_identify_reply(IdentifyResponse::no_match("No face detected"));
        wf.capture_and_identify().await.unwrap();
        assert_eq!(wf.result(), "❌ No face detected");

        wf.backend().set_identify_reply(IdentifyResponse::default());
        wf.capture_and_identify().await.unwrap();
        assert_eq!(wf.result(), "❌ No match in this event");
    }

    #[tokio::test]
    async fn test_match_without_user_is_an_error() {
        let mut wf = selected(FakeSource::ready(32, 24)).await;
        wf.backend().set_identify_reply(IdentifyResponse {
            matched: true,
            user: None,
            message: None,
        });

        assert!(matches!(
            wf.capture_and_identify().await,
            Err(IdentifyError::Backend(BackendError::Decode(_)))
        ));
        assert_eq!(
            wf.result(),
            "❌ Error identifying: unexpected response: match reported without a user"
        );
    }

    #[tokio::test]
    async fn test_no_event_selected_is_refused() {
        let mut wf = workflow(FakeSource::ready(32, 24));
        wf.load_events().await.unwrap();
        wf.backend().clear_calls();

        assert!(matches!(wf.capture_and_identify().await, Err(IdentifyError::NoEvent)));
        assert_eq!(wf.result(), "❌ Please select an event first");
        assert!(wf.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_ready_state_is_refused() {
        let mut wf = selected(FakeSource::with_state(ReadyState::HaveCurrentData, 32, 24)).await;
        assert!(matches!(wf.capture_and_identify().await, Err(IdentifyError::NotReady)));
        assert_eq!(wf.result(), "❌ Camera not ready, please wait...");
        assert!(wf.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_zero_dimensions_are_refused() {
        let mut wf = selected(FakeSource::ready(0, 0)).await;
        assert!(matches!(wf.capture_and_identify().await, Err(IdentifyError::NoPicture)));
        assert_eq!(wf.result(), "❌ Camera has no picture yet, please wait...");
        assert!(wf.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_encoding_failure_is_refused() {
        let mut wf = selected(FakeSource::ready(32, 24).with_frame_size(0, 0)).await;
        assert!(matches!(wf.capture_and_identify().await, Err(IdentifyError::CaptureFailed)));
        assert_eq!(wf.result(), "❌ Failed to capture image");
        assert!(wf.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn test_denied_camera_reports_reason() {
        let mut wf: IdentifyWorkflow<MockBackend, FakeSource> =
            IdentifyWorkflow::new(MockBackend::with_events(&[]));
        let state = wf
            .init_camera(|| Err(CameraError::AccessDenied("/dev/video0".into())))
            .clone();
        assert!(matches!(state, CameraState::Denied(_)));
        assert_eq!(
            wf.result(),
            "Camera access denied or error: permission denied: /dev/video0"
        );
    }

    #[tokio::test]
    async fn test_transport_failure_appends_error() {
        let mut wf = selected(FakeSource::ready(32, 24)).await;
        wf.backend().fail_transport("connection refused");

        assert!(matches!(wf.capture_and_identify().await, Err(IdentifyError::Backend(_))));
        assert_eq!(
            wf.result(),
            "❌ Error identifying: unexpected response: connection refused"
        );
    }
}
