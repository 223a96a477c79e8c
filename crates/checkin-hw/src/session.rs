//! Camera session state machine.
//!
//! `Uninitialized` → `Acquiring` → `Ready` once the source has started,
//! or `Denied` when the source cannot be opened or started. `Denied` is
//! terminal for the session; a new session is needed to retry.

use crate::camera::CameraError;
use crate::frame::Frame;
use crate::source::{ReadyState, VideoSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraState {
    Uninitialized,
    Acquiring,
    Ready,
    /// Access refused; carries the error text.
    Denied(String),
}

/// Exclusive owner of one video source for the lifetime of a workflow.
pub struct CameraSession<V> {
    state: CameraState,
    source: Option<V>,
}

impl<V> Default for CameraSession<V> {
    fn default() -> Self {
        Self {
            state: CameraState::Uninitialized,
            source: None,
        }
    }
}

impl<V: VideoSource> CameraSession<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    /// Open and start a source. Only acts from `Uninitialized`; any later
    /// state is returned unchanged.
    pub fn acquire<F>(&mut self, open: F) -> &CameraState
    where
        F: FnOnce() -> Result<V, CameraError>,
    {
        if self.state != CameraState::Uninitialized {
            return &self.state;
        }

        self.state = CameraState::Acquiring;
        let started = open().and_then(|mut source| {
            source.start()?;
            Ok(source)
        });

        match started {
            Ok(source) => {
                let (width, height) = source.dimensions();
                tracing::info!(width, height, "camera ready");
                self.source = Some(source);
                self.state = CameraState::Ready;
            }
            Err(err) => {
                tracing::warn!(error = %err, "camera access denied");
                self.state = CameraState::Denied(err.to_string());
            }
        }

        &self.state
    }

    pub fn ready_state(&self) -> ReadyState {
        self.source
            .as_ref()
            .map(|s| s.ready_state())
            .unwrap_or(ReadyState::HaveNothing)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.source.as_ref().map(|s| s.dimensions()).unwrap_or((0, 0))
    }

    /// Grab the current frame without any readiness check.
    pub fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        match self.source.as_mut() {
            Some(source) => source.grab_frame(),
            None => Err(CameraError::NotStarted),
        }
    }
}
