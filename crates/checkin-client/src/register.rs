//! Register-by-face workflow.
//!
//! Capture and submit are separate steps. The pending capture lives in the
//! workflow's [`RegistrationForm`] and is validated into a
//! [`PendingRegistration`] that the submit step sends.

use crate::backend::{Backend, BackendError, RegisterReply};
use crate::selector::EventSelector;
use checkin_core::api::RegisterResponse;
use checkin_core::EventId;
use checkin_hw::jpeg::DEFAULT_JPEG_QUALITY;
use checkin_hw::{encode_jpeg, CameraError, CameraSession, CameraState, VideoSource};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegisterError {
    #[error("Enter your name")]
    NameRequired,
    #[error("Select event")]
    NoEvent,
    #[error("Capture first")]
    NoCapture,
    #[error("{}", .error.as_deref().unwrap_or("Error registering"))]
    Rejected { status: u16, error: Option<String> },
    #[error("Network error")]
    Network(#[from] BackendError),
}

/// A frame encoded for upload.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Form state: typed name, selected event and the pending capture.
#[derive(Debug, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub events: EventSelector,
    capture: Option<CapturedImage>,
}

/// A validated registration, ready to send.
#[derive(Debug)]
pub struct PendingRegistration {
    pub name: String,
    pub event_id: EventId,
    pub image: CapturedImage,
}

impl RegistrationForm {
    pub fn capture(&self) -> Option<&CapturedImage> {
        self.capture.as_ref()
    }

    /// Check name, event and capture in that order.
    pub fn validate(&self) -> Result<PendingRegistration, RegisterError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(RegisterError::NameRequired);
        }
        let event_id = self.events.selected().ok_or(RegisterError::NoEvent)?;
        let image = self.capture.clone().ok_or(RegisterError::NoCapture)?;
        Ok(PendingRegistration {
            name: name.to_string(),
            event_id,
            image,
        })
    }

    fn reset(&mut self) {
        self.name.clear();
        self.events.clear();
        self.capture = None;
    }
}

pub struct RegisterWorkflow<B, V> {
    backend: B,
    camera: CameraSession<V>,
    form: RegistrationForm,
    submit_enabled: bool,
    status: String,
}

impl<B: Backend, V: VideoSource> RegisterWorkflow<B, V> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            camera: CameraSession::new(),
            form: RegistrationForm::default(),
            submit_enabled: false,
            status: String::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RegistrationForm {
        &mut self.form
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Only a fresh capture turns submit back on; a failed submit leaves it off.
    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub async fn load_events(&mut self) -> Result<(), BackendError> {
        self.form.events.load(&self.backend).await
    }

    pub fn init_camera<F>(&mut self, open: F) -> &CameraState
    where
        F: FnOnce() -> Result<V, CameraError>,
    {
        self.status = match self.camera.acquire(open) {
            CameraState::Ready => "Camera live ✅".to_string(),
            _ => "Camera access denied".to_string(),
        };
        self.camera.state()
    }

    /// Freeze the current frame as the pending capture and enable submit.
    ///
    /// No readiness check is made: an unsettled camera yields whatever frame
    /// it reports. A frame that cannot be encoded leaves no pending capture.
    pub fn capture(&mut self) {
        self.form.capture = self
            .camera
            .grab_frame()
            .map_err(|e| e.to_string())
            .and_then(|frame| {
                let jpeg = encode_jpeg(&frame, DEFAULT_JPEG_QUALITY).map_err(|e| e.to_string())?;
                Ok(CapturedImage {
                    jpeg,
                    width: frame.width,
                    height: frame.height,
                })
            })
            .map_err(|error| tracing::warn!(%error, "capture produced no image"))
            .ok();

        self.status = "✅ Face captured! Click Submit.".to_string();
        self.submit_enabled = true;
    }

    /// Validate the form and send the registration.
    pub async fn submit(&mut self) -> Result<RegisterResponse, RegisterError> {
        let pending = match self.form.validate() {
            Ok(pending) => pending,
            Err(err) => {
                self.status = format!("❌ {err}");
                return Err(err);
            }
        };

        self.submit_enabled = false;
        self.status = "Registering...".to_string();

        match self.send(pending).await {
            Ok(registered) => {
                self.status = format!(
                    "✅ Registered: {} for {}",
                    registered.name, registered.event_name
                );
                self.form.reset();
                Ok(registered)
            }
            Err(err) => {
                tracing::warn!(error = %err, "registration failed");
                self.status = format!("❌ {err}");
                Err(err)
            }
        }
    }

    async fn send(&self, pending: PendingRegistration) -> Result<RegisterResponse, RegisterError> {
        tracing::info!(
            name = %pending.name,
            event_id = %pending.event_id,
            width = pending.image.width,
            height = pending.image.height,
            "registering"
        );
        match self
            .backend
            .register(&pending.name, pending.event_id, pending.image.jpeg)
            .await?
        {
            RegisterReply::Registered(registered) => Ok(registered),
            RegisterReply::Rejected { status, error } => Err(RegisterError::Rejected {
                status,
                error: error.filter(|e| !e.is_empty()),
            }),
        }
    }
}
