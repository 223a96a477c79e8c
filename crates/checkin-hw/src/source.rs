//! Video source abstraction shared by the camera and still-image inputs.

use crate::camera::CameraError;
use crate::frame::Frame;
use std::path::Path;

/// How much data a source has buffered, mirroring a media element's ready-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

/// A live or still picture the workflows can capture from.
pub trait VideoSource {
    /// Begin playback. Called once after the source is acquired.
    fn start(&mut self) -> Result<(), CameraError>;

    fn ready_state(&self) -> ReadyState;

    /// Intrinsic frame dimensions; `(0, 0)` until known.
    fn dimensions(&self) -> (u32, u32);

    /// Grab the current frame at its intrinsic size.
    fn grab_frame(&mut self) -> Result<Frame, CameraError>;
}

/// A fixed image standing in for a camera.
pub struct StillSource {
    frame: Frame,
    started: bool,
}

impl StillSource {
    /// Wrap an already-decoded grayscale frame.
    pub fn new(frame: Frame) -> Self {
        Self { frame, started: false }
    }

    /// Decode an image file (any format the `image` crate reads).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CameraError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CameraError::DeviceNotFound(path.display().to_string()));
        }
        let img = image::open(path)
            .map_err(|e| CameraError::CaptureFailed(format!("{}: {e}", path.display())))?
            .to_luma8();

        tracing::info!(
            path = %path.display(),
            width = img.width(),
            height = img.height(),
            "opened still image"
        );

        Ok(Self::new(Frame {
            width: img.width(),
            height: img.height(),
            data: img.into_raw(),
            sequence: 0,
        }))
    }
}

impl VideoSource for StillSource {
    fn start(&mut self) -> Result<(), CameraError> {
        self.started = true;
        Ok(())
    }

    fn ready_state(&self) -> ReadyState {
        if self.started {
            ReadyState::HaveEnoughData
        } else {
            ReadyState::HaveMetadata
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        Ok(self.frame.clone())
    }
}
