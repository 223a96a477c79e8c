//! checkin-hw: Capture layer for the check-in workflows.
//!
//! Provides V4L2 camera access, a still-image source, the camera session
//! state machine and JPEG encoding of captured frames.

pub mod camera;
pub mod frame;
pub mod jpeg;
pub mod session;
pub mod source;

pub use camera::{Camera, CameraError, PixelFormat};
pub use frame::Frame;
pub use jpeg::{encode_jpeg, EncodeError};
pub use session::{CameraSession, CameraState};
pub use source::{ReadyState, StillSource, VideoSource};
