//! Live capture from a V4L2 device through the `v4l` crate.
//!
//! The camera asks for 640x480 YUYV and accepts whatever grayscale-capable
//! format the driver settles on. Every frame is reduced to one luma byte per
//! pixel before it leaves this module.

use crate::frame::{self, Frame, FrameError};
use crate::source::{ReadyState, VideoSource};
use std::path::Path;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::capability::Flags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

const PREFERRED_SIZE: (u32, u32) = (640, 480);
const MMAP_BUFFERS: u32 = 4;
/// Nodes scanned by [`Camera::list_devices`].
const MAX_VIDEO_NODES: u32 = 16;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("permission denied: {0}")]
    AccessDenied(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("streaming not supported")]
    StreamingNotSupported,
    #[error("camera not started")]
    NotStarted,
}

/// A capture-capable node found by [`Camera::list_devices`].
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Pixel layouts the camera can turn into luma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Yuyv,
    Grey,
    Y16,
}

impl PixelFormat {
    fn from_fourcc(fourcc: FourCC) -> Option<Self> {
        match &fourcc.repr {
            b"YUYV" => Some(Self::Yuyv),
            b"GREY" => Some(Self::Grey),
            b"Y16 " => Some(Self::Y16),
            _ => None,
        }
    }

    fn to_grayscale(self, buf: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
        match self {
            Self::Yuyv => frame::yuyv_to_grayscale(buf, width, height),
            Self::Y16 => frame::y16_to_grayscale(buf, width, height),
            Self::Grey => {
                let expected = width as usize * height as usize;
                buf.get(..expected)
                    .map(<[u8]>::to_vec)
                    .ok_or(FrameError::InvalidLength { expected, actual: buf.len() })
            }
        }
    }
}

/// An opened V4L2 capture device.
pub struct Camera {
    device: Device,
    width: u32,
    height: u32,
    format: PixelFormat,
    warmup_frames: usize,
    started: bool,
}

/// Map an open failure onto the camera error the workflows report.
fn open_error(path: &str, err: std::io::Error) -> CameraError {
    let text = err.to_string();
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        CameraError::AccessDenied(format!("{path}: {err}"))
    } else if text.contains("busy") || text.contains("EBUSY") {
        CameraError::DeviceBusy
    } else {
        CameraError::DeviceNotFound(format!("{path}: {err}"))
    }
}

impl Camera {
    /// Open `device_path` and negotiate a format. Streaming starts in
    /// [`VideoSource::start`], which first drops `warmup_frames` frames.
    pub fn open(device_path: &str, warmup_frames: usize) -> Result<Self, CameraError> {
        if !Path::new(device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path.to_string()));
        }
        let device = Device::with_path(device_path).map_err(|e| open_error(device_path, e))?;

        let caps = device
            .query_caps()
            .map_err(|e| CameraError::CaptureFailed(format!("querying capabilities: {e}")))?;
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            return Err(CameraError::StreamingNotSupported);
        }

        let mut requested = device
            .format()
            .map_err(|e| CameraError::FormatNegotiationFailed(format!("reading format: {e}")))?;
        requested.fourcc = FourCC::new(b"YUYV");
        (requested.width, requested.height) = PREFERRED_SIZE;

        let negotiated = device
            .set_format(&requested)
            .map_err(|e| CameraError::FormatNegotiationFailed(format!("setting format: {e}")))?;
        let format = PixelFormat::from_fourcc(negotiated.fourcc).ok_or_else(|| {
            CameraError::FormatNegotiationFailed(format!(
                "driver chose {}, need YUYV, GREY or Y16",
                negotiated.fourcc
            ))
        })?;

        tracing::info!(
            device = device_path,
            card = %caps.card,
            width = negotiated.width,
            height = negotiated.height,
            ?format,
            "camera opened"
        );

        Ok(Self {
            device,
            width: negotiated.width,
            height: negotiated.height,
            format,
            warmup_frames,
            started: false,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    fn stream(&self) -> Result<MmapStream<'_>, CameraError> {
        MmapStream::with_buffers(&self.device, BufType::VideoCapture, MMAP_BUFFERS)
            .map_err(|e| CameraError::CaptureFailed(format!("mapping buffers: {e}")))
    }

    /// Dequeue one frame and convert it to luma.
    pub fn capture_frame(&self) -> Result<Frame, CameraError> {
        let mut stream = self.stream()?;
        let (buf, meta) = stream
            .next()
            .map_err(|e| CameraError::CaptureFailed(format!("dequeuing buffer: {e}")))?;

        let data = self
            .format
            .to_grayscale(buf, self.width, self.height)
            .map_err(|e| CameraError::CaptureFailed(format!("{:?} frame: {e}", self.format)))?;

        Ok(Frame {
            data,
            width: self.width,
            height: self.height,
            sequence: meta.sequence,
        })
    }

    /// Capture-capable nodes among `/dev/video0` .. `/dev/video15`.
    pub fn list_devices() -> Vec<DeviceInfo> {
        (0..MAX_VIDEO_NODES)
            .map(|n| format!("/dev/video{n}"))
            .filter(|path| Path::new(path).exists())
            .filter_map(|path| {
                let caps = Device::with_path(&path).ok()?.query_caps().ok()?;
                caps.capabilities.contains(Flags::VIDEO_CAPTURE).then(|| DeviceInfo {
                    path,
                    name: caps.card,
                    driver: caps.driver,
                    bus: caps.bus,
                })
            })
            .collect()
    }
}

impl VideoSource for Camera {
    /// Drop the warmup frames so auto-exposure settles before the first capture.
    fn start(&mut self) -> Result<(), CameraError> {
        if self.warmup_frames > 0 {
            tracing::debug!(count = self.warmup_frames, "discarding warmup frames");
            let mut stream = self.stream()?;
            for _ in 0..self.warmup_frames {
                stream
                    .next()
                    .map_err(|e| CameraError::CaptureFailed(format!("warming up: {e}")))?;
            }
        }
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
        (self.width, self.height)
    }

    fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        self.capture_frame()
    }
}
