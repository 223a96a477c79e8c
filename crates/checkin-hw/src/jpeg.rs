//! JPEG encoding of captured frames.

use crate::frame::Frame;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use thiserror::Error;

/// Quality used for identification captures.
pub const IDENTIFY_JPEG_QUALITY: u8 = 95;
/// Quality used when no explicit quality is requested (registration captures).
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("frame has no pixels ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("jpeg: {0}")]
    Image(#[from] image::ImageError),
}

/// Encode a grayscale frame as a JPEG blob at the given quality (1–100).
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, EncodeError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(EncodeError::EmptyFrame {
            width: frame.width,
            height: frame.height,
        });
    }

    let expected = (frame.width * frame.height) as usize;
    if frame.data.len() < expected {
        return Err(EncodeError::InvalidLength {
            expected,
            actual: frame.data.len(),
        });
    }

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode(
        &frame.data[..expected],
        frame.width,
        frame.height,
        ExtendedColorType::L8,
    )?;

    tracing::debug!(
        width = frame.width,
        height = frame.height,
        quality,
        bytes = buf.len(),
        "encoded frame as jpeg"
    );

    Ok(buf)
}
