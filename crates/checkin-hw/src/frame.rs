//! Frame type and raw buffer conversions.

/// A captured grayscale frame.
#[derive(Clone)]
pub struct Frame {
    /// One luma byte per pixel, row-major.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub sequence: u32,
}

impl Frame {
    /// True when the frame has no pixels to paint.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

/// First `width * height * 2` bytes of a two-byte-per-pixel buffer.
fn two_byte_pixels(buf: &[u8], width: u32, height: u32) -> Result<&[u8], FrameError> {
    let expected = width as usize * height as usize * 2;
    buf.get(..expected).ok_or(FrameError::InvalidLength {
        expected,
        actual: buf.len(),
    })
}

/// Luma plane of packed YUYV 4:2:2 (`Y0 U Y1 V`): the even bytes.
pub fn yuyv_to_grayscale(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let pixels = two_byte_pixels(yuyv, width, height)?;
    Ok(pixels.chunks_exact(2).map(|px| px[0]).collect())
}

/// 16-bit little-endian grayscale narrowed to its high byte.
pub fn y16_to_grayscale(y16: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let pixels = two_byte_pixels(y16, width, height)?;
    Ok(pixels.chunks_exact(2).map(|px| px[1]).collect())
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
