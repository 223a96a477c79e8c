//! Face encoder seam and the reference thumbnail encoder.
//!
//! The backend turns each submitted image into an [`Embedding`] through a
//! [`FaceEncoder`]. [`ThumbnailEncoder`] is a deterministic stand-in: it
//! reduces the image to a small normalized grayscale thumbnail, so that
//! the same capture matches itself and visibly different captures do not.

use crate::types::Embedding;
use image::imageops::FilterType;
use thiserror::Error;

// --- Named constants ---
const THUMBNAIL_SIZE: u32 = 16;
/// Minimum luminance standard deviation for a thumbnail to count as a subject.
const THUMBNAIL_MIN_CONTRAST: f32 = 4.0;
const THUMBNAIL_MODEL_VERSION: &str = "thumbnail16";

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("invalid image file: {0}")]
    InvalidImage(String),
}

/// Turns an uploaded image into a face embedding.
pub trait FaceEncoder: Send {
    /// Returns `Ok(None)` when the image decodes but contains no face.
    fn encode(&mut self, image: &[u8]) -> Result<Option<Embedding>, EncoderError>;
}

/// Grayscale-thumbnail encoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThumbnailEncoder;

impl FaceEncoder for ThumbnailEncoder {
    fn encode(&mut self, image: &[u8]) -> Result<Option<Embedding>, EncoderError> {
        let decoded =
            image::load_from_memory(image).map_err(|e| EncoderError::InvalidImage(e.to_string()))?;

        if decoded.width() == 0 || decoded.height() == 0 {
            return Ok(None);
        }

        let gray = decoded.to_luma8();
        let thumb =
            image::imageops::resize(&gray, THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle);
        let raw: Vec<f32> = thumb.as_raw().iter().map(|&p| p as f32).collect();

        let n = raw.len() as f32;
        let mean = raw.iter().sum::<f32>() / n;
        let stddev = (raw.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n).sqrt();

        tracing::debug!(
            width = decoded.width(),
            height = decoded.height(),
            mean,
            stddev,
            "thumbnail computed"
        );

        if stddev < THUMBNAIL_MIN_CONTRAST {
            return Ok(None);
        }

        // Mean-centre then L2-normalize
        let centred: Vec<f32> = raw.iter().map(|v| v - mean).collect();
        let norm = centred.iter().map(|v| v * v).sum::<f32>().sqrt();
        let values = centred.iter().map(|v| v / norm).collect();

        Ok(Some(Embedding {
            values,
            model_version: Some(THUMBNAIL_MODEL_VERSION.to_string()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn png(img: &GrayImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn gradient(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, _| Luma([(x * 255 / w.max(1)) as u8]))
    }

    #[test]
    fn test_rejects_non_image_bytes() {
        let err = ThumbnailEncoder.encode(b"definitely not a jpeg").unwrap_err();
        assert!(matches!(err, EncoderError::InvalidImage(_)));
    }

    #[test]
    fn test_flat_image_has_no_face() {
        let flat = GrayImage::from_pixel(64, 48, Luma([120]));
        assert!(ThumbnailEncoder.encode(&png(&flat)).unwrap().is_none());
    }

    #[test]
    fn test_embedding_is_normalized() {
        let emb = ThumbnailEncoder.encode(&png(&gradient(64, 48))).unwrap().unwrap();
        assert_eq!(emb.values.len(), (THUMBNAIL_SIZE * THUMBNAIL_SIZE) as usize);
        let norm: f32 = emb.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm = {norm}");
    }

    #[test]
    fn test_same_image_matches_itself_and_not_its_mirror() {
        let img = gradient(64, 48);
        let mirrored = image::imageops::flip_horizontal(&img);

        let a = ThumbnailEncoder.encode(&png(&img)).unwrap().unwrap();
        let b = ThumbnailEncoder.encode(&png(&img)).unwrap().unwrap();
        let c = ThumbnailEncoder.encode(&png(&mirrored)).unwrap().unwrap();

        assert!((a.similarity(&b) - 1.0).abs() < 1e-5);
        assert!(a.similarity(&c) < 0.0);
    }
}
