use crate::api::EventId;
use serde::{Deserialize, Serialize};

/// Face embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Encoder that produced this embedding (e.g., "thumbnail16").
    pub model_version: Option<String>,
}

impl Embedding {
    /// Cosine of the angle between two embeddings, in [-1, 1].
    ///
    /// Zero when either side has no magnitude.
    pub fn similarity(&self, other: &Embedding) -> f32 {
        let (dot, self_sq, other_sq) = self
            .values
            .iter()
            .zip(&other.values)
            .fold((0.0f32, 0.0f32, 0.0f32), |(dot, s, o), (a, b)| {
                (dot + a * b, s + a * a, o + b * b)
            });

        let magnitude = (self_sq * other_sq).sqrt();
        if magnitude > 0.0 {
            dot / magnitude
        } else {
            0.0
        }
    }
}

/// A person registered under an event, with the submitted image.
#[derive(Debug, Clone)]
pub struct FaceRecord {
    pub id: i64,
    pub name: String,
    pub event_id: EventId,
    pub embedding: Embedding,
    /// JPEG bytes as submitted at registration.
    pub image: Vec<u8>,
    pub created_at: String,
}

/// Best candidate found for a query face within one event's gallery.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matched: bool,
    /// Similarity of the closest gallery entry; 0.0 for an empty gallery.
    pub similarity: f32,
    /// Gallery position of the accepted entry.
    pub index: Option<usize>,
}

/// Compares a query face against the faces registered for one event.
///
/// Shared across request handlers, so implementations must be thread-safe.
pub trait Matcher: Send + Sync {
    fn compare(&self, query: &Embedding, gallery: &[&FaceRecord], threshold: f32) -> MatchResult;
}

/// Scans the whole gallery and accepts the closest entry when it reaches the threshold.
pub struct CosineMatcher;

impl Matcher for CosineMatcher {
    fn compare(&self, query: &Embedding, gallery: &[&FaceRecord], threshold: f32) -> MatchResult {
        let closest = gallery
            .iter()
            .map(|record| query.similarity(&record.embedding))
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, sim)| match best {
                Some((_, best_sim)) if best_sim >= sim => best,
                _ => Some((i, sim)),
            });

        match closest {
            Some((index, similarity)) if similarity >= threshold => MatchResult {
                matched: true,
                similarity,
                index: Some(index),
            },
            Some((_, similarity)) => MatchResult { matched: false, similarity, index: None },
            None => MatchResult { matched: false, similarity: 0.0, index: None },
        }
    }
}
