//! checkin-core: Shared types for the face check-in client and backend.
//!
//! Holds the REST wire contract, face embeddings with the cosine matcher,
//! and the [`FaceEncoder`] seam the backend uses to turn images into
//! embeddings.

pub mod api;
pub mod encoder;
pub mod types;

pub use api::{Event, EventId};
pub use encoder::{FaceEncoder, ThumbnailEncoder};
pub use types::{CosineMatcher, Embedding, FaceRecord, MatchResult, Matcher};
