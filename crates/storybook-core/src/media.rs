//! Media playback ports.
//!
//! Decoding, codecs and file formats belong to the host. The engine only
//! needs to load a clip, start it, learn when it ends, and stop it.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference to a narration or feedback audio clip (a path or asset key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipRef(String);

impl ClipRef {
    /// Creates a clip reference.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    /// Returns the clip source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClipRef {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

/// Failures reported by a media backend.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The clip source does not exist.
    #[error("clip not found: {0}")]
    NotFound(ClipRef),

    /// The clip could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Playback was refused (e.g. autoplay policy).
    #[error("playback not permitted: {0}")]
    PermissionDenied(String),

    /// The clip could not be fetched.
    #[error("network error: {0}")]
    Network(String),
}

/// A loaded clip that can be played once, awaited and stopped.
#[async_trait]
pub trait PlayableClip: Send {
    /// Starts playback.
    async fn play(&mut self) -> Result<(), MediaError>;

    /// Resolves when playback ends. May never resolve if the backend loses
    /// the finished signal.
    async fn finished(&mut self) -> Result<(), MediaError>;

    /// Stops playback and rewinds to the start.
    fn stop(&mut self);
}

/// Loads playable clips by reference.
pub trait MediaBackend: Send + Sync {
    /// Loads `clip` for playback.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` if the clip cannot be prepared.
    fn load(&self, clip: &ClipRef) -> Result<Box<dyn PlayableClip>, MediaError>;
}
