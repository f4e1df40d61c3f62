//! Simulated media backend.
//!
//! Clips are silent timers: each "plays" for its configured length, or
//! misbehaves the way the definition says so that fallback and skip paths
//! can be exercised without real audio.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use storybook_core::media::{ClipRef, MediaBackend, MediaError, PlayableClip};
use tracing::debug;

use crate::definition::{ClipBehaviour, ClipFault, MediaDefinition};

/// A media backend whose clips are timers.
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    default_length: Duration,
    clips: HashMap<ClipRef, ClipBehaviour>,
}

impl SimulatedMedia {
    /// Builds the backend from the definition's media section.
    #[must_use]
    pub fn from_definition(media: &MediaDefinition) -> Self {
        Self {
            default_length: Duration::from_millis(media.default_ms),
            clips: media.clips.clone(),
        }
    }
}

impl MediaBackend for SimulatedMedia {
    fn load(&self, clip: &ClipRef) -> Result<Box<dyn PlayableClip>, MediaError> {
        let length = match self.clips.get(clip) {
            None => Some(self.default_length),
            Some(ClipBehaviour::Millis(millis)) => Some(Duration::from_millis(*millis)),
            Some(ClipBehaviour::Fault(ClipFault::Hang)) => None,
            Some(ClipBehaviour::Fault(ClipFault::Fail)) => {
                return Err(MediaError::Decode(format!("{clip}: simulated failure")));
            }
        };
        Ok(Box::new(SimulatedClip {
            clip: clip.clone(),
            length,
        }))
    }
}

struct SimulatedClip {
    clip: ClipRef,
    /// `None` never finishes.
    length: Option<Duration>,
}

#[async_trait]
impl PlayableClip for SimulatedClip {
    async fn play(&mut self) -> Result<(), MediaError> {
        debug!(clip = %self.clip, length = ?self.length, "simulated clip playing");
        Ok(())
    }

    async fn finished(&mut self) -> Result<(), MediaError> {
        match self.length {
            Some(length) => tokio::time::sleep(length).await,
            None => std::future::pending::<()>().await,
        }
        Ok(())
    }

    fn stop(&mut self) {
        debug!(clip = %self.clip, "simulated clip stopped");
    }
}
