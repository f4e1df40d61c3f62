//! Scripted media: a `MediaBackend` whose clips behave as each test needs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use storybook_core::media::{ClipRef, MediaBackend, MediaError, PlayableClip};

/// How a scripted clip behaves once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipScript {
    /// Plays and fires its finished signal after the given duration.
    FinishAfter(Duration),
    /// Plays but never fires its finished signal.
    Hang,
    /// Fails at load time.
    FailToLoad,
    /// Loads but fails to start.
    FailToPlay,
    /// Loads but `play()` never returns.
    StallOnPlay,
    /// Plays, then reports a decode error after the given duration.
    ErrorAfter(Duration),
}

/// A call observed by the scripted backend, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCall {
    /// `play()` succeeded for the clip.
    Played(ClipRef),
    /// `stop()` was called for the clip.
    Stopped(ClipRef),
}

/// A media backend driven by per-clip scripts. Clips without a script use the
/// default.
#[derive(Debug, Clone)]
pub struct ScriptedMedia {
    default: ClipScript,
    scripts: HashMap<ClipRef, ClipScript>,
    calls: Arc<Mutex<Vec<MediaCall>>>,
}

impl ScriptedMedia {
    /// Create a backend where every clip follows `default`.
    #[must_use]
    pub fn new(default: ClipScript) -> Self {
        Self {
            default,
            scripts: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Override the script for one clip.
    #[must_use]
    pub fn with_clip(mut self, clip: &str, script: ClipScript) -> Self {
        self.scripts.insert(ClipRef::new(clip), script);
        self
    }

    /// Returns a snapshot of every call observed so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the clips that started playing, in order.
    #[must_use]
    pub fn played(&self) -> Vec<ClipRef> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MediaCall::Played(clip) => Some(clip),
                MediaCall::Stopped(_) => None,
            })
            .collect()
    }
}

impl MediaBackend for ScriptedMedia {
    fn load(&self, clip: &ClipRef) -> Result<Box<dyn PlayableClip>, MediaError> {
        let script = self.scripts.get(clip).copied().unwrap_or(self.default);
        if script == ClipScript::FailToLoad {
            return Err(MediaError::NotFound(clip.clone()));
        }
        Ok(Box::new(ScriptedClip {
            clip: clip.clone(),
            script,
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct ScriptedClip {
    clip: ClipRef,
    script: ClipScript,
    calls: Arc<Mutex<Vec<MediaCall>>>,
}

#[async_trait]
impl PlayableClip for ScriptedClip {
    async fn play(&mut self) -> Result<(), MediaError> {
        match self.script {
            ClipScript::FailToPlay => {
                return Err(MediaError::PermissionDenied(self.clip.to_string()));
            }
            ClipScript::StallOnPlay => std::future::pending::<()>().await,
            _ => {}
        }
        self.calls
            .lock()
            .unwrap()
            .push(MediaCall::Played(self.clip.clone()));
        Ok(())
    }

    async fn finished(&mut self) -> Result<(), MediaError> {
        match self.script {
            ClipScript::FinishAfter(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
            ClipScript::ErrorAfter(duration) => {
                tokio::time::sleep(duration).await;
                Err(MediaError::Decode(self.clip.to_string()))
            }
            ClipScript::Hang
            | ClipScript::FailToLoad
            | ClipScript::FailToPlay
            | ClipScript::StallOnPlay => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    fn stop(&mut self) {
        self.calls
            .lock()
            .unwrap()
            .push(MediaCall::Stopped(self.clip.clone()));
    }
}
