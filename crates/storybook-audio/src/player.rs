//! Single-clip playback with a fallback timeout.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use storybook_core::media::{ClipRef, MediaBackend, PlayableClip};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How a single clip wait resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueOutcome {
    /// The clip fired its finished signal.
    Finished,
    /// The finished signal did not arrive before the fallback timeout.
    TimedOut,
    /// The clip could not be loaded or played; treated as finished.
    Failed,
    /// The wait was cancelled and the clip stopped.
    Cancelled,
}

impl CueOutcome {
    /// Whether narration should carry on as if the clip had finished.
    #[must_use]
    pub fn counts_as_finished(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// Owns the one audible clip of an engine instance.
///
/// Starting a clip stops and rewinds whatever this player was holding, so a
/// late play request always preempts an earlier one.
pub struct AudioCuePlayer {
    backend: Arc<dyn MediaBackend>,
    current: Option<(ClipRef, Box<dyn PlayableClip>)>,
}

impl fmt::Debug for AudioCuePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioCuePlayer")
            .field("current", &self.current.as_ref().map(|(clip, _)| clip))
            .finish_non_exhaustive()
    }
}

impl AudioCuePlayer {
    /// Creates a player over the given media backend.
    #[must_use]
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    /// Returns the clip this player currently holds, if any.
    #[must_use]
    pub fn current_clip(&self) -> Option<&ClipRef> {
        self.current.as_ref().map(|(clip, _)| clip)
    }

    /// Stops and releases the current clip.
    pub fn stop(&mut self) {
        if let Some((clip, mut handle)) = self.current.take() {
            debug!(clip = %clip, "stopping clip");
            handle.stop();
        }
    }

    /// Plays `clip` and waits for whichever comes first: its finished signal,
    /// the `fallback` timeout, or cancellation.
    ///
    /// Starting the clip races the same cancellation and fallback as its
    /// finished signal, so a backend that never acknowledges `play()` cannot
    /// hold the caller. Media errors, and a clip that had not started when the
    /// fallback elapsed, are logged and reported as [`CueOutcome::Failed`]. A
    /// timed-out clip that did start is left playing until the next clip or
    /// `stop()`.
    pub async fn play(
        &mut self,
        clip: &ClipRef,
        fallback: Duration,
        cancel: &CancellationToken,
    ) -> CueOutcome {
        self.stop();
        if cancel.is_cancelled() {
            return CueOutcome::Cancelled;
        }

        let handle = match self.backend.load(clip) {
            Ok(handle) => handle,
            Err(err) => {
                warn!(clip = %clip, error = %err, "failed to load clip, skipping");
                return CueOutcome::Failed;
            }
        };

        let mut started = false;
        let (_, playing) = self.current.insert((clip.clone(), handle));
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => CueOutcome::Cancelled,
            outcome = start_and_wait(&mut **playing, clip, &mut started) => outcome,
            () = tokio::time::sleep(fallback) => CueOutcome::TimedOut,
        };

        let outcome = match outcome {
            CueOutcome::TimedOut if !started => {
                warn!(clip = %clip, ?fallback, "clip did not start in time, skipping");
                CueOutcome::Failed
            }
            CueOutcome::TimedOut => {
                debug!(clip = %clip, ?fallback, "finished signal missing, using fallback");
                CueOutcome::TimedOut
            }
            other => other,
        };
        if outcome != CueOutcome::TimedOut {
            self.stop();
        }
        outcome
    }
}

/// Starts `handle` and waits for its finished signal. `started` flips once
/// the backend has accepted the play request.
async fn start_and_wait(
    handle: &mut dyn PlayableClip,
    clip: &ClipRef,
    started: &mut bool,
) -> CueOutcome {
    if let Err(err) = handle.play().await {
        warn!(clip = %clip, error = %err, "failed to start clip, skipping");
        return CueOutcome::Failed;
    }
    *started = true;
    match handle.finished().await {
        Ok(()) => CueOutcome::Finished,
        Err(err) => {
            warn!(clip = %clip, error = %err, "clip failed during playback");
            CueOutcome::Failed
        }
    }
}
