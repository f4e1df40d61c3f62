//! Ordered narration playback.
//!
//! A sequence is a plain loop over its clips: play, wait (bounded by the
//! fallback timeout), pause, repeat. Cancellation is checked at every
//! suspension point, so a cancelled sequence can neither start another clip
//! nor report completion.

use std::time::Duration;

use storybook_core::media::ClipRef;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::player::{AudioCuePlayer, CueOutcome};

/// Timing parameters for a narration sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Silence inserted between consecutive clips.
    pub inter_clip_pause: Duration,
    /// Upper bound on how long a single clip is awaited.
    pub clip_fallback: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            inter_clip_pause: Duration::from_millis(500),
            clip_fallback: Duration::from_secs(10),
        }
    }
}

/// Per-clip tally of a completed sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceReport {
    /// Clips that fired their finished signal.
    pub finished: usize,
    /// Clips released by the fallback timeout.
    pub timed_out: usize,
    /// Clips skipped because of media errors.
    pub failed: usize,
}

impl SequenceReport {
    fn tally(&mut self, outcome: CueOutcome) {
        match outcome {
            CueOutcome::Finished => self.finished += 1,
            CueOutcome::TimedOut => self.timed_out += 1,
            CueOutcome::Failed => self.failed += 1,
            CueOutcome::Cancelled => {}
        }
    }
}

/// How a sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// Every clip was played (or skipped) in order.
    Completed(SequenceReport),
    /// The sequence was cancelled before it finished.
    Cancelled {
        /// Index of the clip that was playing, or next in line, when the
        /// cancellation landed.
        position: usize,
    },
}

/// Chains clips through an [`AudioCuePlayer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioCueSequencer {
    config: SequencerConfig,
}

impl AudioCueSequencer {
    /// Creates a sequencer with the given timings.
    #[must_use]
    pub fn new(config: SequencerConfig) -> Self {
        Self { config }
    }

    /// Returns the sequencer timings.
    #[must_use]
    pub fn config(&self) -> SequencerConfig {
        self.config
    }

    /// Plays `clips` in order, pausing between them.
    ///
    /// Clip `n + 1` never starts before clip `n` resolves. An empty list
    /// completes immediately.
    #[instrument(skip_all, fields(clips = clips.len()))]
    pub async fn play_all(
        &self,
        player: &mut AudioCuePlayer,
        clips: &[ClipRef],
        cancel: &CancellationToken,
    ) -> SequenceOutcome {
        let mut report = SequenceReport::default();

        for (position, clip) in clips.iter().enumerate() {
            if position > 0 && !self.config.inter_clip_pause.is_zero() {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return cancelled(player, position),
                    () = tokio::time::sleep(self.config.inter_clip_pause) => {}
                }
            }

            let outcome = player.play(clip, self.config.clip_fallback, cancel).await;
            if !outcome.counts_as_finished() {
                return cancelled(player, position);
            }
            report.tally(outcome);
        }

        if cancel.is_cancelled() {
            return cancelled(player, clips.len());
        }
        debug!(?report, "narration sequence completed");
        SequenceOutcome::Completed(report)
    }

    /// Plays `clips` and invokes `on_complete` once when the sequence
    /// completes. The callback is dropped uncalled if the sequence is
    /// cancelled. Returns whether the callback ran.
    pub async fn play_then<F>(
        &self,
        player: &mut AudioCuePlayer,
        clips: &[ClipRef],
        cancel: &CancellationToken,
        on_complete: F,
    ) -> bool
    where
        F: FnOnce(SequenceReport),
    {
        match self.play_all(player, clips, cancel).await {
            SequenceOutcome::Completed(report) => {
                on_complete(report);
                true
            }
            SequenceOutcome::Cancelled { .. } => false,
        }
    }
}

fn cancelled(player: &mut AudioCuePlayer, position: usize) -> SequenceOutcome {
    debug!(position, held = ?player.current_clip(), "narration sequence cancelled");
    player.stop();
    SequenceOutcome::Cancelled { position }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use storybook_test_support::{ClipScript, MediaCall, ScriptedMedia};
    use tokio::time::Instant;

    fn clips(names: &[&str]) -> Vec<ClipRef> {
        names.iter().map(|name| ClipRef::new(*name)).collect()
    }

    fn sequencer(pause_ms: u64, fallback_secs: u64) -> AudioCueSequencer {
        AudioCueSequencer::new(SequencerConfig {
            inter_clip_pause: Duration::from_millis(pause_ms),
            clip_fallback: Duration::from_secs(fallback_secs),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_all_plays_clips_in_order_with_pauses() {
        // Arrange
        let media = ScriptedMedia::new(ClipScript::FinishAfter(Duration::from_secs(1)));
        let mut player = AudioCuePlayer::new(Arc::new(media.clone()));
        let started = Instant::now();

        // Act
        let outcome = sequencer(500, 10)
            .play_all(&mut player, &clips(&["a", "b", "c"]), &CancellationToken::new())
            .await;

        // Assert
        assert_eq!(
            outcome,
            SequenceOutcome::Completed(SequenceReport {
                finished: 3,
                timed_out: 0,
                failed: 0,
            })
        );
        assert_eq!(media.played(), clips(&["a", "b", "c"]));
        assert_eq!(started.elapsed(), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_clips_complete_within_fallback_bound() {
        // Arrange
        let media = ScriptedMedia::new(ClipScript::Hang);
        let mut player = AudioCuePlayer::new(Arc::new(media));
        let started = Instant::now();

        // Act
        let outcome = sequencer(0, 10)
            .play_all(&mut player, &clips(&["a", "b", "c"]), &CancellationToken::new())
            .await;

        // Assert
        assert_eq!(
            outcome,
            SequenceOutcome::Completed(SequenceReport {
                finished: 0,
                timed_out: 3,
                failed: 0,
            })
        );
        assert!(started.elapsed() <= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_clips_are_skipped_without_blocking() {
        let media = ScriptedMedia::new(ClipScript::FinishAfter(Duration::from_secs(1)))
            .with_clip("broken", ClipScript::FailToLoad);
        let mut player = AudioCuePlayer::new(Arc::new(media.clone()));

        let outcome = sequencer(0, 10)
            .play_all(&mut player, &clips(&["a", "broken", "c"]), &CancellationToken::new())
            .await;

        assert_eq!(
            outcome,
            SequenceOutcome::Completed(SequenceReport {
                finished: 2,
                timed_out: 0,
                failed: 1,
            })
        );
        assert_eq!(media.played(), clips(&["a", "c"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_sequence_completes_immediately() {
        let media = ScriptedMedia::new(ClipScript::Hang);
        let mut player = AudioCuePlayer::new(Arc::new(media));

        let outcome = sequencer(500, 10)
            .play_all(&mut player, &[], &CancellationToken::new())
            .await;

        assert_eq!(outcome, SequenceOutcome::Completed(SequenceReport::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_clip_never_invokes_callback() {
        // Arrange
        let media = ScriptedMedia::new(ClipScript::Hang);
        let mut player = AudioCuePlayer::new(Arc::new(media.clone()));
        let token = CancellationToken::new();
        let canceller = token.clone();
        let calls = AtomicUsize::new(0);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            canceller.cancel();
        });

        // Act
        let ran = sequencer(0, 10)
            .play_then(&mut player, &clips(&["a", "b"]), &token, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        // Assert
        assert!(!ran);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(media.played(), clips(&["a"]));
        assert_eq!(media.calls().last(), Some(&MediaCall::Stopped("a".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_pause_prevents_next_clip() {
        // Arrange
        let media = ScriptedMedia::new(ClipScript::FinishAfter(Duration::from_secs(1)));
        let mut player = AudioCuePlayer::new(Arc::new(media.clone()));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            canceller.cancel();
        });

        // Act
        let outcome = sequencer(2000, 10)
            .play_all(&mut player, &clips(&["a", "b"]), &token)
            .await;

        // Assert
        assert_eq!(outcome, SequenceOutcome::Cancelled { position: 1 });
        assert_eq!(media.played(), clips(&["a"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reports_the_clip_it_interrupted() {
        // Arrange
        let media = ScriptedMedia::new(ClipScript::FinishAfter(Duration::from_secs(1)))
            .with_clip("c", ClipScript::Hang);
        let mut player = AudioCuePlayer::new(Arc::new(media.clone()));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            canceller.cancel();
        });

        // Act
        let outcome = sequencer(0, 10)
            .play_all(&mut player, &clips(&["a", "b", "c", "d"]), &token)
            .await;

        // Assert
        assert_eq!(outcome, SequenceOutcome::Cancelled { position: 2 });
        assert_eq!(media.played(), clips(&["a", "b", "c"]));
        assert_eq!(media.calls().last(), Some(&MediaCall::Stopped("c".into())));
        assert!(player.current_clip().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_then_invokes_callback_once_on_completion() {
        let media = ScriptedMedia::new(ClipScript::FinishAfter(Duration::from_millis(200)));
        let mut player = AudioCuePlayer::new(Arc::new(media));
        let mut reports = Vec::new();

        let ran = sequencer(100, 10)
            .play_then(&mut player, &clips(&["a", "b"]), &CancellationToken::new(), |report| {
                reports.push(report);
            })
            .await;

        assert!(ran);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].finished, 2);
    }
}
