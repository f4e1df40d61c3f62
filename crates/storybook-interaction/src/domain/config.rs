//! Per-mini-game configuration.

use std::collections::HashSet;
use std::time::Duration;

use storybook_audio::SequencerConfig;
use storybook_core::answer::Answer;
use storybook_core::error::DomainError;
use storybook_core::media::ClipRef;

use super::prompt::{FeedbackClips, Prompt};

/// What happens after an incorrect answer. Either way the same prompt is
/// retried; there is no retry cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryMode {
    /// Narrate the prompt again before re-opening answers.
    #[default]
    Renarrate,
    /// Re-open answers straight after the feedback.
    AwaitAgain,
}

/// Fixed waits between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTimings {
    /// Wait after the intro clips (the whole intro when there are none).
    pub intro_delay: Duration,
    /// Wait after prompt narration before answers open.
    pub post_narration_delay: Duration,
    /// Wait after feedback narration before moving on.
    pub feedback_delay: Duration,
    /// Wait after the celebration clips before the session completes.
    pub celebration_duration: Duration,
}

impl Default for EngineTimings {
    fn default() -> Self {
        Self {
            intro_delay: Duration::from_secs(1),
            post_narration_delay: Duration::from_millis(300),
            feedback_delay: Duration::from_millis(500),
            celebration_duration: Duration::from_secs(3),
        }
    }
}

/// Everything that distinguishes one mini-game from another.
#[derive(Debug, Clone)]
pub struct GameConfig<A> {
    /// Mini-game identifier, copied into reports.
    pub game_id: String,
    /// Fingerprint of the content definition, copied into reports.
    pub content_version: Option<String>,
    /// Prompts in authored order.
    pub prompts: Vec<Prompt<A>>,
    /// Intro narration.
    pub intro: Vec<ClipRef>,
    /// Celebration narration.
    pub celebration: Vec<ClipRef>,
    /// Default feedback narration.
    pub feedback: FeedbackClips,
    /// Shuffle the prompt order once per play-through.
    pub shuffle: bool,
    /// Behaviour after an incorrect answer.
    pub retry: RetryMode,
    /// Phase waits.
    pub timings: EngineTimings,
    /// Narration timings.
    pub sequencer: SequencerConfig,
}

impl<A: Answer> GameConfig<A> {
    /// Creates a configuration with default timings and no narration.
    #[must_use]
    pub fn new(game_id: impl Into<String>, prompts: Vec<Prompt<A>>) -> Self {
        Self {
            game_id: game_id.into(),
            content_version: None,
            prompts,
            intro: Vec::new(),
            celebration: Vec::new(),
            feedback: FeedbackClips::default(),
            shuffle: false,
            retry: RetryMode::default(),
            timings: EngineTimings::default(),
            sequencer: SequencerConfig::default(),
        }
    }

    /// Number of prompts as the session counter type.
    #[must_use]
    pub fn total_prompts(&self) -> u32 {
        u32::try_from(self.prompts.len()).unwrap_or(u32::MAX)
    }

    /// Checks the configuration before an engine is built from it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` for an empty game id,
    /// duplicate prompt ids, too many prompts, or a zero clip fallback.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.game_id.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "game id must not be empty".to_owned(),
            ));
        }
        if u32::try_from(self.prompts.len()).is_err() {
            return Err(DomainError::InvalidConfiguration(format!(
                "too many prompts: {}",
                self.prompts.len()
            )));
        }
        if self.sequencer.clip_fallback.is_zero() {
            return Err(DomainError::InvalidConfiguration(
                "clip fallback must be greater than zero".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for prompt in &self.prompts {
            if !seen.insert(&prompt.id) {
                return Err(DomainError::InvalidConfiguration(format!(
                    "duplicate prompt id: {}",
                    prompt.id
                )));
            }
        }
        Ok(())
    }
}
