//! YAML game definitions.
//!
//! A definition carries everything the runner needs to play one mini-game:
//! the engine configuration, how each simulated clip behaves, and what the
//! scripted learner answers. Answers are written as labels and resolved
//! against the alphabet named in the definition.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use storybook_audio::SequencerConfig;
use storybook_core::answer::Answer;
use storybook_core::ids::PromptId;
use storybook_core::media::ClipRef;
use storybook_interaction::domain::config::{EngineTimings, GameConfig, RetryMode};
use storybook_interaction::domain::prompt::{FeedbackClips, Prompt};

use crate::error::AppError;

/// Length of a simulated clip that has no entry of its own.
const DEFAULT_CLIP_MS: u64 = 800;

/// Which built-in answer alphabet a game uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphabetKind {
    /// `yes` / `no`.
    YesNo,
    /// `private` / `public`.
    Visibility,
    /// `up` / `down`.
    Thumbs,
    /// `safe` / `unsafe`.
    Safety,
}

/// Behaviour after a wrong answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryDefinition {
    /// Narrate the prompt again.
    #[default]
    Renarrate,
    /// Re-open answers without narration.
    AwaitAgain,
}

impl From<RetryDefinition> for RetryMode {
    fn from(retry: RetryDefinition) -> Self {
        match retry {
            RetryDefinition::Renarrate => Self::Renarrate,
            RetryDefinition::AwaitAgain => Self::AwaitAgain,
        }
    }
}

/// Timing overrides in milliseconds. Missing values keep the engine
/// defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingsDefinition {
    pub intro_delay_ms: Option<u64>,
    pub post_narration_delay_ms: Option<u64>,
    pub feedback_delay_ms: Option<u64>,
    pub celebration_ms: Option<u64>,
    pub inter_clip_pause_ms: Option<u64>,
    pub clip_fallback_ms: Option<u64>,
}

impl TimingsDefinition {
    fn apply(&self, timings: &mut EngineTimings, sequencer: &mut SequencerConfig) {
        let overrides = [
            (self.intro_delay_ms, &mut timings.intro_delay),
            (self.post_narration_delay_ms, &mut timings.post_narration_delay),
            (self.feedback_delay_ms, &mut timings.feedback_delay),
            (self.celebration_ms, &mut timings.celebration_duration),
            (self.inter_clip_pause_ms, &mut sequencer.inter_clip_pause),
            (self.clip_fallback_ms, &mut sequencer.clip_fallback),
        ];
        for (millis, slot) in overrides {
            if let Some(millis) = millis {
                *slot = Duration::from_millis(millis);
            }
        }
    }
}

/// Feedback narration by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedbackDefinition {
    #[serde(default)]
    pub correct: Vec<ClipRef>,
    #[serde(default)]
    pub incorrect: Vec<ClipRef>,
}

impl From<&FeedbackDefinition> for FeedbackClips {
    fn from(feedback: &FeedbackDefinition) -> Self {
        Self {
            correct: feedback.correct.clone(),
            incorrect: feedback.incorrect.clone(),
        }
    }
}

/// One prompt as authored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptDefinition {
    pub id: PromptId,
    /// Label of the correct answer.
    pub correct: String,
    #[serde(default)]
    pub narration: Vec<ClipRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub feedback: Option<FeedbackDefinition>,
}

/// A simulated clip failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipFault {
    /// The clip fails to load.
    Fail,
    /// The clip plays but never reports that it finished.
    Hang,
}

/// How a simulated clip behaves: a length in milliseconds, or a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ClipBehaviour {
    Millis(u64),
    Fault(ClipFault),
}

/// The simulated media library.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaDefinition {
    #[serde(default = "default_clip_ms")]
    pub default_ms: u64,
    #[serde(default)]
    pub clips: HashMap<ClipRef, ClipBehaviour>,
}

impl Default for MediaDefinition {
    fn default() -> Self {
        Self {
            default_ms: DEFAULT_CLIP_MS,
            clips: HashMap::new(),
        }
    }
}

fn default_clip_ms() -> u64 {
    DEFAULT_CLIP_MS
}

/// A complete mini-game definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameDefinition {
    pub id: String,
    pub alphabet: AlphabetKind,
    /// Seeds the prompt shuffle; unseeded games shuffle differently per run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub retry: RetryDefinition,
    #[serde(default)]
    pub timings: TimingsDefinition,
    #[serde(default)]
    pub intro: Vec<ClipRef>,
    #[serde(default)]
    pub celebration: Vec<ClipRef>,
    #[serde(default)]
    pub feedback: FeedbackDefinition,
    #[serde(default)]
    pub prompts: Vec<PromptDefinition>,
    #[serde(default)]
    pub media: MediaDefinition,
    /// Answer labels the scripted learner gives, per prompt, in order.
    #[serde(default)]
    pub learner: HashMap<PromptId, Vec<String>>,
}

impl GameDefinition {
    /// Parses a definition from YAML.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Yaml` if the source does not match the expected
    /// shape.
    pub fn parse(source: &str) -> Result<Self, AppError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Builds the engine configuration, resolving answer labels against `A`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Definition` for an unknown answer label and
    /// `AppError::Domain` if the resulting configuration is invalid.
    pub fn game_config<A: Answer>(
        &self,
        content_version: Option<String>,
    ) -> Result<GameConfig<A>, AppError> {
        let prompts = self
            .prompts
            .iter()
            .map(|definition| {
                let correct = parse_label(&definition.correct)?;
                let mut prompt = Prompt::new(definition.id.as_str(), correct)
                    .with_narration(definition.narration.iter().cloned())
                    .with_payload(definition.payload.clone());
                if let Some(feedback) = &definition.feedback {
                    prompt = prompt.with_feedback(feedback.into());
                }
                Ok(definition
                    .tags
                    .iter()
                    .fold(prompt, |prompt, tag| prompt.with_tag(tag.as_str())))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let mut config = GameConfig::new(self.id.as_str(), prompts);
        config.content_version = content_version;
        config.intro.clone_from(&self.intro);
        config.celebration.clone_from(&self.celebration);
        config.feedback = (&self.feedback).into();
        config.shuffle = self.shuffle;
        config.retry = self.retry.into();
        self.timings.apply(&mut config.timings, &mut config.sequencer);
        config.validate()?;
        Ok(config)
    }

    /// Resolves the learner script against `A`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Definition` for an unknown answer label or a
    /// script entry naming a prompt the game does not have.
    pub fn learner_script<A: Answer>(&self) -> Result<HashMap<PromptId, Vec<A>>, AppError> {
        self.learner
            .iter()
            .map(|(prompt_id, labels)| {
                if !self.prompts.iter().any(|prompt| prompt.id == *prompt_id) {
                    return Err(AppError::Definition(format!(
                        "learner answers unknown prompt {prompt_id}"
                    )));
                }
                let answers = labels
                    .iter()
                    .map(|label| parse_label(label))
                    .collect::<Result<Vec<A>, _>>()?;
                Ok((prompt_id.clone(), answers))
            })
            .collect()
    }
}

/// SHA-256 of the definition source, as lowercase hex.
#[must_use]
pub fn content_version(source: &str) -> String {
    format!("{:x}", Sha256::digest(source.as_bytes()))
}

fn parse_label<A: Answer>(label: &str) -> Result<A, AppError> {
    A::from_label(label).ok_or_else(|| {
        let expected: Vec<&str> = A::alphabet().iter().map(Answer::label).collect();
        AppError::Definition(format!(
            "unknown answer label {label:?}, expected one of {}",
            expected.join(", ")
        ))
    })
}
