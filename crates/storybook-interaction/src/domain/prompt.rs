//! Prompts and feedback clips.

use storybook_core::answer::Answer;
use storybook_core::ids::PromptId;
use storybook_core::media::ClipRef;

/// Clips played after an answer, by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackClips {
    /// Played after a correct answer.
    pub correct: Vec<ClipRef>,
    /// Played after an incorrect answer, before the retry.
    pub incorrect: Vec<ClipRef>,
}

impl FeedbackClips {
    /// Clips for the given outcome.
    #[must_use]
    pub fn for_outcome(&self, was_correct: bool) -> &[ClipRef] {
        if was_correct {
            &self.correct
        } else {
            &self.incorrect
        }
    }
}

/// One question or situation in a mini-game.
///
/// The payload belongs to the presentation layer (image keys, captions,
/// drag targets) and is carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt<A> {
    /// Stable identifier.
    pub id: PromptId,
    /// Opaque display payload.
    pub payload: serde_json::Value,
    /// Narration clips, played in order.
    pub narration: Vec<ClipRef>,
    /// The expected answer.
    pub correct: A,
    /// Feedback clips overriding the game defaults.
    pub feedback: Option<FeedbackClips>,
    /// Reporting-only tags (e.g. `sensitive`).
    pub tags: Vec<String>,
}

impl<A: Answer> Prompt<A> {
    /// Creates a prompt with no narration, payload or tags.
    #[must_use]
    pub fn new(id: impl Into<String>, correct: A) -> Self {
        Self {
            id: PromptId::new(id),
            payload: serde_json::Value::Null,
            narration: Vec::new(),
            correct,
            feedback: None,
            tags: Vec::new(),
        }
    }

    /// Sets the narration clips.
    #[must_use]
    pub fn with_narration<I, C>(mut self, clips: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ClipRef>,
    {
        self.narration = clips.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the display payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Overrides the game's feedback clips for this prompt.
    #[must_use]
    pub fn with_feedback(mut self, feedback: FeedbackClips) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Adds a reporting tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}
