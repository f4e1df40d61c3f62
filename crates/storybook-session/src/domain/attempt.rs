//! The attempt record for one answer submission.

use chrono::{DateTime, Utc};
use serde::Serialize;
use storybook_core::answer::Answer;
use storybook_core::ids::PromptId;
use uuid::Uuid;

/// One recorded answer. Correctness is derived at construction and cannot
/// be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt<A> {
    session_id: Uuid,
    prompt_id: PromptId,
    chosen: A,
    correct_answer: A,
    is_correct: bool,
    recorded_at: DateTime<Utc>,
    tags: Vec<String>,
}

impl<A: Answer> Attempt<A> {
    /// Creates an attempt, deriving correctness from `chosen == correct_answer`.
    #[must_use]
    pub fn new(
        session_id: Uuid,
        prompt_id: PromptId,
        chosen: A,
        correct_answer: A,
        tags: Vec<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            prompt_id,
            chosen,
            correct_answer,
            is_correct: chosen == correct_answer,
            recorded_at,
            tags,
        }
    }

    /// Session this attempt belongs to.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Prompt that was answered.
    #[must_use]
    pub fn prompt_id(&self) -> &PromptId {
        &self.prompt_id
    }

    /// The learner's answer.
    #[must_use]
    pub fn chosen(&self) -> A {
        self.chosen
    }

    /// The expected answer.
    #[must_use]
    pub fn correct_answer(&self) -> A {
        self.correct_answer
    }

    /// Whether the answer was correct.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    /// When the answer was submitted.
    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Reporting tags copied from the prompt.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}
