//! Append-only attempt log for the live session.

use storybook_core::answer::Answer;
use storybook_core::clock::Clock;
use storybook_core::ids::PromptId;
use tracing::debug;
use uuid::Uuid;

use crate::domain::attempt::Attempt;

/// Records every answer submitted during one session, in order.
#[derive(Debug)]
pub struct AttemptRecorder<A> {
    attempts: Vec<Attempt<A>>,
}

impl<A> Default for AttemptRecorder<A> {
    fn default() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }
}

impl<A: Answer> AttemptRecorder<A> {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attempt and returns a copy of it.
    pub fn record(
        &mut self,
        session_id: Uuid,
        prompt_id: &PromptId,
        chosen: A,
        correct: A,
        tags: &[String],
        clock: &dyn Clock,
    ) -> Attempt<A> {
        let attempt = Attempt::new(
            session_id,
            prompt_id.clone(),
            chosen,
            correct,
            tags.to_vec(),
            clock.now(),
        );
        debug!(
            prompt = %prompt_id,
            chosen = chosen.label(),
            correct = attempt.is_correct(),
            "attempt recorded"
        );
        self.attempts.push(attempt.clone());
        attempt
    }

    /// Returns the full ordered log.
    #[must_use]
    pub fn attempts(&self) -> &[Attempt<A>] {
        &self.attempts
    }

    /// Discards the log. Only called when a new session starts.
    pub fn clear(&mut self) {
        self.attempts.clear();
    }
}
