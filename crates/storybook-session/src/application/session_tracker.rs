//! Lifecycle of the live session.

use storybook_core::clock::Clock;
use storybook_core::error::DomainError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::session::{Session, percentage_score};

/// Owns the single live session of an engine instance.
#[derive(Debug, Default)]
pub struct SessionTracker {
    current: Option<Session>,
}

impl SessionTracker {
    /// Creates a tracker with no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new session, replacing any previous one.
    pub fn start(&mut self, total_prompts: u32, clock: &dyn Clock) -> Session {
        let session = Session::new(Uuid::new_v4(), total_prompts, clock.now());
        info!(session_id = %session.id(), total_prompts, "session started");
        self.current = Some(session.clone());
        session
    }

    /// Returns the live session, if one was started.
    #[must_use]
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// Increments the running score and returns it. Never exceeds the
    /// session's prompt count.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no session has been started.
    pub fn record_correct(&mut self) -> Result<u32, DomainError> {
        let session = self
            .current
            .as_mut()
            .ok_or_else(|| DomainError::Validation("no live session".to_owned()))?;
        if session.correct_count < session.total_prompts {
            session.correct_count += 1;
        } else {
            warn!(session_id = %session.id, "correct count already at prompt total");
        }
        Ok(session.correct_count)
    }

    /// Stamps end time, completion flag and score on the live session and
    /// returns it.
    ///
    /// Finalizing an already finalized session overwrites the earlier
    /// result.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no session has been started.
    pub fn finalize(
        &mut self,
        completed: bool,
        correct_count: u32,
        clock: &dyn Clock,
    ) -> Result<Session, DomainError> {
        let session = self
            .current
            .as_mut()
            .ok_or_else(|| DomainError::Validation("no live session".to_owned()))?;
        if session.is_finalized() {
            warn!(session_id = %session.id, "overwriting previous finalization");
        }

        session.correct_count = correct_count.min(session.total_prompts);
        session.completed = completed;
        session.ended_at = Some(clock.now());
        session.score = Some(percentage_score(
            session.correct_count,
            session.total_prompts,
        ));

        info!(
            session_id = %session.id,
            completed,
            correct = session.correct_count,
            total = session.total_prompts,
            score = session.score,
            "session finalized"
        );
        Ok(session.clone())
    }
}
