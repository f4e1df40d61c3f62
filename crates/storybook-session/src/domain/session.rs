//! The session record for one play-through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Percentage score, rounded half up. Zero prompts score zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn percentage_score(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    ((correct * 200 + total) / (2 * total)) as u8
}

/// One play-through of a mini-game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub(crate) id: Uuid,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) ended_at: Option<DateTime<Utc>>,
    pub(crate) completed: bool,
    pub(crate) total_prompts: u32,
    pub(crate) correct_count: u32,
    pub(crate) score: Option<u8>,
}

impl Session {
    pub(crate) fn new(id: Uuid, total_prompts: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at,
            ended_at: None,
            completed: false,
            total_prompts,
            correct_count: 0,
            score: None,
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the mini-game became active.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the session was finalized, if it has been.
    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Whether the learner finished every prompt.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Number of prompts in the play-through.
    #[must_use]
    pub fn total_prompts(&self) -> u32 {
        self.total_prompts
    }

    /// Prompts answered correctly so far.
    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    /// Finalized score, `0..=100`. Only meaningful when [`completed`](Self::completed).
    #[must_use]
    pub fn score(&self) -> Option<u8> {
        self.score
    }

    /// Whether `finalize` has stamped this session.
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.ended_at.is_some()
    }
}
