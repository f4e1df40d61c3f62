//! Interaction phases and the frame rendered for each.

use serde::Serialize;
use storybook_core::ids::PromptId;

/// Current state of the interaction state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Not visible, or closed.
    Idle,
    /// Intro narration is playing.
    Intro,
    /// A prompt is being narrated; answers are rejected.
    Narrating {
        /// Position in the play order.
        prompt_index: usize,
    },
    /// Answer buttons are live.
    AwaitingAnswer {
        /// Position in the play order.
        prompt_index: usize,
    },
    /// Feedback narration for the last answer.
    Feedback {
        /// Position in the play order.
        prompt_index: usize,
        /// Whether the answer was correct.
        was_correct: bool,
    },
    /// Every prompt answered; celebration is playing.
    Celebrating,
    /// Session finalized. Terminal for the play-through.
    Complete,
}

impl Phase {
    /// The prompt position this phase refers to, if any.
    #[must_use]
    pub fn prompt_index(self) -> Option<usize> {
        match self {
            Self::Narrating { prompt_index }
            | Self::AwaitingAnswer { prompt_index }
            | Self::Feedback { prompt_index, .. } => Some(prompt_index),
            Self::Idle | Self::Intro | Self::Celebrating | Self::Complete => None,
        }
    }

    /// Whether a submitted answer would be accepted.
    #[must_use]
    pub fn accepts_answers(self) -> bool {
        matches!(self, Self::AwaitingAnswer { .. })
    }
}

/// Everything the presentation layer needs to draw the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// Current phase.
    #[serde(flatten)]
    pub phase: Phase,
    /// Prompt on screen, if the phase refers to one.
    pub prompt_id: Option<PromptId>,
    /// Running score.
    pub correct_count: u32,
    /// Prompts in this play-through.
    pub total_prompts: u32,
}
