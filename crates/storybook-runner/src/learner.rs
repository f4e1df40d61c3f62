//! Scripted learner.
//!
//! Watches rendered frames and answers from a fixed script, the way a child
//! tapping buttons would. When the script for the prompt on screen runs out
//! the learner closes the game.

use std::collections::{HashMap, VecDeque};

use storybook_core::answer::Answer;
use storybook_core::error::DomainError;
use storybook_core::ids::PromptId;
use storybook_interaction::application::engine::EngineHandle;
use storybook_interaction::domain::phase::{Frame, Phase};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

/// How a scripted play-through ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearnerOutcome {
    /// Answers submitted, including wrong ones.
    pub answers_given: usize,
    /// Whether the game reached `Complete`.
    pub completed: bool,
}

/// Answers prompts from a per-prompt script.
#[derive(Debug, Clone)]
pub struct ScriptedLearner<A> {
    script: HashMap<PromptId, VecDeque<A>>,
}

impl<A: Answer> ScriptedLearner<A> {
    /// Creates a learner that gives `script[prompt]` in order.
    #[must_use]
    pub fn new(script: HashMap<PromptId, Vec<A>>) -> Self {
        Self {
            script: script
                .into_iter()
                .map(|(prompt_id, answers)| (prompt_id, answers.into()))
                .collect(),
        }
    }

    /// Opens the game and plays it until it completes, the script runs out,
    /// or the engine stops rendering.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EngineStopped` if the engine goes away while
    /// the learner is still sending intents.
    pub async fn play(
        mut self,
        handle: EngineHandle<A>,
        mut frames: UnboundedReceiver<Frame>,
    ) -> Result<LearnerOutcome, DomainError> {
        let mut answers_given = 0;
        handle.visibility_changed(true).await?;

        while let Some(frame) = frames.recv().await {
            match frame.phase {
                Phase::AwaitingAnswer { .. } => {
                    let Some(prompt_id) = frame.prompt_id else {
                        continue;
                    };
                    let Some(answer) = self.next_answer(&prompt_id) else {
                        info!(prompt = %prompt_id, "learner has no answer left, closing");
                        handle.close().await?;
                        return Ok(LearnerOutcome {
                            answers_given,
                            completed: false,
                        });
                    };
                    info!(prompt = %prompt_id, answer = answer.label(), "learner answers");
                    handle.answer(prompt_id, answer).await?;
                    answers_given += 1;
                }
                Phase::Complete => {
                    return Ok(LearnerOutcome {
                        answers_given,
                        completed: true,
                    });
                }
                _ => {}
            }
        }

        Ok(LearnerOutcome {
            answers_given,
            completed: false,
        })
    }

    fn next_answer(&mut self, prompt_id: &PromptId) -> Option<A> {
        self.script.get_mut(prompt_id)?.pop_front()
    }
}
