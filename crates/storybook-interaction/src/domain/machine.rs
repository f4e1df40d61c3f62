//! The interaction state machine.
//!
//! The machine is a pure transition function: every operation updates the
//! phase and returns the effects the driver must carry out, in order. It
//! never sleeps or plays audio itself, which keeps every transition
//! testable without a runtime.

use std::sync::Arc;
use std::time::Duration;

use storybook_core::answer::Answer;
use storybook_core::clock::Clock;
use storybook_core::error::DomainError;
use storybook_core::ids::PromptId;
use storybook_core::media::ClipRef;
use storybook_core::rng::{DeterministicRng, shuffle};
use storybook_session::application::attempt_recorder::AttemptRecorder;
use storybook_session::application::session_tracker::SessionTracker;
use storybook_session::domain::attempt::Attempt;
use storybook_session::domain::report::SessionReport;
use storybook_session::domain::session::Session;
use tracing::{debug, error, info};

use super::config::{GameConfig, RetryMode};
use super::phase::{Frame, Phase};
use super::prompt::Prompt;

/// Identifies one scheduled cue. Only the most recent ticket can resume the
/// machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Narration to play, followed by a settle delay, before the machine is
/// resumed with `ticket`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Ticket to hand back to [`InteractionMachine::resume`].
    pub ticket: Ticket,
    /// Clips to play in order.
    pub clips: Vec<ClipRef>,
    /// Wait after the last clip.
    pub settle: Duration,
}

/// Work the driver performs after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect<A> {
    /// Re-render the presentation.
    Render(Frame),
    /// Play a cue, then resume the machine.
    Await(Cue),
    /// Stop audio and cancel the in-flight cue without resuming.
    CancelCue,
    /// Hand a finalized session to persistence.
    Finalized(SessionReport<A>),
}

/// Phase, prompt order, session and attempts of one mini-game instance.
#[derive(Debug)]
pub struct InteractionMachine<A> {
    config: Arc<GameConfig<A>>,
    phase: Phase,
    order: Vec<usize>,
    tracker: SessionTracker,
    recorder: AttemptRecorder<A>,
    issued_tickets: u64,
    pending: Option<Ticket>,
}

impl<A: Answer> InteractionMachine<A> {
    /// Creates an idle machine.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if the configuration
    /// fails validation.
    pub fn new(config: GameConfig<A>) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            phase: Phase::Idle,
            order: Vec::new(),
            tracker: SessionTracker::new(),
            recorder: AttemptRecorder::new(),
            issued_tickets: 0,
            pending: None,
        })
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The mini-game configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig<A> {
        &self.config
    }

    /// The live (or last finalized) session.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.tracker.current()
    }

    /// Attempts recorded in the current session.
    #[must_use]
    pub fn attempts(&self) -> &[Attempt<A>] {
        self.recorder.attempts()
    }

    /// Prompt ids in this play-through's order.
    #[must_use]
    pub fn play_order(&self) -> Vec<PromptId> {
        self.order
            .iter()
            .filter_map(|&index| self.config.prompts.get(index))
            .map(|prompt| prompt.id.clone())
            .collect()
    }

    /// The prompt at `prompt_index` in play order.
    #[must_use]
    pub fn prompt_at(&self, prompt_index: usize) -> Option<&Prompt<A>> {
        self.order
            .get(prompt_index)
            .and_then(|&index| self.config.prompts.get(index))
    }

    /// The prompt the current phase refers to.
    #[must_use]
    pub fn current_prompt(&self) -> Option<&Prompt<A>> {
        self.phase
            .prompt_index()
            .and_then(|index| self.prompt_at(index))
    }

    /// Snapshot for the presentation layer.
    #[must_use]
    pub fn frame(&self) -> Frame {
        Frame {
            phase: self.phase,
            prompt_id: self.current_prompt().map(|prompt| prompt.id.clone()),
            correct_count: self.session().map_or(0, Session::correct_count),
            total_prompts: self.config.total_prompts(),
        }
    }

    /// The mini-game became visible: `Idle → Intro`.
    ///
    /// Starts a new session, clears attempts and fixes the prompt order.
    /// With no prompts the machine passes straight through to `Complete`
    /// with a score of zero. Ignored outside `Idle`.
    pub fn show(&mut self, clock: &dyn Clock, rng: &mut dyn DeterministicRng) -> Vec<Effect<A>> {
        if self.phase != Phase::Idle {
            debug!(phase = ?self.phase, "show ignored, already active");
            return Vec::new();
        }

        self.recorder.clear();
        let session = self.tracker.start(self.config.total_prompts(), clock);
        self.order = (0..self.config.prompts.len()).collect();
        if self.config.shuffle {
            shuffle(&mut self.order, rng);
        }
        info!(
            game = %self.config.game_id,
            session_id = %session.id(),
            order = ?self.play_order(),
            "play-through started"
        );

        let mut effects = self.enter(Phase::Intro);
        if self.config.prompts.is_empty() {
            info!(game = %self.config.game_id, "no prompts configured, completing immediately");
            effects.extend(self.complete(clock));
            return effects;
        }

        let intro = self.config.intro.clone();
        effects.push(self.schedule(intro, self.config.timings.intro_delay));
        effects
    }

    /// The cue identified by `ticket` finished; advance the phase.
    ///
    /// Stale tickets (from cancelled or superseded cues) are ignored.
    pub fn resume(&mut self, ticket: Ticket, clock: &dyn Clock) -> Vec<Effect<A>> {
        if self.pending != Some(ticket) {
            debug!(?ticket, pending = ?self.pending, "stale cue ignored");
            return Vec::new();
        }
        self.pending = None;

        match self.phase {
            Phase::Intro => self.narrate(0),
            Phase::Narrating { prompt_index } => self.enter(Phase::AwaitingAnswer { prompt_index }),
            Phase::Feedback {
                prompt_index,
                was_correct: true,
            } => {
                if prompt_index + 1 < self.order.len() {
                    self.narrate(prompt_index + 1)
                } else {
                    self.celebrate()
                }
            }
            Phase::Feedback {
                prompt_index,
                was_correct: false,
            } => match self.config.retry {
                RetryMode::Renarrate => self.narrate(prompt_index),
                RetryMode::AwaitAgain => self.enter(Phase::AwaitingAnswer { prompt_index }),
            },
            Phase::Celebrating => self.complete(clock),
            Phase::Idle | Phase::AwaitingAnswer { .. } | Phase::Complete => {
                debug!(phase = ?self.phase, "resume ignored");
                Vec::new()
            }
        }
    }

    /// The learner answered `prompt_id`: `AwaitingAnswer(i) → Feedback(i, _)`.
    ///
    /// Answers outside `AwaitingAnswer`, or for a prompt that is not on
    /// screen, are ignored.
    pub fn submit_answer(
        &mut self,
        prompt_id: &PromptId,
        answer: A,
        clock: &dyn Clock,
    ) -> Vec<Effect<A>> {
        let Some(prompt_index) = self
            .phase
            .prompt_index()
            .filter(|_| self.phase.accepts_answers())
        else {
            debug!(phase = ?self.phase, prompt = %prompt_id, "answer ignored, input not open");
            return Vec::new();
        };
        let config = Arc::clone(&self.config);
        let Some(prompt) = self
            .order
            .get(prompt_index)
            .and_then(|&index| config.prompts.get(index))
        else {
            return Vec::new();
        };
        if prompt.id != *prompt_id {
            debug!(expected = %prompt.id, got = %prompt_id, "answer ignored, prompt not on screen");
            return Vec::new();
        }
        let Some(session_id) = self.session().map(Session::id) else {
            return Vec::new();
        };

        let attempt = self.recorder.record(
            session_id,
            &prompt.id,
            answer,
            prompt.correct,
            &prompt.tags,
            clock,
        );
        let was_correct = attempt.is_correct();
        if was_correct {
            if let Err(err) = self.tracker.record_correct() {
                error!(error = %err, "failed to record correct answer");
            }
        }

        let clips = prompt
            .feedback
            .as_ref()
            .unwrap_or(&config.feedback)
            .for_outcome(was_correct)
            .to_vec();
        let mut effects = self.enter(Phase::Feedback {
            prompt_index,
            was_correct,
        });
        effects.push(self.schedule(clips, config.timings.feedback_delay));
        effects
    }

    /// The host closed the mini-game: any phase `→ Idle`.
    ///
    /// An active play-through is finalized as incomplete after the in-flight
    /// cue is cancelled. Closing a completed play-through keeps its result.
    pub fn close(&mut self, clock: &dyn Clock) -> Vec<Effect<A>> {
        match self.phase {
            Phase::Idle => Vec::new(),
            Phase::Complete => self.enter(Phase::Idle),
            _ => {
                info!(phase = ?self.phase, "play-through abandoned");
                self.pending = None;
                let mut effects = vec![Effect::CancelCue];
                effects.extend(self.finalize(false, clock).map(Effect::Finalized));
                effects.extend(self.enter(Phase::Idle));
                effects
            }
        }
    }

    fn enter(&mut self, phase: Phase) -> Vec<Effect<A>> {
        debug!(from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
        vec![Effect::Render(self.frame())]
    }

    fn schedule(&mut self, clips: Vec<ClipRef>, settle: Duration) -> Effect<A> {
        self.issued_tickets += 1;
        let ticket = Ticket(self.issued_tickets);
        self.pending = Some(ticket);
        Effect::Await(Cue {
            ticket,
            clips,
            settle,
        })
    }

    fn narrate(&mut self, prompt_index: usize) -> Vec<Effect<A>> {
        let narration = self
            .prompt_at(prompt_index)
            .map(|prompt| prompt.narration.clone())
            .unwrap_or_default();
        let mut effects = self.enter(Phase::Narrating { prompt_index });
        effects.push(self.schedule(narration, self.config.timings.post_narration_delay));
        effects
    }

    fn celebrate(&mut self) -> Vec<Effect<A>> {
        let clips = self.config.celebration.clone();
        let mut effects = self.enter(Phase::Celebrating);
        effects.push(self.schedule(clips, self.config.timings.celebration_duration));
        effects
    }

    fn complete(&mut self, clock: &dyn Clock) -> Vec<Effect<A>> {
        let report = self.finalize(true, clock);
        let mut effects = self.enter(Phase::Complete);
        effects.extend(report.map(Effect::Finalized));
        effects
    }

    fn finalize(&mut self, completed: bool, clock: &dyn Clock) -> Option<SessionReport<A>> {
        let correct_count = self.session().map_or(0, Session::correct_count);
        match self.tracker.finalize(completed, correct_count, clock) {
            Ok(session) => Some(SessionReport {
                game_id: self.config.game_id.clone(),
                content_version: self.config.content_version.clone(),
                session,
                attempts: self.recorder.attempts().to_vec(),
            }),
            Err(err) => {
                error!(error = %err, "failed to finalize session");
                None
            }
        }
    }
}
