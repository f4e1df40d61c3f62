//! The engine driver.
//!
//! One task per mini-game instance. The task owns the state machine, the
//! audio player, the clock and the RNG; hosts reach it only through an
//! [`EngineHandle`]. Each loop iteration waits for either a learner intent
//! or the in-flight cue, feeds the result to the machine and carries out
//! the returned effects in order. Finalized reports go to a writer task so a
//! slow sink never holds the loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use storybook_audio::{AudioCuePlayer, AudioCueSequencer, SequenceOutcome};
use storybook_core::answer::Answer;
use storybook_core::clock::Clock;
use storybook_core::error::DomainError;
use storybook_core::ids::PromptId;
use storybook_core::media::MediaBackend;
use storybook_core::rng::DeterministicRng;
use storybook_session::application::sink::SessionSink;
use storybook_session::domain::report::SessionReport;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::application::presentation::Presentation;
use crate::domain::config::GameConfig;
use crate::domain::machine::{Cue, Effect, InteractionMachine, Ticket};

const INTENT_BUFFER: usize = 32;

/// Upper bound on a single report write.
const REPORT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Something the learner or host did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent<A> {
    /// The mini-game was shown (`true`) or hidden (`false`).
    VisibilityChanged(bool),
    /// An answer button was pressed or an item dropped.
    Answer {
        /// Prompt the answer is for.
        prompt_id: PromptId,
        /// The chosen answer.
        answer: A,
    },
    /// The mini-game was closed.
    Close,
}

/// Sends intents to a running engine. Dropping every handle closes the
/// engine.
#[derive(Debug, Clone)]
pub struct EngineHandle<A> {
    intents: mpsc::Sender<Intent<A>>,
}

impl<A: Answer> EngineHandle<A> {
    /// Reports a visibility change.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EngineStopped` if the engine task has ended.
    pub async fn visibility_changed(&self, visible: bool) -> Result<(), DomainError> {
        self.send(Intent::VisibilityChanged(visible)).await
    }

    /// Submits an answer for `prompt_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EngineStopped` if the engine task has ended.
    pub async fn answer(&self, prompt_id: PromptId, answer: A) -> Result<(), DomainError> {
        self.send(Intent::Answer { prompt_id, answer }).await
    }

    /// Closes (abandons) the mini-game.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EngineStopped` if the engine task has ended.
    pub async fn close(&self) -> Result<(), DomainError> {
        self.send(Intent::Close).await
    }

    async fn send(&self, intent: Intent<A>) -> Result<(), DomainError> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| DomainError::EngineStopped)
    }
}

/// Collaborators an engine is built with.
pub struct EngineDeps<A> {
    /// Loads narration clips.
    pub media: Arc<dyn MediaBackend>,
    /// Receives a frame after every transition.
    pub presentation: Arc<dyn Presentation>,
    /// Receives finalized sessions.
    pub sink: Arc<dyn SessionSink<A>>,
    /// Timestamps sessions and attempts.
    pub clock: Arc<dyn Clock>,
    /// Shuffles prompt order.
    pub rng: Box<dyn DeterministicRng>,
}

struct CueDone {
    player: AudioCuePlayer,
    ticket: Ticket,
    completed: bool,
}

struct InFlightCue {
    token: CancellationToken,
    future: Pin<Box<dyn Future<Output = CueDone> + Send>>,
}

/// A mini-game instance: state machine plus audio, driven by intents.
pub struct InteractionEngine<A: Answer> {
    machine: InteractionMachine<A>,
    player: Option<AudioCuePlayer>,
    sequencer: AudioCueSequencer,
    presentation: Arc<dyn Presentation>,
    sink: Arc<dyn SessionSink<A>>,
    clock: Arc<dyn Clock>,
    rng: Box<dyn DeterministicRng>,
    intents: mpsc::Receiver<Intent<A>>,
    in_flight: Option<InFlightCue>,
    reports: mpsc::UnboundedSender<SessionReport<A>>,
    report_queue: Option<mpsc::UnboundedReceiver<SessionReport<A>>>,
}

impl<A: Answer> InteractionEngine<A> {
    /// Builds an idle engine and the handle that drives it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfiguration` if `config` fails
    /// validation.
    pub fn new(
        config: GameConfig<A>,
        deps: EngineDeps<A>,
    ) -> Result<(Self, EngineHandle<A>), DomainError> {
        let sequencer = AudioCueSequencer::new(config.sequencer);
        let machine = InteractionMachine::new(config)?;
        let (sender, intents) = mpsc::channel(INTENT_BUFFER);
        let (reports, report_queue) = mpsc::unbounded_channel();

        let engine = Self {
            machine,
            player: Some(AudioCuePlayer::new(deps.media)),
            sequencer,
            presentation: deps.presentation,
            sink: deps.sink,
            clock: deps.clock,
            rng: deps.rng,
            intents,
            in_flight: None,
            reports,
            report_queue: Some(report_queue),
        };
        Ok((engine, EngineHandle { intents: sender }))
    }

    /// Runs until every [`EngineHandle`] is dropped. An active play-through
    /// is abandoned on the way out, and queued reports are written before
    /// this returns.
    pub async fn run(mut self) {
        let game_id = self.machine.config().game_id.clone();
        info!(game = %game_id, "interaction engine running");
        let writer = self
            .report_queue
            .take()
            .map(|queue| tokio::spawn(write_reports(Arc::clone(&self.sink), queue)));
        self.presentation.render(&self.machine.frame());

        loop {
            let (effects, stopping) = tokio::select! {
                biased;
                intent = self.intents.recv() => match intent {
                    Some(intent) => (self.handle_intent(intent), false),
                    None => (self.machine.close(self.clock.as_ref()), true),
                },
                done = next_cue(&mut self.in_flight) => {
                    self.in_flight = None;
                    self.player = Some(done.player);
                    let effects = if done.completed {
                        self.machine.resume(done.ticket, self.clock.as_ref())
                    } else {
                        Vec::new()
                    };
                    (effects, false)
                }
            };

            self.apply(effects).await;
            if stopping {
                break;
            }
        }

        self.cancel_cue().await;
        drop(self);
        if let Some(writer) = writer {
            if let Err(err) = writer.await {
                error!(game = %game_id, error = %err, "report writer failed");
            }
        }
        info!(game = %game_id, "interaction engine stopped");
    }

    fn handle_intent(&mut self, intent: Intent<A>) -> Vec<Effect<A>> {
        let clock = self.clock.as_ref();
        match intent {
            Intent::VisibilityChanged(true) => self.machine.show(clock, self.rng.as_mut()),
            Intent::VisibilityChanged(false) | Intent::Close => self.machine.close(clock),
            Intent::Answer { prompt_id, answer } => {
                self.machine.submit_answer(&prompt_id, answer, clock)
            }
        }
    }

    async fn apply(&mut self, effects: Vec<Effect<A>>) {
        for effect in effects {
            match effect {
                Effect::Render(frame) => self.presentation.render(&frame),
                Effect::Await(cue) => {
                    self.cancel_cue().await;
                    self.start_cue(cue);
                }
                Effect::CancelCue => self.cancel_cue().await,
                Effect::Finalized(report) => {
                    if let Err(mpsc::error::SendError(report)) = self.reports.send(report) {
                        error!(session_id = %report.session.id(), "report writer gone, report dropped");
                    }
                }
            }
        }
    }

    fn start_cue(&mut self, cue: Cue) {
        let Some(mut player) = self.player.take() else {
            error!(ticket = ?cue.ticket, "audio player busy, cue dropped");
            return;
        };
        let token = CancellationToken::new();
        let cancel = token.clone();
        let sequencer = self.sequencer;

        let future = Box::pin(async move {
            let completed = match sequencer.play_all(&mut player, &cue.clips, &cancel).await {
                SequenceOutcome::Completed(_) => settle(cue.settle, &cancel).await,
                SequenceOutcome::Cancelled { .. } => false,
            };
            CueDone {
                player,
                ticket: cue.ticket,
                completed,
            }
        });
        self.in_flight = Some(InFlightCue { token, future });
    }

    /// Cancels the in-flight cue, takes the player back and silences it.
    async fn cancel_cue(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.token.cancel();
            let done = in_flight.future.await;
            debug!(ticket = ?done.ticket, "cue cancelled");
            self.player = Some(done.player);
        }
        if let Some(player) = self.player.as_mut() {
            player.stop();
        }
    }
}

/// Writes finalized reports in the order they were queued, each bounded by
/// [`REPORT_WRITE_TIMEOUT`]. Ends once the engine drops its sender.
async fn write_reports<A: Answer>(
    sink: Arc<dyn SessionSink<A>>,
    mut queue: mpsc::UnboundedReceiver<SessionReport<A>>,
) {
    while let Some(report) = queue.recv().await {
        let session_id = report.session.id();
        match tokio::time::timeout(REPORT_WRITE_TIMEOUT, sink.persist(&report)).await {
            Ok(Ok(())) => info!(
                %session_id,
                attempts = report.attempts.len(),
                "session report persisted"
            ),
            Ok(Err(err)) => error!(
                %session_id,
                error = %err,
                "failed to persist session report"
            ),
            Err(_) => error!(
                %session_id,
                timeout = ?REPORT_WRITE_TIMEOUT,
                "session report write timed out, report dropped"
            ),
        }
    }
}

async fn next_cue(in_flight: &mut Option<InFlightCue>) -> CueDone {
    match in_flight {
        Some(cue) => cue.future.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn settle(delay: Duration, cancel: &CancellationToken) -> bool {
    if delay.is_zero() {
        return !cancel.is_cancelled();
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use storybook_audio::SequencerConfig;
    use storybook_core::answer::YesNo;
    use storybook_core::media::ClipRef;
    use storybook_test_support::{
        ClipScript, FailingSessionSink, FixedClock, MediaCall, MockRng, RecordingSessionSink,
        ScriptedMedia, StallingSessionSink,
    };
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::task::JoinHandle;
    use tokio::time::Instant;

    use super::*;
    use crate::application::presentation::ChannelPresentation;
    use crate::domain::config::EngineTimings;
    use crate::domain::phase::{Frame, Phase};
    use crate::domain::prompt::{FeedbackClips, Prompt};

    struct Harness {
        handle: EngineHandle<YesNo>,
        frames: UnboundedReceiver<Frame>,
        task: JoinHandle<()>,
    }

    impl Harness {
        async fn wait_for(&mut self, phase: Phase) -> Frame {
            loop {
                let frame = self.frames.recv().await.expect("engine stopped rendering");
                if frame.phase == phase {
                    return frame;
                }
            }
        }

        async fn answer_on_screen(&mut self, prompt_index: usize, answer: YesNo) {
            let frame = self.wait_for(Phase::AwaitingAnswer { prompt_index }).await;
            self.handle
                .answer(frame.prompt_id.unwrap(), answer)
                .await
                .unwrap();
        }

        async fn shutdown(self) -> UnboundedReceiver<Frame> {
            drop(self.handle);
            self.task.await.unwrap();
            self.frames
        }
    }

    fn quiz(count: usize) -> GameConfig<YesNo> {
        let prompts = (0..count)
            .map(|n| {
                Prompt::new(format!("p{n}"), YesNo::Yes)
                    .with_narration([ClipRef::new(format!("p{n}.mp3"))])
            })
            .collect();
        let mut config = GameConfig::new("quiz", prompts);
        config.intro = vec!["intro.mp3".into()];
        config.celebration = vec!["yay.mp3".into()];
        config.feedback = FeedbackClips {
            correct: vec!["right.mp3".into()],
            incorrect: vec!["try-again.mp3".into()],
        };
        config.timings = EngineTimings {
            intro_delay: Duration::from_millis(100),
            post_narration_delay: Duration::from_millis(100),
            feedback_delay: Duration::from_millis(100),
            celebration_duration: Duration::from_millis(500),
        };
        config.sequencer = SequencerConfig {
            inter_clip_pause: Duration::from_millis(50),
            clip_fallback: Duration::from_secs(2),
        };
        config
    }

    fn start(
        config: GameConfig<YesNo>,
        media: &ScriptedMedia,
        sink: Arc<dyn SessionSink<YesNo>>,
    ) -> Harness {
        let (presentation, frames) = ChannelPresentation::new();
        let deps = EngineDeps {
            media: Arc::new(media.clone()),
            presentation: Arc::new(presentation),
            sink,
            clock: Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            )),
            rng: Box::new(MockRng),
        };
        let (engine, handle) = InteractionEngine::new(config, deps).unwrap();
        Harness {
            handle,
            frames,
            task: tokio::spawn(engine.run()),
        }
    }

    fn quick_media() -> ScriptedMedia {
        ScriptedMedia::new(ClipScript::FinishAfter(Duration::from_millis(400)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_through_with_retry_reports_completed_session() {
        // Arrange
        let media = quick_media();
        let sink = Arc::new(RecordingSessionSink::new());
        let mut harness = start(quiz(3), &media, sink.clone());

        // Act
        harness.handle.visibility_changed(true).await.unwrap();
        harness.answer_on_screen(0, YesNo::No).await;
        harness.answer_on_screen(0, YesNo::Yes).await;
        harness.answer_on_screen(1, YesNo::Yes).await;
        harness.answer_on_screen(2, YesNo::Yes).await;
        let complete = harness.wait_for(Phase::Complete).await;
        harness.shutdown().await;

        // Assert
        assert_eq!(complete.correct_count, 3);
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert!(report.session.completed());
        assert_eq!(report.session.score(), Some(100));
        assert_eq!(report.attempts.len(), 4);
        assert_eq!(
            media.played(),
            [
                "intro.mp3",
                "p0.mp3",
                "try-again.mp3",
                "p0.mp3",
                "right.mp3",
                "p1.mp3",
                "right.mp3",
                "p2.mp3",
                "right.mp3",
                "yay.mp3",
            ]
            .map(ClipRef::new)
            .to_vec()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_mid_narration_never_advances() {
        // Arrange
        let media = quick_media().with_clip("p0.mp3", ClipScript::Hang);
        let sink = Arc::new(RecordingSessionSink::new());
        let mut harness = start(quiz(2), &media, sink.clone());
        harness.handle.visibility_changed(true).await.unwrap();
        harness.wait_for(Phase::Narrating { prompt_index: 0 }).await;

        // Act
        harness.handle.close().await.unwrap();
        harness.wait_for(Phase::Idle).await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        // Assert
        assert_eq!(harness.frames.try_recv(), Err(TryRecvError::Empty));
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].session.completed());
        assert_eq!(reports[0].session.correct_count(), 0);
        assert_eq!(
            media.calls().last(),
            Some(&MediaCall::Stopped("p0.mp3".into()))
        );
        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_narration_opens_answers_after_fallback() {
        // Arrange
        let media = quick_media().with_clip("p0.mp3", ClipScript::Hang);
        let sink = Arc::new(RecordingSessionSink::new());
        let mut harness = start(quiz(1), &media, sink);
        let started = Instant::now();

        // Act
        harness.handle.visibility_changed(true).await.unwrap();
        harness.wait_for(Phase::AwaitingAnswer { prompt_index: 0 }).await;

        // Assert
        // intro clip + intro delay + fallback + post-narration delay
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2600), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(2700), "{elapsed:?}");
        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_media_never_blocks_progress() {
        // Arrange
        let media = ScriptedMedia::new(ClipScript::FailToLoad);
        let sink = Arc::new(RecordingSessionSink::new());
        let mut harness = start(quiz(2), &media, sink.clone());

        // Act
        harness.handle.visibility_changed(true).await.unwrap();
        harness.answer_on_screen(0, YesNo::Yes).await;
        harness.answer_on_screen(1, YesNo::Yes).await;
        harness.wait_for(Phase::Complete).await;
        harness.shutdown().await;

        // Assert
        assert!(media.played().is_empty());
        assert!(sink.reports()[0].session.completed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_while_narrating_is_ignored() {
        // Arrange
        let media = quick_media();
        let sink = Arc::new(RecordingSessionSink::new());
        let mut harness = start(quiz(1), &media, sink.clone());
        harness.handle.visibility_changed(true).await.unwrap();
        harness.wait_for(Phase::Narrating { prompt_index: 0 }).await;

        // Act
        harness
            .handle
            .answer(PromptId::new("p0"), YesNo::Yes)
            .await
            .unwrap();
        harness.answer_on_screen(0, YesNo::Yes).await;
        harness.wait_for(Phase::Complete).await;
        harness.shutdown().await;

        // Assert
        assert_eq!(sink.reports()[0].attempts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_abandons_active_session() {
        // Arrange
        let media = quick_media();
        let sink = Arc::new(RecordingSessionSink::new());
        let mut harness = start(quiz(4), &media, sink.clone());
        harness.handle.visibility_changed(true).await.unwrap();
        harness.answer_on_screen(0, YesNo::Yes).await;
        harness.wait_for(Phase::AwaitingAnswer { prompt_index: 1 }).await;

        // Act
        let mut frames = harness.shutdown().await;

        // Assert
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].session.completed());
        assert_eq!(reports[0].session.correct_count(), 1);
        assert_eq!(frames.recv().await.map(|frame| frame.phase), Some(Phase::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hiding_then_showing_starts_a_new_session() {
        // Arrange
        let media = quick_media();
        let sink = Arc::new(RecordingSessionSink::new());
        let mut harness = start(quiz(1), &media, sink.clone());
        harness.handle.visibility_changed(true).await.unwrap();
        harness.wait_for(Phase::AwaitingAnswer { prompt_index: 0 }).await;

        // Act
        harness.handle.visibility_changed(false).await.unwrap();
        harness.handle.visibility_changed(true).await.unwrap();
        harness.answer_on_screen(0, YesNo::Yes).await;
        harness.wait_for(Phase::Complete).await;
        harness.shutdown().await;

        // Assert
        let reports = sink.reports();
        assert_eq!(reports.len(), 2);
        assert!(!reports[0].session.completed());
        assert!(reports[1].session.completed());
        assert_ne!(reports[0].session.id(), reports[1].session.id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistence_failure_does_not_stop_engine() {
        // Arrange
        let media = quick_media();
        let mut harness = start(quiz(0), &media, Arc::new(FailingSessionSink));

        // Act
        harness.handle.visibility_changed(true).await.unwrap();
        let complete = harness.wait_for(Phase::Complete).await;
        harness.handle.close().await.unwrap();
        harness.wait_for(Phase::Idle).await;
        harness.handle.visibility_changed(true).await.unwrap();

        // Assert
        assert_eq!(complete.total_prompts, 0);
        harness.wait_for(Phase::Intro).await;
        harness.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_reports_stopped_engine() {
        // Arrange
        let media = quick_media();
        let sink = Arc::new(RecordingSessionSink::new());
        let harness = start(quiz(1), &media, sink);
        harness.task.abort();
        let _ = harness.task.await;

        // Act
        let result = harness.handle.close().await;

        // Assert
        assert!(matches!(result, Err(DomainError::EngineStopped)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_while_clip_start_stalls_goes_idle() {
        // Arrange
        let media = quick_media().with_clip("p0.mp3", ClipScript::StallOnPlay);
        let sink = Arc::new(RecordingSessionSink::new());
        let mut harness = start(quiz(1), &media, sink.clone());
        harness.handle.visibility_changed(true).await.unwrap();
        harness.wait_for(Phase::Narrating { prompt_index: 0 }).await;

        // Act
        harness.handle.close().await.unwrap();
        let idle = tokio::time::timeout(Duration::from_secs(1), harness.wait_for(Phase::Idle)).await;

        // Assert
        assert!(idle.is_ok(), "close was not honoured while the clip stalled");
        harness.shutdown().await;
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].session.completed());
        assert!(!media.played().contains(&ClipRef::new("p0.mp3")));
        assert_eq!(
            media.calls().last(),
            Some(&MediaCall::Stopped("p0.mp3".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_report_write_does_not_hold_the_loop() {
        // Arrange
        let media = quick_media();
        let mut harness = start(quiz(1), &media, Arc::new(StallingSessionSink));
        harness.handle.visibility_changed(true).await.unwrap();
        harness.wait_for(Phase::AwaitingAnswer { prompt_index: 0 }).await;
        let closed_at = Instant::now();

        // Act
        harness.handle.close().await.unwrap();
        harness.wait_for(Phase::Idle).await;
        harness.handle.visibility_changed(true).await.unwrap();
        harness.wait_for(Phase::Intro).await;
        let reshown_after = closed_at.elapsed();
        harness.shutdown().await;

        // Assert
        assert!(reshown_after < REPORT_WRITE_TIMEOUT, "{reshown_after:?}");
    }
}
