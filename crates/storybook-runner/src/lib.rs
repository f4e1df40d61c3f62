//! Storybook runner: plays a YAML-defined mini-game end to end.
//!
//! The runner wires a real [`InteractionEngine`] to a simulated media
//! backend, a scripted learner and a JSON-lines report sink. It is how game
//! definitions are checked before they ship.

pub mod config;
pub mod definition;
pub mod error;
pub mod learner;
pub mod simulated;
pub mod sink;

use std::path::Path;
use std::sync::Arc;

use storybook_core::answer::{Answer, Safety, Thumb, Visibility, YesNo};
use storybook_core::clock::SystemClock;
use storybook_core::rng::{DeterministicRng, SystemRng};
use storybook_interaction::application::engine::{EngineDeps, InteractionEngine};
use storybook_interaction::application::presentation::ChannelPresentation;
use tracing::info;

use crate::definition::{AlphabetKind, GameDefinition, content_version};
use crate::error::AppError;
use crate::learner::ScriptedLearner;
use crate::simulated::SimulatedMedia;
use crate::sink::{JsonLinesSink, ReportTarget};

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The game that was played.
    pub game_id: String,
    /// SHA-256 of the definition source.
    pub content_version: String,
    /// Answers the learner submitted.
    pub answers_given: usize,
    /// Whether the play-through completed.
    pub completed: bool,
}

/// Reads the game definition at `path` and plays it once.
///
/// # Errors
///
/// Returns `AppError::Io` if the file cannot be read, otherwise whatever
/// [`run_game`] returns.
pub async fn run_game_file(path: &Path, target: ReportTarget) -> Result<RunSummary, AppError> {
    let source = tokio::fs::read_to_string(path).await?;
    run_game(&source, target).await
}

/// Parses `source` and plays the game once, writing the session report to
/// `target`.
///
/// # Errors
///
/// Returns an error if the definition is invalid or the engine stops
/// unexpectedly. Report write failures are logged, not returned.
pub async fn run_game(source: &str, target: ReportTarget) -> Result<RunSummary, AppError> {
    let definition = GameDefinition::parse(source)?;
    let version = content_version(source);
    info!(game = %definition.id, content_version = %version, "game definition loaded");

    match definition.alphabet {
        AlphabetKind::YesNo => play::<YesNo>(&definition, version, target).await,
        AlphabetKind::Visibility => play::<Visibility>(&definition, version, target).await,
        AlphabetKind::Thumbs => play::<Thumb>(&definition, version, target).await,
        AlphabetKind::Safety => play::<Safety>(&definition, version, target).await,
    }
}

async fn play<A: Answer>(
    definition: &GameDefinition,
    version: String,
    target: ReportTarget,
) -> Result<RunSummary, AppError> {
    let config = definition.game_config::<A>(Some(version.clone()))?;
    let learner = ScriptedLearner::new(definition.learner_script::<A>()?);

    let rng: Box<dyn DeterministicRng> = match definition.seed {
        Some(seed) => Box::new(SystemRng::seeded(seed)),
        None => Box::new(SystemRng::from_os()),
    };
    let (presentation, frames) = ChannelPresentation::new();
    let deps = EngineDeps {
        media: Arc::new(SimulatedMedia::from_definition(&definition.media)),
        presentation: Arc::new(presentation),
        sink: Arc::new(JsonLinesSink::new(target)),
        clock: Arc::new(SystemClock),
        rng,
    };

    let (engine, handle) = InteractionEngine::new(config, deps)?;
    let engine_task = tokio::spawn(engine.run());
    let outcome = learner.play(handle, frames).await;
    engine_task
        .await
        .map_err(|e| AppError::Engine(e.to_string()))?;
    let outcome = outcome?;

    info!(
        game = %definition.id,
        answers = outcome.answers_given,
        completed = outcome.completed,
        "run finished"
    );
    Ok(RunSummary {
        game_id: definition.id.clone(),
        content_version: version,
        answers_given: outcome.answers_given,
        completed: outcome.completed,
    })
}
