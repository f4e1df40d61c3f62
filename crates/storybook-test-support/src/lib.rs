//! Shared test doubles for the Storybook interaction engine.

mod clock;
mod media;
mod rng;
mod sink;

pub use clock::FixedClock;
pub use media::{ClipScript, MediaCall, ScriptedMedia};
pub use rng::{MockRng, SequenceRng};
pub use sink::{FailingSessionSink, RecordingSessionSink, StallingSessionSink};
