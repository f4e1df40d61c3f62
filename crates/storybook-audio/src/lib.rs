//! Storybook: audio cue player and narration sequencer.
//!
//! Narration is best-effort: every failure mode of the media layer degrades
//! to "the clip finished" so a broken asset can never stall a mini-game.

pub mod player;
pub mod sequencer;

pub use player::{AudioCuePlayer, CueOutcome};
pub use sequencer::{AudioCueSequencer, SequenceOutcome, SequenceReport, SequencerConfig};
