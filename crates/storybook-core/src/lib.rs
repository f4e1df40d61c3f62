//! Storybook Core: shared abstractions for the interaction engine.
//!
//! This crate defines the ports and small value types every other crate
//! depends on: time, randomness, media playback, answer alphabets and the
//! domain error type. It contains no infrastructure code.

pub mod answer;
pub mod clock;
pub mod error;
pub mod ids;
pub mod media;
pub mod rng;
