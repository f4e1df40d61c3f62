//! Storybook: interaction state machine and engine driver.
//!
//! Every mini-game is the same loop: narrate a prompt, wait for an answer,
//! give feedback, retry or advance, celebrate, report. The pure state
//! machine lives in [`domain`]; the async driver that plays narration,
//! listens for learner intents and emits reports lives in [`application`].

pub mod application;
pub mod domain;
