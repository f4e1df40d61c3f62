//! Phases, prompts, configuration and the transition function.

pub mod config;
pub mod machine;
pub mod phase;
pub mod prompt;
