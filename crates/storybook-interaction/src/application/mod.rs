//! The async engine and its host-facing ports.

pub mod engine;
pub mod presentation;
