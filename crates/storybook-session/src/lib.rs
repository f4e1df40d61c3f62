//! Storybook: session tracking and attempt telemetry.
//!
//! Responsible for the lifecycle of one play-through (start, running score,
//! finalization) and the append-only log of answers given during it. Storage
//! is external: finalized sessions leave through the [`SessionSink`] port.
//!
//! [`SessionSink`]: application::sink::SessionSink

pub mod application;
pub mod domain;
