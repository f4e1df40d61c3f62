//! Session services: recorder, tracker and the persistence port.

pub mod attempt_recorder;
pub mod session_tracker;
pub mod sink;
