//! Session and attempt records.

pub mod attempt;
pub mod report;
pub mod session;
