//! Test sinks: mock `SessionSink` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use storybook_core::answer::Answer;
use storybook_core::error::DomainError;
use storybook_session::application::sink::SessionSink;
use storybook_session::domain::report::SessionReport;

/// A sink that records every persisted report and always succeeds.
#[derive(Debug)]
pub struct RecordingSessionSink<A> {
    reports: Mutex<Vec<SessionReport<A>>>,
}

impl<A> Default for RecordingSessionSink<A> {
    fn default() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
        }
    }
}

impl<A: Answer> RecordingSessionSink<A> {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all reports persisted so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn reports(&self) -> Vec<SessionReport<A>> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl<A: Answer> SessionSink<A> for RecordingSessionSink<A> {
    async fn persist(&self, report: &SessionReport<A>) -> Result<(), DomainError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

/// A sink that always returns an infrastructure error. Useful for testing
/// that persistence failures never reach the learner.
#[derive(Debug)]
pub struct FailingSessionSink;

#[async_trait]
impl<A: Answer> SessionSink<A> for FailingSessionSink {
    async fn persist(&self, _report: &SessionReport<A>) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// A sink whose writes never complete, like a storage backend that stopped
/// answering.
#[derive(Debug)]
pub struct StallingSessionSink;

#[async_trait]
impl<A: Answer> SessionSink<A> for StallingSessionSink {
    async fn persist(&self, _report: &SessionReport<A>) -> Result<(), DomainError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}
