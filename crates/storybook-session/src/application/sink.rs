//! Persistence boundary.

use async_trait::async_trait;
use storybook_core::answer::Answer;
use storybook_core::error::DomainError;

use crate::domain::report::SessionReport;

/// Receives each finalized session with its attempt log. Transport and
/// storage are the implementor's concern.
#[async_trait]
pub trait SessionSink<A: Answer>: Send + Sync {
    /// Persist one finalized session.
    async fn persist(&self, report: &SessionReport<A>) -> Result<(), DomainError>;
}
