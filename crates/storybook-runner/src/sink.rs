//! JSON-lines session sink.

use std::path::PathBuf;

use async_trait::async_trait;
use storybook_core::answer::Answer;
use storybook_core::error::DomainError;
use storybook_session::application::sink::SessionSink;
use storybook_session::domain::report::SessionReport;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Where reports are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ReportTarget {
    /// Standard output.
    #[default]
    Stdout,
    /// A file, created if missing and appended to.
    File(PathBuf),
}

/// Writes each finalized session as one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    target: ReportTarget,
}

impl JsonLinesSink {
    /// Creates a sink writing to `target`.
    #[must_use]
    pub fn new(target: ReportTarget) -> Self {
        Self { target }
    }

    async fn append(&self, line: &[u8]) -> std::io::Result<()> {
        match &self.target {
            ReportTarget::Stdout => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(line).await?;
                stdout.flush().await
            }
            ReportTarget::File(path) => {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(line).await?;
                file.flush().await
            }
        }
    }
}

#[async_trait]
impl<A: Answer> SessionSink<A> for JsonLinesSink {
    async fn persist(&self, report: &SessionReport<A>) -> Result<(), DomainError> {
        let mut line = serde_json::to_vec(report)
            .map_err(|e| DomainError::Infrastructure(format!("failed to encode report: {e}")))?;
        line.push(b'\n');

        self.append(&line)
            .await
            .map_err(|e| DomainError::Infrastructure(format!("failed to write report: {e}")))?;
        debug!(destination = ?self.target, bytes = line.len(), "report written");
        Ok(())
    }
}
