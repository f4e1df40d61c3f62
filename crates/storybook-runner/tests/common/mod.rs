//! Shared test helpers for runner integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use storybook_runner::sink::ReportTarget;
use storybook_runner::{RunSummary, run_game};
use uuid::Uuid;

/// A report file in the system temp dir, removed on drop.
pub struct ReportFile {
    path: PathBuf,
}

impl ReportFile {
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("storybook-{}.jsonl", Uuid::new_v4())),
        }
    }

    pub fn target(&self) -> ReportTarget {
        ReportTarget::File(self.path.clone())
    }

    /// Every report written so far, one JSON value per line.
    pub fn reports(&self) -> Vec<serde_json::Value> {
        std::fs::read_to_string(&self.path)
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Drop for ReportFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Run `source` once and return the summary with every report written.
pub async fn run(source: &str) -> (RunSummary, Vec<serde_json::Value>) {
    let reports = ReportFile::new();
    let summary = run_game(source, reports.target()).await.unwrap();
    (summary, reports.reports())
}

/// A yes/no quiz with fast timings. `learner` is spliced in as the
/// learner section.
pub fn yes_no_quiz(learner: &str) -> String {
    format!(
        r"
id: feelings-quiz
alphabet: yes_no
timings:
  intro_delay_ms: 100
  post_narration_delay_ms: 100
  feedback_delay_ms: 100
  celebration_ms: 200
  inter_clip_pause_ms: 50
  clip_fallback_ms: 2000
intro: [intro.mp3]
celebration: [yay.mp3]
feedback:
  correct: [great.mp3]
  incorrect: [try-again.mp3]
prompts:
  - id: smile
    correct: yes
    narration: [smile.mp3]
  - id: frown
    correct: no
    narration: [frown.mp3]
    tags: [sensitive]
  - id: wave
    correct: yes
    narration: [wave.mp3]
media:
  default_ms: 300
learner:
{learner}
"
    )
}
