//! Runner configuration, read from the environment.

use std::path::PathBuf;

use crate::error::AppError;
use crate::sink::ReportTarget;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// Settings for one runner invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Path of the YAML game definition (`STORYBOOK_GAME`).
    pub game_path: PathBuf,
    /// Where session reports go (`STORYBOOK_REPORT_PATH`, stdout if unset).
    pub report_target: ReportTarget,
    /// Log format (`STORYBOOK_LOG_FORMAT`: `json` or `pretty`).
    pub log_format: LogFormat,
}

impl RunnerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `STORYBOOK_GAME` is missing or
    /// `STORYBOOK_LOG_FORMAT` is not a known format.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Same as [`RunnerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let game_path = lookup("STORYBOOK_GAME")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| {
                AppError::Config("STORYBOOK_GAME environment variable must be set".into())
            })?;

        let report_target = lookup("STORYBOOK_REPORT_PATH")
            .filter(|value| !value.trim().is_empty())
            .map_or(ReportTarget::Stdout, |path| {
                ReportTarget::File(PathBuf::from(path))
            });

        let log_format = match lookup("STORYBOOK_LOG_FORMAT").as_deref() {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "STORYBOOK_LOG_FORMAT must be json or pretty, got {other:?}"
                )));
            }
        };

        Ok(Self {
            game_path,
            report_target,
            log_format,
        })
    }
}
