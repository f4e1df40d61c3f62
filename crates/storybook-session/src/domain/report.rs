//! The record handed to persistence when a session is finalized.

use serde::Serialize;

use super::attempt::Attempt;
use super::session::Session;

/// A finalized session together with every attempt made during it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport<A> {
    /// Mini-game identifier.
    pub game_id: String,
    /// Fingerprint of the content definition the session was played against.
    pub content_version: Option<String>,
    /// The finalized session.
    pub session: Session,
    /// Ordered attempt log.
    pub attempts: Vec<Attempt<A>>,
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use storybook_core::answer::YesNo;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_report_serializes_derived_correctness() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let session_id = Uuid::new_v4();
        let report = SessionReport {
            game_id: "yes-or-no".to_owned(),
            content_version: None,
            session: Session::new(session_id, 1, now),
            attempts: vec![Attempt::new(
                session_id,
                "wave".into(),
                YesNo::No,
                YesNo::Yes,
                vec!["sensitive".to_owned()],
                now,
            )],
        };

        // Act
        let json = serde_json::to_value(&report).unwrap();

        // Assert
        assert_eq!(json["game_id"], "yes-or-no");
        assert_eq!(json["session"]["total_prompts"], 1);
        assert_eq!(json["attempts"][0]["prompt_id"], "wave");
        assert_eq!(json["attempts"][0]["chosen"], "no");
        assert_eq!(json["attempts"][0]["correct_answer"], "yes");
        assert_eq!(json["attempts"][0]["is_correct"], false);
        assert_eq!(json["attempts"][0]["tags"][0], "sensitive");
    }
}
