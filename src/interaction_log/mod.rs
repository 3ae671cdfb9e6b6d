//! Interaction log for questions, answers and user feedback.
//!
//! Every answered question is recorded with status "New". Feedback on an
//! answer later updates the first record with the same question text.

mod sqlite;

pub use sqlite::SqliteInteractionLog;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Feedback a user can give on an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Accurate,
    NotAccurate,
    CanImprove,
}

impl Feedback {
    pub const ALL: [Feedback; 3] = [Feedback::Accurate, Feedback::NotAccurate, Feedback::CanImprove];

    /// Stable identifier, also used as the stored feedback value.
    pub fn id(&self) -> &'static str {
        match self {
            Feedback::Accurate => "accurate",
            Feedback::NotAccurate => "not_accurate",
            Feedback::CanImprove => "can_improve",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Feedback::Accurate => "✅ Accurate",
            Feedback::NotAccurate => "❌ Not Accurate",
            Feedback::CanImprove => "📝 Can Be Improved",
        }
    }

    /// Review status an interaction moves to after this feedback.
    pub fn status(&self) -> InteractionStatus {
        match self {
            Feedback::Accurate => InteractionStatus::Resolved,
            Feedback::NotAccurate => InteractionStatus::UpdateNeeded,
            Feedback::CanImprove => InteractionStatus::ReviewNeeded,
        }
    }

    pub fn thanks(&self) -> &'static str {
        match self {
            Feedback::Accurate => "Thank you for confirming that the answer was accurate! 🎯",
            Feedback::NotAccurate => {
                "Thank you for letting us know the answer wasn't accurate. We'll work on improving it! 🎯"
            }
            Feedback::CanImprove => {
                "Thank you for the feedback! We'll work on improving the answer quality. 📈"
            }
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Feedback {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "accurate" => Ok(Feedback::Accurate),
            "not_accurate" => Ok(Feedback::NotAccurate),
            "can_improve" => Ok(Feedback::CanImprove),
            other => Err(format!(
                "Unknown feedback '{}'. Expected one of: accurate, not_accurate, can_improve",
                other
            )),
        }
    }
}

/// Review state of a logged interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionStatus {
    New,
    Resolved,
    UpdateNeeded,
    ReviewNeeded,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStatus::New => "New",
            InteractionStatus::Resolved => "Resolved",
            InteractionStatus::UpdateNeeded => "Update Needed",
            InteractionStatus::ReviewNeeded => "Review Needed",
        }
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "New" => Ok(InteractionStatus::New),
            "Resolved" => Ok(InteractionStatus::Resolved),
            "Update Needed" => Ok(InteractionStatus::UpdateNeeded),
            "Review Needed" => Ok(InteractionStatus::ReviewNeeded),
            other => Err(format!("Unknown interaction status: {}", other)),
        }
    }
}

/// One logged question and answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: Uuid,
    /// Local time at the configured offset, `%Y-%m-%d %H:%M:%S`.
    pub date: String,
    pub question: String,
    pub answer: String,
    pub feedback: Option<Feedback>,
    pub improvements: String,
    pub status: InteractionStatus,
}

/// Append-only record of interactions with feedback updates.
#[async_trait]
pub trait InteractionLog: Send + Sync {
    /// Record a new interaction with status "New".
    async fn log_interaction(&self, question: &str, answer: &str) -> Result<Interaction>;

    /// Attach feedback to the first interaction whose question matches exactly.
    ///
    /// Returns false when no interaction matched.
    async fn update_feedback(&self, question: &str, feedback: Feedback) -> Result<bool>;

    /// Most recent interactions, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<Interaction>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_maps_to_status() {
        assert_eq!(Feedback::Accurate.status(), InteractionStatus::Resolved);
        assert_eq!(Feedback::NotAccurate.status().to_string(), "Update Needed");
        assert_eq!(Feedback::CanImprove.status().to_string(), "Review Needed");
    }

    #[test]
    fn test_feedback_parse() {
        assert_eq!("accurate".parse::<Feedback>().unwrap(), Feedback::Accurate);
        assert_eq!("not-accurate".parse::<Feedback>().unwrap(), Feedback::NotAccurate);
        assert_eq!(" CAN_IMPROVE ".parse::<Feedback>().unwrap(), Feedback::CanImprove);
        assert!("great".parse::<Feedback>().is_err());

        for feedback in Feedback::ALL {
            assert_eq!(feedback.id().parse::<Feedback>().unwrap(), feedback);
        }
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            InteractionStatus::New,
            InteractionStatus::Resolved,
            InteractionStatus::UpdateNeeded,
            InteractionStatus::ReviewNeeded,
        ] {
            assert_eq!(status.as_str().parse::<InteractionStatus>().unwrap(), status);
        }
    }
}
