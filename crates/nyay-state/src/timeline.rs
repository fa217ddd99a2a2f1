//! Free-form timeline entries a lawyer posts on a case ("Hearing adjourned",
//! "Documents filed"). Independent of the stage; appending one never moves it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use nyay_core::{Timestamp, ValidationError};

/// Status badge of a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineStatus {
    /// Already happened.
    #[default]
    Completed,
    /// In progress.
    Pending,
    /// Scheduled.
    Upcoming,
}

impl TimelineStatus {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Upcoming => "upcoming",
        }
    }
}

impl FromStr for TimelineStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "pending" => Ok(Self::Pending),
            "upcoming" => Ok(Self::Upcoming),
            _ => Err(ValidationError::UnknownOption {
                field: "timeline status",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for TimelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timeline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Short headline.
    pub title: String,
    /// When the entry was posted.
    pub date: Timestamp,
    /// Badge.
    #[serde(default)]
    pub status: TimelineStatus,
    /// Optional detail text.
    #[serde(default)]
    pub description: String,
}

impl TimelineEntry {
    /// A new entry dated now. The title must not be blank.
    pub fn new(
        title: impl Into<String>,
        status: TimelineStatus,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        Ok(Self {
            title,
            date: Timestamp::now(),
            status,
            description: description.into(),
        })
    }
}
