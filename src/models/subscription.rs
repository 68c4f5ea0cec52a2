use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::CourseStatus;

/// A user's request to be notified about one course record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: i64,
    pub course_id: i64,
    pub user_id: i64,
}

/// Result of a "track this course" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackOutcome {
    Full,
    Open,
    Waitlist,
    Nonexistent,
    AlreadyTracked,
}

impl From<CourseStatus> for TrackOutcome {
    fn from(status: CourseStatus) -> Self {
        match status {
            CourseStatus::Full => TrackOutcome::Full,
            CourseStatus::Open => TrackOutcome::Open,
            CourseStatus::Waitlist => TrackOutcome::Waitlist,
            CourseStatus::Nonexistent => TrackOutcome::Nonexistent,
        }
    }
}

/// Result of a "stop tracking" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UntrackOutcome {
    Deleted,
    NotDeleted,
}
