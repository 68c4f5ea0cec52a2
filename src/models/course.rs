use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Enrollment state of a course section as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Full = 0,
    Open = 1,
    Waitlist = 2,
    /// The course code is not offered in that term at all.
    Nonexistent = 3,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub status: CourseStatus,
    pub term: String,
}
