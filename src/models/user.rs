use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account record, managed by the account subsystem. Seatwatch only reads
/// the email to know where to deliver notifications.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
}
