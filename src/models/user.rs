use chrono::DateTime;
use sqlx::FromRow;

// No Serialize on purpose: password_hash must never reach a response body.
// The wire shape lives in `crate::types::UserInfo`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub instrument: Option<String>,
    pub created_at: DateTime<chrono::Utc>,
}
