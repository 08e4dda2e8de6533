use chrono::DateTime;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PasswordResetToken {
    pub id: i64,
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<chrono::Utc>,
    pub used: bool,
    pub created_at: DateTime<chrono::Utc>,
}
