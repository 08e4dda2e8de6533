use chrono::DateTime;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub song_id: i64,
    pub created_at: DateTime<chrono::Utc>,
}
