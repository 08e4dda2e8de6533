use chrono::DateTime;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Band {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<chrono::Utc>,
}
