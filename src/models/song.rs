use chrono::DateTime;

use crate::models::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub id: i64,
    pub poll_id: i64,
    pub suggested_by: User,
    pub artist: String,
    pub title: String,
    pub youtube_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<chrono::Utc>,
}
