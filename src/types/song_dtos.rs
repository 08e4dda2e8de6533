use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Song;
use crate::types::UserInfo;

// --- Request Payloads ---
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSongPayload {
    #[validate(length(min = 1, max = 100, message = "Must be between 1 to 100 characters."))]
    pub artist: String,
    #[validate(length(min = 1, max = 200, message = "Must be between 1 to 200 characters."))]
    pub title: String,
    #[validate(length(max = 500, message = "Must be at most 500 characters."))]
    pub youtube_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSongPayload {
    #[validate(length(min = 1, max = 100, message = "Must be between 1 to 100 characters."))]
    pub artist: String,
    #[validate(length(min = 1, max = 200, message = "Must be between 1 to 200 characters."))]
    pub title: String,
    #[validate(length(max = 500, message = "Must be at most 500 characters."))]
    pub youtube_url: Option<String>,
    pub description: Option<String>,
}

// --- Response Bodies ---
#[derive(Debug, Serialize)]
pub struct SongResponse {
    pub id: i64,
    pub poll_id: i64,
    pub artist: String,
    pub title: String,
    pub youtube_url: Option<String>,
    pub description: Option<String>,
    pub suggested_by: UserInfo,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
}

impl SongResponse {
    pub fn new(song: &Song, vote_count: i64) -> Self {
        SongResponse {
            id: song.id,
            poll_id: song.poll_id,
            artist: song.artist.clone(),
            title: song.title.clone(),
            youtube_url: song.youtube_url.clone(),
            description: song.description.clone(),
            suggested_by: UserInfo::from(&song.suggested_by),
            vote_count,
            created_at: song.created_at,
        }
    }
}
