use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Poll, PollStatus};
use crate::types::{SongResponse, UserInfo};

// --- Request Payloads ---
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePollPayload {
    #[validate(length(min = 1, max = 200, message = "Must be between 1 to 200 characters."))]
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePollPayload {
    #[validate(length(min = 1, max = 200, message = "Must be between 1 to 200 characters."))]
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// `?status=ACTIVE` etc. on the poll listing.
#[derive(Debug, Deserialize)]
pub struct PollListQuery {
    pub status: Option<PollStatus>,
}

// --- Response Bodies ---
#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub id: i64,
    pub band_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_by: UserInfo,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PollStatus,
    pub song_count: i64,
    pub created_at: DateTime<Utc>,
}

impl PollResponse {
    pub fn new(poll: &Poll, status: PollStatus, song_count: i64) -> Self {
        PollResponse {
            id: poll.id,
            band_id: poll.band_id,
            title: poll.title.clone(),
            description: poll.description.clone(),
            created_by: UserInfo::from(&poll.created_by),
            start_date: poll.start_date,
            end_date: poll.end_date,
            status,
            song_count,
            created_at: poll.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PollDetailResponse {
    pub id: i64,
    pub band_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_by: UserInfo,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PollStatus,
    pub songs: Vec<SongResponse>,
    /// Song ids the requesting user has voted for in this poll.
    pub my_votes: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl PollDetailResponse {
    pub fn new(
        poll: &Poll,
        status: PollStatus,
        songs: Vec<SongResponse>,
        my_votes: Vec<i64>,
    ) -> Self {
        PollDetailResponse {
            id: poll.id,
            band_id: poll.band_id,
            title: poll.title.clone(),
            description: poll.description.clone(),
            created_by: UserInfo::from(&poll.created_by),
            start_date: poll.start_date,
            end_date: poll.end_date,
            status,
            songs,
            my_votes,
            created_at: poll.created_at,
        }
    }
}
