use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Vote;

// --- Request Payloads ---
#[derive(Debug, Deserialize, Validate)]
pub struct CastVotePayload {
    #[validate(range(min = 1, message = "Must be a valid song id."))]
    pub song_id: i64,
}

// --- Response Bodies ---
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub id: i64,
    pub song_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Vote> for VoteResponse {
    fn from(vote: &Vote) -> Self {
        VoteResponse {
            id: vote.id,
            song_id: vote.song_id,
            user_id: vote.user_id,
            created_at: vote.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MyVoteInfo {
    pub song_id: i64,
    pub vote_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MyVotesResponse {
    pub poll_id: i64,
    pub votes: Vec<MyVoteInfo>,
}

impl MyVotesResponse {
    pub fn new(poll_id: i64, votes: &[Vote]) -> Self {
        MyVotesResponse {
            poll_id,
            votes: votes
                .iter()
                .map(|vote| MyVoteInfo {
                    song_id: vote.song_id,
                    vote_id: vote.id,
                    created_at: vote.created_at,
                })
                .collect(),
        }
    }
}
