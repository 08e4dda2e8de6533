use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PollStatus {
    Upcoming,
    Active,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    pub id: i64,
    pub band_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_by: User,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Never stored: always recomputed from the caller's "now".
    /// Both bounds are inclusive, so a poll with start == end is
    /// active for exactly that instant.
    pub fn status(&self, now: DateTime<Utc>) -> PollStatus {
        if now < self.start_date {
            PollStatus::Upcoming
        } else if now > self.end_date {
            PollStatus::Ended
        } else {
            PollStatus::Active
        }
    }
}
