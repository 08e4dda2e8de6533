use std::str::FromStr;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::models::User;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BandRole {
    Leader,
    #[default]
    Member,
}

impl BandRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BandRole::Leader => "LEADER",
            BandRole::Member => "MEMBER",
        }
    }

    pub fn is_leader(&self) -> bool {
        matches!(self, BandRole::Leader)
    }
}

#[derive(Debug)]
pub struct InvalidBandRole;

impl FromStr for BandRole {
    type Err = InvalidBandRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LEADER" => Ok(BandRole::Leader),
            "MEMBER" => Ok(BandRole::Member),
            _ => Err(InvalidBandRole),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandMember {
    pub id: i64,
    pub band_id: i64,
    pub user: User,
    pub role: BandRole,
    pub joined_at: DateTime<chrono::Utc>,
}
