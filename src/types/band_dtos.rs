use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Band, BandMember, BandRole, InviteCode};
use crate::types::UserInfo;

// --- Request Payloads ---
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBandPayload {
    #[validate(length(min = 1, max = 100, message = "Must be between 1 to 100 characters."))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBandPayload {
    #[validate(length(min = 1, max = 100, message = "Must be between 1 to 100 characters."))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMemberRolePayload {
    pub role: BandRole,
}

fn default_invite_expiry_days() -> i64 {
    30
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInviteCodePayload {
    #[validate(range(min = 1, message = "Must be at least 1 day."))]
    #[serde(default = "default_invite_expiry_days")]
    pub expires_in_days: i64,
    #[serde(default)]
    pub role: BandRole,
}

// --- Response Bodies ---

/// Minimal band listing used inside auth responses.
#[derive(Debug, Serialize)]
pub struct BandSummary {
    pub id: i64,
    pub name: String,
    pub role: BandRole,
}

impl BandSummary {
    pub fn new(band: &Band, role: BandRole) -> Self {
        BandSummary {
            id: band.id,
            name: band.name.clone(),
            role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BandResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub role: BandRole,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

impl BandResponse {
    pub fn new(band: &Band, role: BandRole, member_count: i64) -> Self {
        BandResponse {
            id: band.id,
            name: band.name.clone(),
            description: band.description.clone(),
            role,
            member_count,
            created_at: band.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BandMemberInfo {
    pub user: UserInfo,
    pub role: BandRole,
    pub joined_at: DateTime<Utc>,
}

impl From<&BandMember> for BandMemberInfo {
    fn from(member: &BandMember) -> Self {
        BandMemberInfo {
            user: UserInfo::from(&member.user),
            role: member.role,
            joined_at: member.joined_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BandDetailResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<BandMemberInfo>,
    pub created_at: DateTime<Utc>,
}

impl BandDetailResponse {
    pub fn new(band: &Band, members: &[BandMember]) -> Self {
        BandDetailResponse {
            id: band.id,
            name: band.name.clone(),
            description: band.description.clone(),
            members: members.iter().map(BandMemberInfo::from).collect(),
            created_at: band.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InviteCodeResponse {
    pub code: String,
    pub role: BandRole,
    pub used_by: Option<UserInfo>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&InviteCode> for InviteCodeResponse {
    fn from(invite: &InviteCode) -> Self {
        InviteCodeResponse {
            code: invite.code.clone(),
            role: invite.role,
            used_by: invite.used_by.as_ref().map(UserInfo::from),
            expires_at: invite.expires_at,
            created_at: invite.created_at,
        }
    }
}
