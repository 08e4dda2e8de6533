use chrono::DateTime;

use crate::models::{BandRole, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteCode {
    pub id: i64,
    pub code: String,
    pub band_id: i64,
    pub role: BandRole,
    pub used_by: Option<User>,
    pub expires_at: DateTime<chrono::Utc>,
    pub created_at: DateTime<chrono::Utc>,
}
