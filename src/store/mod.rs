use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    Band, BandMember, BandRole, InviteCode, PasswordResetToken, Poll, Song, User, Vote,
};

mod pg;
pub use pg::PgStore;

#[cfg(test)]
mod memory;
#[cfg(test)]
pub use memory::MemoryStore;

/// Failures below the service layer. `Conflict` is a unique-constraint hit;
/// the service that issued the write knows which domain error it means.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conflicting record already exists")]
    Conflict,
    #[error("storage error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub instrument: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Membership granted by a validated invite code, applied in the same
/// transaction that creates the user.
#[derive(Debug, Clone, Copy)]
pub struct InviteGrant {
    pub code_id: i64,
    pub band_id: i64,
    pub role: BandRole,
}

/// Result of `create_user`. The invite-code claim and the membership insert
/// race with other registrations, so the store reports which step lost.
#[derive(Debug)]
pub enum CreatedUser {
    Created {
        user: User,
        membership: Option<BandMember>,
    },
    EmailTaken,
    InviteSpent,
    AlreadyMember,
}

#[derive(Debug, Clone)]
pub struct NewBand {
    pub name: String,
    pub description: Option<String>,
    pub creator_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UpdatedBand {
    pub name: String,
    pub description: Option<String>,
}

/// A band as seen by one of its members.
#[derive(Debug, Clone)]
pub struct BandWithMembership {
    pub band: Band,
    pub role: BandRole,
    pub member_count: i64,
}

/// Result of a guarded role change.
#[derive(Debug)]
pub enum RoleUpdate {
    Applied(BandMember),
    LastLeader,
    NotFound,
}

/// Result of a guarded member removal.
#[derive(Debug, PartialEq, Eq)]
pub enum MemberRemoval {
    Removed,
    LastLeader,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct NewInviteCode {
    pub code: String,
    pub band_id: i64,
    pub role: BandRole,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPoll {
    pub band_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_by: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UpdatedPoll {
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PollWithSongCount {
    pub poll: Poll,
    pub song_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewSong {
    pub poll_id: i64,
    pub suggested_by: i64,
    pub artist: String,
    pub title: String,
    pub youtube_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UpdatedSong {
    pub artist: String,
    pub title: String,
    pub youtube_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewResetToken {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Persistence seam. `PgStore` implements it against Postgres; the in-memory
/// implementation backs the unit tests.
///
/// Multi-step invariants (one leader per band, single-use invites, one vote
/// per user per song) are enforced HERE, atomically, not in the services.
#[async_trait]
pub trait Store: Send + Sync {
    // Users

    async fn create_user(&self, user: NewUser, grant: Option<InviteGrant>)
        -> StoreResult<CreatedUser>;

    async fn user_by_id(&self, user_id: i64) -> StoreResult<Option<User>>;

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    // Bands

    /// Creates the band and its founding LEADER membership atomically.
    async fn create_band(&self, band: NewBand) -> StoreResult<(Band, BandMember)>;

    async fn band_by_id(&self, band_id: i64) -> StoreResult<Option<Band>>;

    async fn update_band(&self, band_id: i64, band: UpdatedBand) -> StoreResult<Option<Band>>;

    /// Deletes the band and everything hanging off it (members, invites,
    /// polls, songs, votes). Returns false if the band did not exist.
    async fn delete_band(&self, band_id: i64) -> StoreResult<bool>;

    async fn bands_for_user(&self, user_id: i64) -> StoreResult<Vec<BandWithMembership>>;

    // Memberships

    async fn member_record(&self, band_id: i64, user_id: i64)
        -> StoreResult<Option<BandMember>>;

    async fn members_of_band(&self, band_id: i64) -> StoreResult<Vec<BandMember>>;

    async fn count_members(&self, band_id: i64) -> StoreResult<i64>;

    /// Applies the role change unless it would demote the band's only
    /// leader. The guard and the update are a single atomic statement.
    async fn update_member_role(
        &self,
        band_id: i64,
        user_id: i64,
        role: BandRole,
    ) -> StoreResult<RoleUpdate>;

    /// Removes the membership unless it is the band's only leader.
    async fn remove_member(&self, band_id: i64, user_id: i64) -> StoreResult<MemberRemoval>;

    // Invite codes

    async fn create_invite_code(&self, invite: NewInviteCode) -> StoreResult<InviteCode>;

    async fn invite_codes_for_band(&self, band_id: i64) -> StoreResult<Vec<InviteCode>>;

    async fn invite_code_by_code(&self, code: &str) -> StoreResult<Option<InviteCode>>;

    async fn delete_invite_code(&self, invite_id: i64) -> StoreResult<bool>;

    // Polls

    async fn create_poll(&self, poll: NewPoll) -> StoreResult<Poll>;

    async fn poll_by_id(&self, poll_id: i64) -> StoreResult<Option<Poll>>;

    /// Newest first (by start date, then id).
    async fn polls_for_band(&self, band_id: i64) -> StoreResult<Vec<PollWithSongCount>>;

    async fn update_poll(&self, poll_id: i64, poll: UpdatedPoll) -> StoreResult<Option<Poll>>;

    async fn delete_poll(&self, poll_id: i64) -> StoreResult<bool>;

    async fn count_songs_for_poll(&self, poll_id: i64) -> StoreResult<i64>;

    // Songs

    async fn create_song(&self, song: NewSong) -> StoreResult<Song>;

    async fn song_by_id(&self, song_id: i64) -> StoreResult<Option<Song>>;

    async fn songs_for_poll(&self, poll_id: i64) -> StoreResult<Vec<Song>>;

    async fn update_song(&self, song_id: i64, song: UpdatedSong) -> StoreResult<Option<Song>>;

    /// Deletes the song and its votes. Returns false if it did not exist.
    async fn delete_song(&self, song_id: i64) -> StoreResult<bool>;

    // Votes

    /// One vote per user per song; a second insert returns
    /// `StoreError::Conflict`.
    async fn create_vote(
        &self,
        user_id: i64,
        song_id: i64,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Vote>;

    async fn vote_by_id(&self, vote_id: i64) -> StoreResult<Option<Vote>>;

    async fn vote_exists(&self, user_id: i64, song_id: i64) -> StoreResult<bool>;

    async fn delete_vote(&self, vote_id: i64) -> StoreResult<bool>;

    async fn votes_for_user_in_poll(&self, user_id: i64, poll_id: i64)
        -> StoreResult<Vec<Vote>>;

    async fn count_votes_for_song(&self, song_id: i64) -> StoreResult<i64>;

    /// Vote tallies for every song in the poll, keyed by song id. Songs with
    /// no votes are absent.
    async fn vote_counts_for_poll(&self, poll_id: i64) -> StoreResult<HashMap<i64, i64>>;

    // Password reset tokens

    async fn create_reset_token(&self, token: NewResetToken)
        -> StoreResult<PasswordResetToken>;

    async fn reset_token_by_token(&self, token: &str)
        -> StoreResult<Option<PasswordResetToken>>;

    /// Invalidates any outstanding tokens for the address before a new one
    /// is issued.
    async fn delete_unused_reset_tokens(&self, email: &str) -> StoreResult<()>;

    /// Marks the token used and updates the user's password hash in one
    /// transaction. Returns false if the token was already spent.
    async fn consume_reset_token(
        &self,
        token_id: i64,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<bool>;
}
