use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::models::{
    Band, BandMember, BandRole, InviteCode, PasswordResetToken, Poll, Song, User, Vote,
};
use crate::store::{
    BandWithMembership, CreatedUser, InviteGrant, MemberRemoval, NewBand, NewInviteCode, NewPoll,
    NewResetToken, NewSong, NewUser, PollWithSongCount, RoleUpdate, Store, StoreError,
    StoreResult, UpdatedBand, UpdatedPoll, UpdatedSong,
};

/// In-memory [`Store`] backing the unit tests. One lock guards every table,
/// so the multi-step writes are atomic the same way the SQL transactions
/// are: validate everything first, then apply.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    bands: Vec<Band>,
    members: Vec<MemberRow>,
    invites: Vec<InviteRow>,
    polls: Vec<PollRow>,
    songs: Vec<SongRow>,
    votes: Vec<Vote>,
    reset_tokens: Vec<PasswordResetToken>,
    next_id: i64,
}

#[derive(Clone)]
struct MemberRow {
    id: i64,
    band_id: i64,
    user_id: i64,
    role: BandRole,
    joined_at: DateTime<Utc>,
}

#[derive(Clone)]
struct InviteRow {
    id: i64,
    code: String,
    band_id: i64,
    role: BandRole,
    used_by_user_id: Option<i64>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
struct PollRow {
    id: i64,
    band_id: i64,
    title: String,
    description: Option<String>,
    created_by_user_id: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
struct SongRow {
    id: i64,
    poll_id: i64,
    suggested_by_user_id: i64,
    artist: String,
    title: String,
    youtube_url: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, user_id: i64) -> StoreResult<User> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| StoreError::Internal(format!("user {user_id} does not exist")))
    }

    fn member(&self, row: &MemberRow) -> StoreResult<BandMember> {
        Ok(BandMember {
            id: row.id,
            band_id: row.band_id,
            user: self.user(row.user_id)?,
            role: row.role,
            joined_at: row.joined_at,
        })
    }

    fn invite(&self, row: &InviteRow) -> StoreResult<InviteCode> {
        Ok(InviteCode {
            id: row.id,
            code: row.code.clone(),
            band_id: row.band_id,
            role: row.role,
            used_by: row.used_by_user_id.map(|id| self.user(id)).transpose()?,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }

    fn poll(&self, row: &PollRow) -> StoreResult<Poll> {
        Ok(Poll {
            id: row.id,
            band_id: row.band_id,
            title: row.title.clone(),
            description: row.description.clone(),
            created_by: self.user(row.created_by_user_id)?,
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
        })
    }

    fn song(&self, row: &SongRow) -> StoreResult<Song> {
        Ok(Song {
            id: row.id,
            poll_id: row.poll_id,
            suggested_by: self.user(row.suggested_by_user_id)?,
            artist: row.artist.clone(),
            title: row.title.clone(),
            youtube_url: row.youtube_url.clone(),
            description: row.description.clone(),
            created_at: row.created_at,
        })
    }

    fn leader_count(&self, band_id: i64) -> usize {
        self.members
            .iter()
            .filter(|m| m.band_id == band_id && m.role.is_leader())
            .count()
    }

    fn song_count(&self, poll_id: i64) -> i64 {
        self.songs.iter().filter(|s| s.poll_id == poll_id).count() as i64
    }

    fn delete_poll_rows(&mut self, poll_id: i64) {
        let song_ids: Vec<i64> = self
            .songs
            .iter()
            .filter(|s| s.poll_id == poll_id)
            .map(|s| s.id)
            .collect();

        self.votes.retain(|v| !song_ids.contains(&v.song_id));
        self.songs.retain(|s| s.poll_id != poll_id);
        self.polls.retain(|p| p.id != poll_id);
    }

    fn delete_band_rows(&mut self, band_id: i64) {
        let poll_ids: Vec<i64> = self
            .polls
            .iter()
            .filter(|p| p.band_id == band_id)
            .map(|p| p.id)
            .collect();

        for poll_id in poll_ids {
            self.delete_poll_rows(poll_id);
        }

        self.members.retain(|m| m.band_id != band_id);
        self.invites.retain(|i| i.band_id != band_id);
        self.bands.retain(|b| b.id != band_id);
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a membership directly, bypassing the invite-code flow.
    pub fn insert_member(
        &self,
        band_id: i64,
        user: &User,
        role: BandRole,
        joined_at: DateTime<Utc>,
    ) -> BandMember {
        let mut tables = self.tables.lock();
        let id = tables.next_id();

        tables.members.push(MemberRow {
            id,
            band_id,
            user_id: user.id,
            role,
            joined_at,
        });

        BandMember {
            id,
            band_id,
            user: user.clone(),
            role,
            joined_at,
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(
        &self,
        user: NewUser,
        grant: Option<InviteGrant>,
    ) -> StoreResult<CreatedUser> {
        let mut tables = self.tables.lock();

        if tables.users.iter().any(|u| u.email == user.email) {
            return Ok(CreatedUser::EmailTaken);
        }

        if let Some(grant) = &grant {
            let spent = tables
                .invites
                .iter()
                .find(|i| i.id == grant.code_id)
                .map(|i| i.used_by_user_id.is_some())
                .ok_or_else(|| {
                    StoreError::Internal(format!("invite code {} does not exist", grant.code_id))
                })?;

            if spent {
                return Ok(CreatedUser::InviteSpent);
            }
        }

        let id = tables.next_id();
        let created = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            instrument: user.instrument,
            created_at: user.created_at,
        };
        tables.users.push(created.clone());

        let mut membership = None;

        if let Some(grant) = grant {
            if let Some(invite) = tables.invites.iter_mut().find(|i| i.id == grant.code_id) {
                invite.used_by_user_id = Some(id);
            }

            let member_id = tables.next_id();
            tables.members.push(MemberRow {
                id: member_id,
                band_id: grant.band_id,
                user_id: id,
                role: grant.role,
                joined_at: user.created_at,
            });

            membership = Some(BandMember {
                id: member_id,
                band_id: grant.band_id,
                user: created.clone(),
                role: grant.role,
                joined_at: user.created_at,
            });
        }

        Ok(CreatedUser::Created {
            user: created,
            membership,
        })
    }

    async fn user_by_id(&self, user_id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables.lock();
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_band(&self, band: NewBand) -> StoreResult<(Band, BandMember)> {
        let mut tables = self.tables.lock();
        let creator = tables.user(band.creator_id)?;

        let band_id = tables.next_id();
        let created = Band {
            id: band_id,
            name: band.name,
            description: band.description,
            created_at: band.created_at,
        };
        tables.bands.push(created.clone());

        let member_id = tables.next_id();
        tables.members.push(MemberRow {
            id: member_id,
            band_id,
            user_id: creator.id,
            role: BandRole::Leader,
            joined_at: band.created_at,
        });

        let membership = BandMember {
            id: member_id,
            band_id,
            user: creator,
            role: BandRole::Leader,
            joined_at: band.created_at,
        };

        Ok((created, membership))
    }

    async fn band_by_id(&self, band_id: i64) -> StoreResult<Option<Band>> {
        let tables = self.tables.lock();
        Ok(tables.bands.iter().find(|b| b.id == band_id).cloned())
    }

    async fn update_band(&self, band_id: i64, band: UpdatedBand) -> StoreResult<Option<Band>> {
        let mut tables = self.tables.lock();

        let Some(existing) = tables.bands.iter_mut().find(|b| b.id == band_id) else {
            return Ok(None);
        };

        existing.name = band.name;
        existing.description = band.description;

        Ok(Some(existing.clone()))
    }

    async fn delete_band(&self, band_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock();

        if !tables.bands.iter().any(|b| b.id == band_id) {
            return Ok(false);
        }

        tables.delete_band_rows(band_id);
        Ok(true)
    }

    async fn bands_for_user(&self, user_id: i64) -> StoreResult<Vec<BandWithMembership>> {
        let tables = self.tables.lock();

        let mut rows: Vec<&MemberRow> = tables
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.band_id.cmp(&b.band_id)));

        rows.into_iter()
            .map(|row| {
                let band = tables
                    .bands
                    .iter()
                    .find(|b| b.id == row.band_id)
                    .cloned()
                    .ok_or_else(|| {
                        StoreError::Internal(format!("band {} does not exist", row.band_id))
                    })?;

                let member_count = tables
                    .members
                    .iter()
                    .filter(|m| m.band_id == row.band_id)
                    .count() as i64;

                Ok(BandWithMembership {
                    band,
                    role: row.role,
                    member_count,
                })
            })
            .collect()
    }

    async fn member_record(
        &self,
        band_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<BandMember>> {
        let tables = self.tables.lock();

        tables
            .members
            .iter()
            .find(|m| m.band_id == band_id && m.user_id == user_id)
            .map(|row| tables.member(row))
            .transpose()
    }

    async fn members_of_band(&self, band_id: i64) -> StoreResult<Vec<BandMember>> {
        let tables = self.tables.lock();

        let mut rows: Vec<&MemberRow> = tables
            .members
            .iter()
            .filter(|m| m.band_id == band_id)
            .collect();
        rows.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.id.cmp(&b.id)));

        rows.into_iter().map(|row| tables.member(row)).collect()
    }

    async fn count_members(&self, band_id: i64) -> StoreResult<i64> {
        let tables = self.tables.lock();
        Ok(tables.members.iter().filter(|m| m.band_id == band_id).count() as i64)
    }

    async fn update_member_role(
        &self,
        band_id: i64,
        user_id: i64,
        role: BandRole,
    ) -> StoreResult<RoleUpdate> {
        let mut tables = self.tables.lock();

        let Some(index) = tables
            .members
            .iter()
            .position(|m| m.band_id == band_id && m.user_id == user_id)
        else {
            return Ok(RoleUpdate::NotFound);
        };

        let current = tables.members[index].role;
        if current.is_leader() && !role.is_leader() && tables.leader_count(band_id) <= 1 {
            return Ok(RoleUpdate::LastLeader);
        }

        tables.members[index].role = role;

        let row = tables.members[index].clone();
        Ok(RoleUpdate::Applied(tables.member(&row)?))
    }

    async fn remove_member(&self, band_id: i64, user_id: i64) -> StoreResult<MemberRemoval> {
        let mut tables = self.tables.lock();

        let Some(index) = tables
            .members
            .iter()
            .position(|m| m.band_id == band_id && m.user_id == user_id)
        else {
            return Ok(MemberRemoval::NotFound);
        };

        if tables.members[index].role.is_leader() && tables.leader_count(band_id) <= 1 {
            return Ok(MemberRemoval::LastLeader);
        }

        tables.members.remove(index);
        Ok(MemberRemoval::Removed)
    }

    async fn create_invite_code(&self, invite: NewInviteCode) -> StoreResult<InviteCode> {
        let mut tables = self.tables.lock();

        let id = tables.next_id();
        tables.invites.push(InviteRow {
            id,
            code: invite.code.clone(),
            band_id: invite.band_id,
            role: invite.role,
            used_by_user_id: None,
            expires_at: invite.expires_at,
            created_at: invite.created_at,
        });

        Ok(InviteCode {
            id,
            code: invite.code,
            band_id: invite.band_id,
            role: invite.role,
            used_by: None,
            expires_at: invite.expires_at,
            created_at: invite.created_at,
        })
    }

    async fn invite_codes_for_band(&self, band_id: i64) -> StoreResult<Vec<InviteCode>> {
        let tables = self.tables.lock();

        let mut rows: Vec<&InviteRow> = tables
            .invites
            .iter()
            .filter(|i| i.band_id == band_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        rows.into_iter().map(|row| tables.invite(row)).collect()
    }

    async fn invite_code_by_code(&self, code: &str) -> StoreResult<Option<InviteCode>> {
        let tables = self.tables.lock();

        tables
            .invites
            .iter()
            .find(|i| i.code == code)
            .map(|row| tables.invite(row))
            .transpose()
    }

    async fn delete_invite_code(&self, invite_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock();

        let Some(index) = tables.invites.iter().position(|i| i.id == invite_id) else {
            return Ok(false);
        };

        tables.invites.remove(index);
        Ok(true)
    }

    async fn create_poll(&self, poll: NewPoll) -> StoreResult<Poll> {
        let mut tables = self.tables.lock();

        let id = tables.next_id();
        let row = PollRow {
            id,
            band_id: poll.band_id,
            title: poll.title,
            description: poll.description,
            created_by_user_id: poll.created_by,
            start_date: poll.start_date,
            end_date: poll.end_date,
            created_at: poll.created_at,
        };
        tables.polls.push(row.clone());

        tables.poll(&row)
    }

    async fn poll_by_id(&self, poll_id: i64) -> StoreResult<Option<Poll>> {
        let tables = self.tables.lock();

        tables
            .polls
            .iter()
            .find(|p| p.id == poll_id)
            .map(|row| tables.poll(row))
            .transpose()
    }

    async fn polls_for_band(&self, band_id: i64) -> StoreResult<Vec<PollWithSongCount>> {
        let tables = self.tables.lock();

        let mut rows: Vec<&PollRow> = tables
            .polls
            .iter()
            .filter(|p| p.band_id == band_id)
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));

        rows.into_iter()
            .map(|row| {
                Ok(PollWithSongCount {
                    poll: tables.poll(row)?,
                    song_count: tables.song_count(row.id),
                })
            })
            .collect()
    }

    async fn update_poll(&self, poll_id: i64, poll: UpdatedPoll) -> StoreResult<Option<Poll>> {
        let mut tables = self.tables.lock();

        let Some(index) = tables.polls.iter().position(|p| p.id == poll_id) else {
            return Ok(None);
        };

        let row = &mut tables.polls[index];
        row.title = poll.title;
        row.description = poll.description;
        row.start_date = poll.start_date;
        row.end_date = poll.end_date;

        let row = tables.polls[index].clone();
        tables.poll(&row).map(Some)
    }

    async fn delete_poll(&self, poll_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock();

        if !tables.polls.iter().any(|p| p.id == poll_id) {
            return Ok(false);
        }

        tables.delete_poll_rows(poll_id);
        Ok(true)
    }

    async fn count_songs_for_poll(&self, poll_id: i64) -> StoreResult<i64> {
        let tables = self.tables.lock();
        Ok(tables.song_count(poll_id))
    }

    async fn create_song(&self, song: NewSong) -> StoreResult<Song> {
        let mut tables = self.tables.lock();

        let id = tables.next_id();
        let row = SongRow {
            id,
            poll_id: song.poll_id,
            suggested_by_user_id: song.suggested_by,
            artist: song.artist,
            title: song.title,
            youtube_url: song.youtube_url,
            description: song.description,
            created_at: song.created_at,
        };
        tables.songs.push(row.clone());

        tables.song(&row)
    }

    async fn song_by_id(&self, song_id: i64) -> StoreResult<Option<Song>> {
        let tables = self.tables.lock();

        tables
            .songs
            .iter()
            .find(|s| s.id == song_id)
            .map(|row| tables.song(row))
            .transpose()
    }

    async fn songs_for_poll(&self, poll_id: i64) -> StoreResult<Vec<Song>> {
        let tables = self.tables.lock();

        let mut rows: Vec<&SongRow> = tables
            .songs
            .iter()
            .filter(|s| s.poll_id == poll_id)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        rows.into_iter().map(|row| tables.song(row)).collect()
    }

    async fn update_song(&self, song_id: i64, song: UpdatedSong) -> StoreResult<Option<Song>> {
        let mut tables = self.tables.lock();

        let Some(index) = tables.songs.iter().position(|s| s.id == song_id) else {
            return Ok(None);
        };

        let row = &mut tables.songs[index];
        row.artist = song.artist;
        row.title = song.title;
        row.youtube_url = song.youtube_url;
        row.description = song.description;

        let row = tables.songs[index].clone();
        tables.song(&row).map(Some)
    }

    async fn delete_song(&self, song_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock();

        if !tables.songs.iter().any(|s| s.id == song_id) {
            return Ok(false);
        }

        tables.votes.retain(|v| v.song_id != song_id);
        tables.songs.retain(|s| s.id != song_id);
        Ok(true)
    }

    async fn create_vote(
        &self,
        user_id: i64,
        song_id: i64,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Vote> {
        let mut tables = self.tables.lock();

        if tables
            .votes
            .iter()
            .any(|v| v.user_id == user_id && v.song_id == song_id)
        {
            return Err(StoreError::Conflict);
        }

        let vote = Vote {
            id: tables.next_id(),
            user_id,
            song_id,
            created_at,
        };
        tables.votes.push(vote.clone());

        Ok(vote)
    }

    async fn vote_by_id(&self, vote_id: i64) -> StoreResult<Option<Vote>> {
        let tables = self.tables.lock();
        Ok(tables.votes.iter().find(|v| v.id == vote_id).cloned())
    }

    async fn vote_exists(&self, user_id: i64, song_id: i64) -> StoreResult<bool> {
        let tables = self.tables.lock();
        Ok(tables
            .votes
            .iter()
            .any(|v| v.user_id == user_id && v.song_id == song_id))
    }

    async fn delete_vote(&self, vote_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock();

        let Some(index) = tables.votes.iter().position(|v| v.id == vote_id) else {
            return Ok(false);
        };

        tables.votes.remove(index);
        Ok(true)
    }

    async fn votes_for_user_in_poll(
        &self,
        user_id: i64,
        poll_id: i64,
    ) -> StoreResult<Vec<Vote>> {
        let tables = self.tables.lock();

        let song_ids: Vec<i64> = tables
            .songs
            .iter()
            .filter(|s| s.poll_id == poll_id)
            .map(|s| s.id)
            .collect();

        let mut votes: Vec<Vote> = tables
            .votes
            .iter()
            .filter(|v| v.user_id == user_id && song_ids.contains(&v.song_id))
            .cloned()
            .collect();
        votes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Ok(votes)
    }

    async fn count_votes_for_song(&self, song_id: i64) -> StoreResult<i64> {
        let tables = self.tables.lock();
        Ok(tables.votes.iter().filter(|v| v.song_id == song_id).count() as i64)
    }

    async fn vote_counts_for_poll(&self, poll_id: i64) -> StoreResult<HashMap<i64, i64>> {
        let tables = self.tables.lock();

        let song_ids: Vec<i64> = tables
            .songs
            .iter()
            .filter(|s| s.poll_id == poll_id)
            .map(|s| s.id)
            .collect();

        let mut counts = HashMap::new();
        for vote in tables.votes.iter().filter(|v| song_ids.contains(&v.song_id)) {
            *counts.entry(vote.song_id).or_insert(0) += 1;
        }

        Ok(counts)
    }

    async fn create_reset_token(
        &self,
        token: NewResetToken,
    ) -> StoreResult<PasswordResetToken> {
        let mut tables = self.tables.lock();

        let created = PasswordResetToken {
            id: tables.next_id(),
            token: token.token,
            email: token.email,
            expires_at: token.expires_at,
            used: false,
            created_at: token.created_at,
        };
        tables.reset_tokens.push(created.clone());

        Ok(created)
    }

    async fn reset_token_by_token(
        &self,
        token: &str,
    ) -> StoreResult<Option<PasswordResetToken>> {
        let tables = self.tables.lock();
        Ok(tables.reset_tokens.iter().find(|t| t.token == token).cloned())
    }

    async fn delete_unused_reset_tokens(&self, email: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        tables.reset_tokens.retain(|t| t.email != email || t.used);
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token_id: i64,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.lock();

        let Some(token_index) = tables.reset_tokens.iter().position(|t| t.id == token_id)
        else {
            return Ok(false);
        };

        if tables.reset_tokens[token_index].used {
            return Ok(false);
        }

        let Some(user_index) = tables.users.iter().position(|u| u.email == email) else {
            return Ok(false);
        };

        tables.reset_tokens[token_index].used = true;
        tables.users[user_index].password_hash = password_hash.to_string();

        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    async fn seed_user(store: &MemoryStore, email: &str) -> User {
        let created = store
            .create_user(
                NewUser {
                    email: email.to_string(),
                    password_hash: "x".to_string(),
                    name: email.to_string(),
                    instrument: None,
                    created_at: now(),
                },
                None,
            )
            .await
            .unwrap();

        match created {
            CreatedUser::Created { user, .. } => user,
            other => panic!("expected a created user, got {other:?}"),
        }
    }

    async fn seed_band(store: &MemoryStore, creator: &User) -> Band {
        let (band, _) = store
            .create_band(NewBand {
                name: "The Rustaceans".to_string(),
                description: None,
                creator_id: creator.id,
                created_at: now(),
            })
            .await
            .unwrap();

        band
    }

    async fn seed_poll(store: &MemoryStore, band: &Band, creator: &User) -> Poll {
        store
            .create_poll(NewPoll {
                band_id: band.id,
                title: "Summer setlist".to_string(),
                description: None,
                created_by: creator.id,
                start_date: now(),
                end_date: now() + Duration::days(7),
                created_at: now(),
            })
            .await
            .unwrap()
    }

    async fn seed_song(store: &MemoryStore, poll: &Poll, suggester: &User) -> Song {
        store
            .create_song(NewSong {
                poll_id: poll.id,
                suggested_by: suggester.id,
                artist: "Rush".to_string(),
                title: "YYZ".to_string(),
                youtube_url: None,
                description: None,
                created_at: now(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_reported_not_inserted() {
        let store = MemoryStore::new();
        seed_user(&store, "ada@example.com").await;

        let second = store
            .create_user(
                NewUser {
                    email: "ada@example.com".to_string(),
                    password_hash: "y".to_string(),
                    name: "Other Ada".to_string(),
                    instrument: None,
                    created_at: now(),
                },
                None,
            )
            .await
            .unwrap();

        assert!(matches!(second, CreatedUser::EmailTaken));

        let stored = store.user_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(stored.name, "ada@example.com");
    }

    #[tokio::test]
    async fn band_creator_becomes_its_leader() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada@example.com").await;

        let (band, membership) = store
            .create_band(NewBand {
                name: "The Rustaceans".to_string(),
                description: Some("garage band".to_string()),
                creator_id: ada.id,
                created_at: now(),
            })
            .await
            .unwrap();

        assert_eq!(membership.role, BandRole::Leader);
        assert_eq!(membership.user.id, ada.id);
        assert_eq!(store.count_members(band.id).await.unwrap(), 1);

        let memberships = store.bands_for_user(ada.id).await.unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].role, BandRole::Leader);
        assert_eq!(memberships[0].member_count, 1);
    }

    #[tokio::test]
    async fn demoting_the_only_leader_is_refused() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;
        let band = seed_band(&store, &ada).await;
        store.insert_member(band.id, &bob, BandRole::Member, now());

        let refused = store
            .update_member_role(band.id, ada.id, BandRole::Member)
            .await
            .unwrap();
        assert!(matches!(refused, RoleUpdate::LastLeader));

        // Promote first, then the original leader may step down.
        let promoted = store
            .update_member_role(band.id, bob.id, BandRole::Leader)
            .await
            .unwrap();
        assert!(matches!(promoted, RoleUpdate::Applied(_)));

        let demoted = store
            .update_member_role(band.id, ada.id, BandRole::Member)
            .await
            .unwrap();
        match demoted {
            RoleUpdate::Applied(member) => assert_eq!(member.role, BandRole::Member),
            other => panic!("expected the demotion to apply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn removing_the_only_leader_is_refused() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada@example.com").await;
        let bob = seed_user(&store, "bob@example.com").await;
        let band = seed_band(&store, &ada).await;
        store.insert_member(band.id, &bob, BandRole::Member, now());

        let refused = store.remove_member(band.id, ada.id).await.unwrap();
        assert_eq!(refused, MemberRemoval::LastLeader);

        let removed = store.remove_member(band.id, bob.id).await.unwrap();
        assert_eq!(removed, MemberRemoval::Removed);
        assert_eq!(store.count_members(band.id).await.unwrap(), 1);

        let missing = store.remove_member(band.id, bob.id).await.unwrap();
        assert_eq!(missing, MemberRemoval::NotFound);
    }

    #[tokio::test]
    async fn spent_invite_rolls_back_registration() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada@example.com").await;
        let band = seed_band(&store, &ada).await;

        let invite = store
            .create_invite_code(NewInviteCode {
                code: "join-us".to_string(),
                band_id: band.id,
                role: BandRole::Member,
                expires_at: now() + Duration::days(30),
                created_at: now(),
            })
            .await
            .unwrap();

        let grant = InviteGrant {
            code_id: invite.id,
            band_id: invite.band_id,
            role: invite.role,
        };

        let first = store
            .create_user(
                NewUser {
                    email: "bob@example.com".to_string(),
                    password_hash: "x".to_string(),
                    name: "Bob".to_string(),
                    instrument: Some("bass".to_string()),
                    created_at: now(),
                },
                Some(grant),
            )
            .await
            .unwrap();

        match first {
            CreatedUser::Created { membership, .. } => {
                let membership = membership.expect("invite should grant a membership");
                assert_eq!(membership.band_id, band.id);
                assert_eq!(membership.role, BandRole::Member);
            }
            other => panic!("expected a created user, got {other:?}"),
        }

        let second = store
            .create_user(
                NewUser {
                    email: "eve@example.com".to_string(),
                    password_hash: "x".to_string(),
                    name: "Eve".to_string(),
                    instrument: None,
                    created_at: now(),
                },
                Some(grant),
            )
            .await
            .unwrap();

        assert!(matches!(second, CreatedUser::InviteSpent));
        assert!(store.user_by_email("eve@example.com").await.unwrap().is_none());

        let stored = store.invite_code_by_code("join-us").await.unwrap().unwrap();
        assert_eq!(stored.used_by.unwrap().email, "bob@example.com");
    }

    #[tokio::test]
    async fn double_vote_is_a_conflict() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada@example.com").await;
        let band = seed_band(&store, &ada).await;
        let poll = seed_poll(&store, &band, &ada).await;
        let song = seed_song(&store, &poll, &ada).await;

        store.create_vote(ada.id, song.id, now()).await.unwrap();
        let second = store.create_vote(ada.id, song.id, now()).await;

        assert!(matches!(second, Err(StoreError::Conflict)));
        assert_eq!(store.count_votes_for_song(song.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_a_song_drops_its_votes() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada@example.com").await;
        let band = seed_band(&store, &ada).await;
        let poll = seed_poll(&store, &band, &ada).await;
        let song = seed_song(&store, &poll, &ada).await;

        let vote = store.create_vote(ada.id, song.id, now()).await.unwrap();
        assert!(store.delete_song(song.id).await.unwrap());

        assert!(store.vote_by_id(vote.id).await.unwrap().is_none());
        assert!(store
            .votes_for_user_in_poll(ada.id, poll.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn deleting_a_band_cascades_to_everything() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada@example.com").await;
        let band = seed_band(&store, &ada).await;
        let poll = seed_poll(&store, &band, &ada).await;
        let song = seed_song(&store, &poll, &ada).await;
        let vote = store.create_vote(ada.id, song.id, now()).await.unwrap();

        store
            .create_invite_code(NewInviteCode {
                code: "join-us".to_string(),
                band_id: band.id,
                role: BandRole::Member,
                expires_at: now() + Duration::days(30),
                created_at: now(),
            })
            .await
            .unwrap();

        assert!(store.delete_band(band.id).await.unwrap());

        assert!(store.band_by_id(band.id).await.unwrap().is_none());
        assert!(store.poll_by_id(poll.id).await.unwrap().is_none());
        assert!(store.song_by_id(song.id).await.unwrap().is_none());
        assert!(store.vote_by_id(vote.id).await.unwrap().is_none());
        assert!(store.member_record(band.id, ada.id).await.unwrap().is_none());
        assert!(store.invite_code_by_code("join-us").await.unwrap().is_none());

        // The user survives the band.
        assert!(store.user_by_id(ada.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn reset_tokens_are_single_use() {
        let store = MemoryStore::new();
        let ada = seed_user(&store, "ada@example.com").await;

        let token = store
            .create_reset_token(NewResetToken {
                token: "reset-123".to_string(),
                email: ada.email.clone(),
                expires_at: now() + Duration::minutes(30),
                created_at: now(),
            })
            .await
            .unwrap();

        assert!(store
            .consume_reset_token(token.id, &ada.email, "new-hash")
            .await
            .unwrap());

        let updated = store.user_by_email(&ada.email).await.unwrap().unwrap();
        assert_eq!(updated.password_hash, "new-hash");

        assert!(!store
            .consume_reset_token(token.id, &ada.email, "other-hash")
            .await
            .unwrap());
    }
}
