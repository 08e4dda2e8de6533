use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::models::{
    Band, BandMember, BandRole, InviteCode, PasswordResetToken, Poll, Song, User, Vote,
};
use crate::store::{
    BandWithMembership, CreatedUser, InviteGrant, MemberRemoval, NewBand, NewInviteCode, NewPoll,
    NewResetToken, NewSong, NewUser, PollWithSongCount, RoleUpdate, Store, StoreError,
    StoreResult, UpdatedBand, UpdatedPoll, UpdatedSong,
};

/// Postgres-backed [`Store`].
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the schema. Every statement is idempotent, so this runs on
    /// every boot.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::raw_sql(include_str!("../../migrations/0001_initial_schema.sql"))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(())
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Internal(e.to_string()),
    }
}

fn parse_role(value: &str) -> StoreResult<BandRole> {
    value
        .parse()
        .map_err(|_| StoreError::Internal(format!("invalid role in storage: {value}")))
}

#[derive(FromRow)]
struct MemberRow {
    id: i64,
    band_id: i64,
    role: String,
    joined_at: DateTime<Utc>,
    user_id: i64,
    email: String,
    password_hash: String,
    name: String,
    instrument: Option<String>,
    user_created_at: DateTime<Utc>,
}

impl MemberRow {
    fn into_member(self) -> StoreResult<BandMember> {
        Ok(BandMember {
            id: self.id,
            band_id: self.band_id,
            role: parse_role(&self.role)?,
            joined_at: self.joined_at,
            user: User {
                id: self.user_id,
                email: self.email,
                password_hash: self.password_hash,
                name: self.name,
                instrument: self.instrument,
                created_at: self.user_created_at,
            },
        })
    }
}

#[derive(FromRow)]
struct BandForUserRow {
    id: i64,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    role: String,
    member_count: i64,
}

impl BandForUserRow {
    fn into_membership(self) -> StoreResult<BandWithMembership> {
        Ok(BandWithMembership {
            role: parse_role(&self.role)?,
            member_count: self.member_count,
            band: Band {
                id: self.id,
                name: self.name,
                description: self.description,
                created_at: self.created_at,
            },
        })
    }
}

#[derive(FromRow)]
struct InviteRow {
    id: i64,
    code: String,
    band_id: i64,
    role: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    user_id: Option<i64>,
    email: Option<String>,
    password_hash: Option<String>,
    name: Option<String>,
    instrument: Option<String>,
    user_created_at: Option<DateTime<Utc>>,
}

impl InviteRow {
    fn into_invite(self) -> StoreResult<InviteCode> {
        let used_by = match (
            self.user_id,
            self.email,
            self.password_hash,
            self.name,
            self.user_created_at,
        ) {
            (Some(id), Some(email), Some(password_hash), Some(name), Some(created_at)) => {
                Some(User {
                    id,
                    email,
                    password_hash,
                    name,
                    instrument: self.instrument,
                    created_at,
                })
            }
            _ => None,
        };

        Ok(InviteCode {
            id: self.id,
            code: self.code,
            band_id: self.band_id,
            role: parse_role(&self.role)?,
            used_by,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct PollRow {
    id: i64,
    band_id: i64,
    title: String,
    description: Option<String>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    user_id: i64,
    email: String,
    password_hash: String,
    name: String,
    instrument: Option<String>,
    user_created_at: DateTime<Utc>,
}

impl PollRow {
    fn into_poll(self) -> Poll {
        Poll {
            id: self.id,
            band_id: self.band_id,
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
            created_by: User {
                id: self.user_id,
                email: self.email,
                password_hash: self.password_hash,
                name: self.name,
                instrument: self.instrument,
                created_at: self.user_created_at,
            },
        }
    }
}

#[derive(FromRow)]
struct PollListRow {
    #[sqlx(flatten)]
    poll: PollRow,
    song_count: i64,
}

#[derive(FromRow)]
struct SongRow {
    id: i64,
    poll_id: i64,
    artist: String,
    title: String,
    youtube_url: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    user_id: i64,
    email: String,
    password_hash: String,
    name: String,
    instrument: Option<String>,
    user_created_at: DateTime<Utc>,
}

impl SongRow {
    fn into_song(self) -> Song {
        Song {
            id: self.id,
            poll_id: self.poll_id,
            artist: self.artist,
            title: self.title,
            youtube_url: self.youtube_url,
            description: self.description,
            created_at: self.created_at,
            suggested_by: User {
                id: self.user_id,
                email: self.email,
                password_hash: self.password_hash,
                name: self.name,
                instrument: self.instrument,
                created_at: self.user_created_at,
            },
        }
    }
}

const SELECT_USER: &str = "
    SELECT id, email, password_hash, name, instrument, created_at
    FROM users
";

const SELECT_MEMBER: &str = "
    SELECT m.id, m.band_id, m.role, m.joined_at,
           u.id AS user_id, u.email, u.password_hash, u.name, u.instrument,
           u.created_at AS user_created_at
    FROM band_members m
    JOIN users u ON u.id = m.user_id
";

const SELECT_INVITE: &str = "
    SELECT i.id, i.code, i.band_id, i.role, i.expires_at, i.created_at,
           u.id AS user_id, u.email, u.password_hash, u.name, u.instrument,
           u.created_at AS user_created_at
    FROM invite_codes i
    LEFT JOIN users u ON u.id = i.used_by_user_id
";

const SELECT_POLL: &str = "
    SELECT p.id, p.band_id, p.title, p.description, p.start_date, p.end_date, p.created_at,
           u.id AS user_id, u.email, u.password_hash, u.name, u.instrument,
           u.created_at AS user_created_at
    FROM polls p
    JOIN users u ON u.id = p.created_by_user_id
";

const SELECT_SONG: &str = "
    SELECT s.id, s.poll_id, s.artist, s.title, s.youtube_url, s.description, s.created_at,
           u.id AS user_id, u.email, u.password_hash, u.name, u.instrument,
           u.created_at AS user_created_at
    FROM songs s
    JOIN users u ON u.id = s.suggested_by_user_id
";

#[async_trait]
impl Store for PgStore {
    async fn create_user(
        &self,
        user: NewUser,
        grant: Option<InviteGrant>,
    ) -> StoreResult<CreatedUser> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(&user.email)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        if taken.is_some() {
            return Ok(CreatedUser::EmailTaken);
        }

        let inserted = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, name, instrument, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, email, password_hash, name, instrument, created_at",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.instrument)
        .bind(user.created_at)
        .fetch_one(&mut *tx)
        .await;

        let created = match inserted {
            Ok(created) => created,
            // Lost a race on the email unique index after the pre-check.
            Err(e) => {
                return match map_sqlx(e) {
                    StoreError::Conflict => Ok(CreatedUser::EmailTaken),
                    other => Err(other),
                };
            }
        };

        let mut membership = None;

        if let Some(grant) = grant {
            let claimed = sqlx::query(
                "UPDATE invite_codes
                 SET used_by_user_id = $1
                 WHERE id = $2 AND used_by_user_id IS NULL",
            )
            .bind(created.id)
            .bind(grant.code_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

            if claimed.rows_affected() == 0 {
                // Someone else spent the code first. Dropping the
                // transaction rolls the user insert back.
                return Ok(CreatedUser::InviteSpent);
            }

            let inserted_member: Result<i64, sqlx::Error> = sqlx::query_scalar(
                "INSERT INTO band_members (band_id, user_id, role, joined_at)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id",
            )
            .bind(grant.band_id)
            .bind(created.id)
            .bind(grant.role.as_str())
            .bind(user.created_at)
            .fetch_one(&mut *tx)
            .await;

            match inserted_member {
                Ok(member_id) => {
                    membership = Some(BandMember {
                        id: member_id,
                        band_id: grant.band_id,
                        user: created.clone(),
                        role: grant.role,
                        joined_at: user.created_at,
                    });
                }
                Err(e) => {
                    return match map_sqlx(e) {
                        StoreError::Conflict => Ok(CreatedUser::AlreadyMember),
                        other => Err(other),
                    };
                }
            }
        }

        tx.commit().await.map_err(map_sqlx)?;

        Ok(CreatedUser::Created {
            user: created,
            membership,
        })
    }

    async fn user_by_id(&self, user_id: i64) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn create_band(&self, band: NewBand) -> StoreResult<(Band, BandMember)> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let created = sqlx::query_as::<_, Band>(
            "INSERT INTO bands (name, description, created_at)
             VALUES ($1, $2, $3)
             RETURNING id, name, description, created_at",
        )
        .bind(&band.name)
        .bind(&band.description)
        .bind(band.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let member_id: i64 = sqlx::query_scalar(
            "INSERT INTO band_members (band_id, user_id, role, joined_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(created.id)
        .bind(band.creator_id)
        .bind(BandRole::Leader.as_str())
        .bind(band.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let creator = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(band.creator_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| StoreError::Internal("band creator does not exist".to_string()))?;

        tx.commit().await.map_err(map_sqlx)?;

        let membership = BandMember {
            id: member_id,
            band_id: created.id,
            user: creator,
            role: BandRole::Leader,
            joined_at: band.created_at,
        };

        Ok((created, membership))
    }

    async fn band_by_id(&self, band_id: i64) -> StoreResult<Option<Band>> {
        sqlx::query_as::<_, Band>(
            "SELECT id, name, description, created_at FROM bands WHERE id = $1",
        )
        .bind(band_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn update_band(&self, band_id: i64, band: UpdatedBand) -> StoreResult<Option<Band>> {
        sqlx::query_as::<_, Band>(
            "UPDATE bands SET name = $2, description = $3
             WHERE id = $1
             RETURNING id, name, description, created_at",
        )
        .bind(band_id)
        .bind(&band.name)
        .bind(&band.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn delete_band(&self, band_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM bands WHERE id = $1")
            .bind(band_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn bands_for_user(&self, user_id: i64) -> StoreResult<Vec<BandWithMembership>> {
        let rows = sqlx::query_as::<_, BandForUserRow>(
            "SELECT b.id, b.name, b.description, b.created_at, m.role,
                    (SELECT COUNT(*) FROM band_members mc WHERE mc.band_id = b.id) AS member_count
             FROM bands b
             JOIN band_members m ON m.band_id = b.id
             WHERE m.user_id = $1
             ORDER BY m.joined_at ASC, b.id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(BandForUserRow::into_membership).collect()
    }

    async fn member_record(
        &self,
        band_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<BandMember>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "{SELECT_MEMBER} WHERE m.band_id = $1 AND m.user_id = $2"
        ))
        .bind(band_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(MemberRow::into_member).transpose()
    }

    async fn members_of_band(&self, band_id: i64) -> StoreResult<Vec<BandMember>> {
        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            "{SELECT_MEMBER} WHERE m.band_id = $1 ORDER BY m.joined_at ASC, m.id ASC"
        ))
        .bind(band_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(MemberRow::into_member).collect()
    }

    async fn count_members(&self, band_id: i64) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM band_members WHERE band_id = $1")
            .bind(band_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn update_member_role(
        &self,
        band_id: i64,
        user_id: i64,
        role: BandRole,
    ) -> StoreResult<RoleUpdate> {
        // The leader count and the update happen in one statement so two
        // concurrent demotions cannot both pass the check.
        let result = sqlx::query(
            "UPDATE band_members SET role = $3
             WHERE band_id = $1 AND user_id = $2
               AND ($3 = 'LEADER' OR role = 'MEMBER'
                    OR (SELECT COUNT(*) FROM band_members lc
                        WHERE lc.band_id = $1 AND lc.role = 'LEADER') > 1)",
        )
        .bind(band_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() > 0 {
            let member = self
                .member_record(band_id, user_id)
                .await?
                .ok_or_else(|| StoreError::Internal("membership vanished".to_string()))?;

            return Ok(RoleUpdate::Applied(member));
        }

        match self.member_record(band_id, user_id).await? {
            Some(_) => Ok(RoleUpdate::LastLeader),
            None => Ok(RoleUpdate::NotFound),
        }
    }

    async fn remove_member(&self, band_id: i64, user_id: i64) -> StoreResult<MemberRemoval> {
        let result = sqlx::query(
            "DELETE FROM band_members
             WHERE band_id = $1 AND user_id = $2
               AND (role = 'MEMBER'
                    OR (SELECT COUNT(*) FROM band_members lc
                        WHERE lc.band_id = $1 AND lc.role = 'LEADER') > 1)",
        )
        .bind(band_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() > 0 {
            return Ok(MemberRemoval::Removed);
        }

        match self.member_record(band_id, user_id).await? {
            Some(_) => Ok(MemberRemoval::LastLeader),
            None => Ok(MemberRemoval::NotFound),
        }
    }

    async fn create_invite_code(&self, invite: NewInviteCode) -> StoreResult<InviteCode> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO invite_codes (code, band_id, role, expires_at, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(&invite.code)
        .bind(invite.band_id)
        .bind(invite.role.as_str())
        .bind(invite.expires_at)
        .bind(invite.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

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
        let rows = sqlx::query_as::<_, InviteRow>(&format!(
            "{SELECT_INVITE} WHERE i.band_id = $1 ORDER BY i.created_at DESC, i.id DESC"
        ))
        .bind(band_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(InviteRow::into_invite).collect()
    }

    async fn invite_code_by_code(&self, code: &str) -> StoreResult<Option<InviteCode>> {
        let row = sqlx::query_as::<_, InviteRow>(&format!("{SELECT_INVITE} WHERE i.code = $1"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(InviteRow::into_invite).transpose()
    }

    async fn delete_invite_code(&self, invite_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM invite_codes WHERE id = $1")
            .bind(invite_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_poll(&self, poll: NewPoll) -> StoreResult<Poll> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO polls
                 (band_id, title, description, created_by_user_id, start_date, end_date, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(poll.band_id)
        .bind(&poll.title)
        .bind(&poll.description)
        .bind(poll.created_by)
        .bind(poll.start_date)
        .bind(poll.end_date)
        .bind(poll.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.poll_by_id(id)
            .await?
            .ok_or_else(|| StoreError::Internal("poll vanished after insert".to_string()))
    }

    async fn poll_by_id(&self, poll_id: i64) -> StoreResult<Option<Poll>> {
        let row = sqlx::query_as::<_, PollRow>(&format!("{SELECT_POLL} WHERE p.id = $1"))
            .bind(poll_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(row.map(PollRow::into_poll))
    }

    async fn polls_for_band(&self, band_id: i64) -> StoreResult<Vec<PollWithSongCount>> {
        let rows = sqlx::query_as::<_, PollListRow>(
            "SELECT p.id, p.band_id, p.title, p.description, p.start_date, p.end_date,
                    p.created_at,
                    u.id AS user_id, u.email, u.password_hash, u.name, u.instrument,
                    u.created_at AS user_created_at,
                    (SELECT COUNT(*) FROM songs s WHERE s.poll_id = p.id) AS song_count
             FROM polls p
             JOIN users u ON u.id = p.created_by_user_id
             WHERE p.band_id = $1
             ORDER BY p.start_date DESC, p.id DESC",
        )
        .bind(band_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows
            .into_iter()
            .map(|row| PollWithSongCount {
                poll: row.poll.into_poll(),
                song_count: row.song_count,
            })
            .collect())
    }

    async fn update_poll(&self, poll_id: i64, poll: UpdatedPoll) -> StoreResult<Option<Poll>> {
        let result = sqlx::query(
            "UPDATE polls SET title = $2, description = $3, start_date = $4, end_date = $5
             WHERE id = $1",
        )
        .bind(poll_id)
        .bind(&poll.title)
        .bind(&poll.description)
        .bind(poll.start_date)
        .bind(poll.end_date)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.poll_by_id(poll_id).await
    }

    async fn delete_poll(&self, poll_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM polls WHERE id = $1")
            .bind(poll_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_songs_for_poll(&self, poll_id: i64) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM songs WHERE poll_id = $1")
            .bind(poll_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn create_song(&self, song: NewSong) -> StoreResult<Song> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO songs
                 (poll_id, suggested_by_user_id, artist, title, youtube_url, description, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(song.poll_id)
        .bind(song.suggested_by)
        .bind(&song.artist)
        .bind(&song.title)
        .bind(&song.youtube_url)
        .bind(&song.description)
        .bind(song.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;

        self.song_by_id(id)
            .await?
            .ok_or_else(|| StoreError::Internal("song vanished after insert".to_string()))
    }

    async fn song_by_id(&self, song_id: i64) -> StoreResult<Option<Song>> {
        let row = sqlx::query_as::<_, SongRow>(&format!("{SELECT_SONG} WHERE s.id = $1"))
            .bind(song_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(row.map(SongRow::into_song))
    }

    async fn songs_for_poll(&self, poll_id: i64) -> StoreResult<Vec<Song>> {
        let rows = sqlx::query_as::<_, SongRow>(&format!(
            "{SELECT_SONG} WHERE s.poll_id = $1 ORDER BY s.created_at ASC, s.id ASC"
        ))
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(SongRow::into_song).collect())
    }

    async fn update_song(&self, song_id: i64, song: UpdatedSong) -> StoreResult<Option<Song>> {
        let result = sqlx::query(
            "UPDATE songs SET artist = $2, title = $3, youtube_url = $4, description = $5
             WHERE id = $1",
        )
        .bind(song_id)
        .bind(&song.artist)
        .bind(&song.title)
        .bind(&song.youtube_url)
        .bind(&song.description)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.song_by_id(song_id).await
    }

    async fn delete_song(&self, song_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM songs WHERE id = $1")
            .bind(song_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_vote(
        &self,
        user_id: i64,
        song_id: i64,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Vote> {
        sqlx::query_as::<_, Vote>(
            "INSERT INTO votes (user_id, song_id, created_at)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, song_id, created_at",
        )
        .bind(user_id)
        .bind(song_id)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn vote_by_id(&self, vote_id: i64) -> StoreResult<Option<Vote>> {
        sqlx::query_as::<_, Vote>(
            "SELECT id, user_id, song_id, created_at FROM votes WHERE id = $1",
        )
        .bind(vote_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn vote_exists(&self, user_id: i64, song_id: i64) -> StoreResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM votes WHERE user_id = $1 AND song_id = $2)",
        )
        .bind(user_id)
        .bind(song_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn delete_vote(&self, vote_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM votes WHERE id = $1")
            .bind(vote_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(result.rows_affected() > 0)
    }

    async fn votes_for_user_in_poll(
        &self,
        user_id: i64,
        poll_id: i64,
    ) -> StoreResult<Vec<Vote>> {
        sqlx::query_as::<_, Vote>(
            "SELECT v.id, v.user_id, v.song_id, v.created_at
             FROM votes v
             JOIN songs s ON s.id = v.song_id
             WHERE v.user_id = $1 AND s.poll_id = $2
             ORDER BY v.created_at ASC, v.id ASC",
        )
        .bind(user_id)
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn count_votes_for_song(&self, song_id: i64) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE song_id = $1")
            .bind(song_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn vote_counts_for_poll(&self, poll_id: i64) -> StoreResult<HashMap<i64, i64>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT v.song_id, COUNT(*)
             FROM votes v
             JOIN songs s ON s.id = v.song_id
             WHERE s.poll_id = $1
             GROUP BY v.song_id",
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().collect())
    }

    async fn create_reset_token(
        &self,
        token: NewResetToken,
    ) -> StoreResult<PasswordResetToken> {
        sqlx::query_as::<_, PasswordResetToken>(
            "INSERT INTO password_reset_tokens (token, email, expires_at, created_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, token, email, expires_at, used, created_at",
        )
        .bind(&token.token)
        .bind(&token.email)
        .bind(token.expires_at)
        .bind(token.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn reset_token_by_token(
        &self,
        token: &str,
    ) -> StoreResult<Option<PasswordResetToken>> {
        sqlx::query_as::<_, PasswordResetToken>(
            "SELECT id, token, email, expires_at, used, created_at
             FROM password_reset_tokens
             WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn delete_unused_reset_tokens(&self, email: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM password_reset_tokens WHERE email = $1 AND used = FALSE")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;

        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token_id: i64,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let marked = sqlx::query(
            "UPDATE password_reset_tokens SET used = TRUE WHERE id = $1 AND used = FALSE",
        )
        .bind(token_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        if marked.rows_affected() == 0 {
            return Ok(false);
        }

        let updated = sqlx::query("UPDATE users SET password_hash = $2 WHERE email = $1")
            .bind(email)
            .bind(password_hash)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        if updated.rows_affected() == 0 {
            return Ok(false);
        }

        tx.commit().await.map_err(map_sqlx)?;

        Ok(true)
    }
}
