use std::sync::Arc;

use crate::clock::Clock;
use crate::errors::{AppError, Resource};
use crate::models::User;
use crate::services::Permissions;
use crate::store::{NewSong, Store, UpdatedSong};
use crate::types::{CreateSongPayload, SongResponse, UpdateSongPayload};

#[derive(Clone)]
pub struct SongsService {
    store: Arc<dyn Store>,
    permissions: Permissions,
    clock: Arc<dyn Clock>,
}

impl SongsService {
    pub fn new(store: Arc<dyn Store>, permissions: Permissions, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            permissions,
            clock,
        }
    }

    /// Suggestions are open to every band member at any time; only voting
    /// is bound to the poll's window.
    pub async fn add_song(
        &self,
        user: &User,
        poll_id: i64,
        payload: CreateSongPayload,
    ) -> Result<SongResponse, AppError> {
        let poll = self
            .store
            .poll_by_id(poll_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Poll))?;
        self.permissions
            .require_band_member(poll.band_id, user.id)
            .await?;

        let song = self
            .store
            .create_song(NewSong {
                poll_id,
                suggested_by: user.id,
                artist: payload.artist,
                title: payload.title,
                youtube_url: payload.youtube_url,
                description: payload.description,
                created_at: self.clock.now(),
            })
            .await?;

        Ok(SongResponse::new(&song, 0))
    }

    pub async fn update_song(
        &self,
        user: &User,
        song_id: i64,
        payload: UpdateSongPayload,
    ) -> Result<SongResponse, AppError> {
        let song = self
            .store
            .song_by_id(song_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Song))?;
        self.permissions
            .require_song_suggester_or_leader(&song, user.id)
            .await?;

        let updated = self
            .store
            .update_song(
                song_id,
                UpdatedSong {
                    artist: payload.artist,
                    title: payload.title,
                    youtube_url: payload.youtube_url,
                    description: payload.description,
                },
            )
            .await?
            .ok_or(AppError::NotFound(Resource::Song))?;

        let vote_count = self.store.count_votes_for_song(song_id).await?;

        Ok(SongResponse::new(&updated, vote_count))
    }

    /// Removes the suggestion together with any votes already cast on it,
    /// so tallies never count ghost songs.
    pub async fn delete_song(&self, user: &User, song_id: i64) -> Result<(), AppError> {
        let song = self
            .store
            .song_by_id(song_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Song))?;
        self.permissions
            .require_song_suggester_or_leader(&song, user.id)
            .await?;

        if !self.store.delete_song(song_id).await? {
            return Err(AppError::NotFound(Resource::Song));
        }

        Ok(())
    }
}
