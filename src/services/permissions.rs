use std::sync::Arc;

use crate::errors::{AppError, Resource};
use crate::models::{Poll, Song};
use crate::store::Store;

/// Membership checks shared by every band-scoped operation.
#[derive(Clone)]
pub struct Permissions {
    store: Arc<dyn Store>,
}

impl Permissions {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn is_band_member(&self, band_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self.store.member_record(band_id, user_id).await?.is_some())
    }

    pub async fn is_band_leader(&self, band_id: i64, user_id: i64) -> Result<bool, AppError> {
        let member = self.store.member_record(band_id, user_id).await?;
        Ok(member.is_some_and(|m| m.role.is_leader()))
    }

    pub async fn require_band_member(
        &self,
        band_id: i64,
        user_id: i64,
    ) -> Result<(), AppError> {
        if self.is_band_member(band_id, user_id).await? {
            Ok(())
        } else {
            Err(AppError::MemberRequired)
        }
    }

    pub async fn require_band_leader(
        &self,
        band_id: i64,
        user_id: i64,
    ) -> Result<(), AppError> {
        if self.is_band_leader(band_id, user_id).await? {
            Ok(())
        } else {
            Err(AppError::LeaderRequired)
        }
    }

    /// A poll is managed by whoever created it, or by any leader of its band.
    pub async fn require_poll_creator_or_leader(
        &self,
        poll: &Poll,
        user_id: i64,
    ) -> Result<(), AppError> {
        if poll.created_by.id == user_id {
            return Ok(());
        }

        if self.is_band_leader(poll.band_id, user_id).await? {
            return Ok(());
        }

        Err(AppError::Unauthorized)
    }

    /// Same rule for songs, with the band reached through the song's poll.
    pub async fn require_song_suggester_or_leader(
        &self,
        song: &Song,
        user_id: i64,
    ) -> Result<(), AppError> {
        if song.suggested_by.id == user_id {
            return Ok(());
        }

        let poll = self
            .store
            .poll_by_id(song.poll_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Poll))?;

        if self.is_band_leader(poll.band_id, user_id).await? {
            return Ok(());
        }

        Err(AppError::Unauthorized)
    }
}
