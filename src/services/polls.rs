use std::sync::Arc;

use crate::clock::Clock;
use crate::errors::{AppError, Resource};
use crate::models::{PollStatus, User};
use crate::services::Permissions;
use crate::store::{NewPoll, Store, UpdatedPoll};
use crate::types::{
    CreatePollPayload, PollDetailResponse, PollResponse, SongResponse, UpdatePollPayload,
};

#[derive(Clone)]
pub struct PollsService {
    store: Arc<dyn Store>,
    permissions: Permissions,
    clock: Arc<dyn Clock>,
}

impl PollsService {
    pub fn new(store: Arc<dyn Store>, permissions: Permissions, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            permissions,
            clock,
        }
    }

    pub async fn create_poll(
        &self,
        user: &User,
        band_id: i64,
        payload: CreatePollPayload,
    ) -> Result<PollResponse, AppError> {
        self.permissions.require_band_member(band_id, user.id).await?;

        if payload.start_date > payload.end_date {
            return Err(AppError::InvalidDateRange);
        }

        let now = self.clock.now();
        let poll = self
            .store
            .create_poll(NewPoll {
                band_id,
                title: payload.title,
                description: payload.description,
                created_by: user.id,
                start_date: payload.start_date,
                end_date: payload.end_date,
                created_at: now,
            })
            .await?;

        Ok(PollResponse::new(&poll, poll.status(now), 0))
    }

    pub async fn polls_for_band(
        &self,
        user: &User,
        band_id: i64,
        status_filter: Option<PollStatus>,
    ) -> Result<Vec<PollResponse>, AppError> {
        self.permissions.require_band_member(band_id, user.id).await?;

        let now = self.clock.now();
        let polls = self.store.polls_for_band(band_id).await?;

        Ok(polls
            .iter()
            .map(|entry| PollResponse::new(&entry.poll, entry.poll.status(now), entry.song_count))
            .filter(|response| status_filter.is_none_or(|wanted| response.status == wanted))
            .collect())
    }

    pub async fn poll_detail(
        &self,
        user: &User,
        poll_id: i64,
    ) -> Result<PollDetailResponse, AppError> {
        let poll = self
            .store
            .poll_by_id(poll_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Poll))?;
        self.permissions
            .require_band_member(poll.band_id, user.id)
            .await?;

        let songs = self.store.songs_for_poll(poll_id).await?;
        let tallies = self.store.vote_counts_for_poll(poll_id).await?;
        let my_votes: Vec<i64> = self
            .store
            .votes_for_user_in_poll(user.id, poll_id)
            .await?
            .iter()
            .map(|vote| vote.song_id)
            .collect();

        let songs = songs
            .iter()
            .map(|song| SongResponse::new(song, tallies.get(&song.id).copied().unwrap_or(0)))
            .collect();

        Ok(PollDetailResponse::new(
            &poll,
            poll.status(self.clock.now()),
            songs,
            my_votes,
        ))
    }

    pub async fn update_poll(
        &self,
        user: &User,
        poll_id: i64,
        payload: UpdatePollPayload,
    ) -> Result<PollResponse, AppError> {
        let poll = self
            .store
            .poll_by_id(poll_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Poll))?;
        self.permissions
            .require_poll_creator_or_leader(&poll, user.id)
            .await?;

        if payload.start_date > payload.end_date {
            return Err(AppError::InvalidDateRange);
        }

        let updated = self
            .store
            .update_poll(
                poll_id,
                UpdatedPoll {
                    title: payload.title,
                    description: payload.description,
                    start_date: payload.start_date,
                    end_date: payload.end_date,
                },
            )
            .await?
            .ok_or(AppError::NotFound(Resource::Poll))?;

        let song_count = self.store.count_songs_for_poll(poll_id).await?;

        Ok(PollResponse::new(
            &updated,
            updated.status(self.clock.now()),
            song_count,
        ))
    }

    pub async fn delete_poll(&self, user: &User, poll_id: i64) -> Result<(), AppError> {
        let poll = self
            .store
            .poll_by_id(poll_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Poll))?;
        self.permissions
            .require_poll_creator_or_leader(&poll, user.id)
            .await?;

        if !self.store.delete_poll(poll_id).await? {
            return Err(AppError::NotFound(Resource::Poll));
        }

        Ok(())
    }
}
