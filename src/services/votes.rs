use std::sync::Arc;

use crate::clock::Clock;
use crate::errors::{AppError, Resource};
use crate::models::{PollStatus, User};
use crate::services::Permissions;
use crate::store::{Store, StoreError};
use crate::types::{CastVotePayload, MyVotesResponse, VoteResponse};

#[derive(Clone)]
pub struct VotesService {
    store: Arc<dyn Store>,
    permissions: Permissions,
    clock: Arc<dyn Clock>,
}

impl VotesService {
    pub fn new(store: Arc<dyn Store>, permissions: Permissions, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            permissions,
            clock,
        }
    }

    pub async fn cast_vote(
        &self,
        user: &User,
        payload: CastVotePayload,
    ) -> Result<VoteResponse, AppError> {
        let song = self
            .store
            .song_by_id(payload.song_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Song))?;
        let poll = self
            .store
            .poll_by_id(song.poll_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Poll))?;
        self.permissions
            .require_band_member(poll.band_id, user.id)
            .await?;

        if poll.status(self.clock.now()) != PollStatus::Active {
            return Err(AppError::PollNotActive);
        }

        if self.store.vote_exists(user.id, song.id).await? {
            return Err(AppError::DuplicateVote);
        }

        // The unique index is the real guard; the pre-check above just
        // gives the common case a friendlier path.
        let vote = self
            .store
            .create_vote(user.id, song.id, self.clock.now())
            .await
            .map_err(|e| match e {
                StoreError::Conflict => AppError::DuplicateVote,
                other => AppError::from(other),
            })?;

        Ok(VoteResponse::from(&vote))
    }

    pub async fn cancel_vote(&self, user: &User, vote_id: i64) -> Result<(), AppError> {
        let vote = self
            .store
            .vote_by_id(vote_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Vote))?;

        if vote.user_id != user.id {
            return Err(AppError::Unauthorized);
        }

        let song = self
            .store
            .song_by_id(vote.song_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Song))?;
        let poll = self
            .store
            .poll_by_id(song.poll_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Poll))?;

        if poll.status(self.clock.now()) != PollStatus::Active {
            return Err(AppError::PollNotActive);
        }

        if !self.store.delete_vote(vote_id).await? {
            return Err(AppError::NotFound(Resource::Vote));
        }

        Ok(())
    }

    pub async fn my_votes(&self, user: &User, poll_id: i64) -> Result<MyVotesResponse, AppError> {
        let poll = self
            .store
            .poll_by_id(poll_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Poll))?;

        let votes = self.store.votes_for_user_in_poll(user.id, poll_id).await?;

        Ok(MyVotesResponse::new(poll.id, &votes))
    }
}
