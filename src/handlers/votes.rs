use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::auth::AuthenticatedUser;
use crate::errors::AppError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;
use crate::types::{CastVotePayload, MyVotesResponse, VoteResponse};

pub async fn cast_vote(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<CastVotePayload>,
) -> Result<(StatusCode, Json<VoteResponse>), AppError> {
    let vote = state.votes.cast_vote(&user, payload).await?;

    Ok((StatusCode::CREATED, Json(vote)))
}

pub async fn cancel_vote(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(vote_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.votes.cancel_vote(&user, vote_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn my_votes(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(poll_id): Path<i64>,
) -> Result<Json<MyVotesResponse>, AppError> {
    Ok(Json(state.votes.my_votes(&user, poll_id).await?))
}
