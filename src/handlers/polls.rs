use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::auth::AuthenticatedUser;
use crate::errors::AppError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;
use crate::types::{
    CreatePollPayload, PollDetailResponse, PollListQuery, PollResponse, UpdatePollPayload,
};

pub async fn create_poll(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(band_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<CreatePollPayload>,
) -> Result<(StatusCode, Json<PollResponse>), AppError> {
    let poll = state.polls.create_poll(&user, band_id, payload).await?;

    Ok((StatusCode::CREATED, Json(poll)))
}

pub async fn list_polls(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(band_id): Path<i64>,
    Query(query): Query<PollListQuery>,
) -> Result<Json<Vec<PollResponse>>, AppError> {
    Ok(Json(
        state
            .polls
            .polls_for_band(&user, band_id, query.status)
            .await?,
    ))
}

pub async fn poll_detail(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(poll_id): Path<i64>,
) -> Result<Json<PollDetailResponse>, AppError> {
    Ok(Json(state.polls.poll_detail(&user, poll_id).await?))
}

pub async fn update_poll(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(poll_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdatePollPayload>,
) -> Result<Json<PollResponse>, AppError> {
    Ok(Json(state.polls.update_poll(&user, poll_id, payload).await?))
}

pub async fn delete_poll(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(poll_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.polls.delete_poll(&user, poll_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
