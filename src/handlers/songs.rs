use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::auth::AuthenticatedUser;
use crate::errors::AppError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;
use crate::types::{CreateSongPayload, SongResponse, UpdateSongPayload};

pub async fn add_song(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(poll_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<CreateSongPayload>,
) -> Result<(StatusCode, Json<SongResponse>), AppError> {
    let song = state.songs.add_song(&user, poll_id, payload).await?;

    Ok((StatusCode::CREATED, Json(song)))
}

pub async fn update_song(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(song_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateSongPayload>,
) -> Result<Json<SongResponse>, AppError> {
    Ok(Json(state.songs.update_song(&user, song_id, payload).await?))
}

pub async fn delete_song(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(song_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.songs.delete_song(&user, song_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
