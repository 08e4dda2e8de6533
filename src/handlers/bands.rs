use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::auth::AuthenticatedUser;
use crate::errors::AppError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;
use crate::types::{
    BandDetailResponse, BandMemberInfo, BandResponse, CreateBandPayload, CreateInviteCodePayload,
    InviteCodeResponse, UpdateBandPayload, UpdateMemberRolePayload,
};

pub async fn create_band(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<CreateBandPayload>,
) -> Result<(StatusCode, Json<BandResponse>), AppError> {
    let band = state.bands.create_band(&user, payload).await?;

    Ok((StatusCode::CREATED, Json(band)))
}

pub async fn my_bands(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<BandResponse>>, AppError> {
    Ok(Json(state.bands.my_bands(&user).await?))
}

pub async fn band_detail(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(band_id): Path<i64>,
) -> Result<Json<BandDetailResponse>, AppError> {
    Ok(Json(state.bands.band_detail(&user, band_id).await?))
}

pub async fn update_band(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(band_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateBandPayload>,
) -> Result<Json<BandResponse>, AppError> {
    Ok(Json(state.bands.update_band(&user, band_id, payload).await?))
}

pub async fn delete_band(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(band_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.bands.delete_band(&user, band_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(band_id): Path<i64>,
) -> Result<Json<Vec<BandMemberInfo>>, AppError> {
    Ok(Json(state.bands.members(&user, band_id).await?))
}

pub async fn update_member_role(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((band_id, member_user_id)): Path<(i64, i64)>,
    ValidatedJson(payload): ValidatedJson<UpdateMemberRolePayload>,
) -> Result<Json<BandMemberInfo>, AppError> {
    Ok(Json(
        state
            .bands
            .update_member_role(&user, band_id, member_user_id, payload)
            .await?,
    ))
}

pub async fn remove_member(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((band_id, member_user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    state
        .bands
        .remove_member(&user, band_id, member_user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_invite_code(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(band_id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<CreateInviteCodePayload>,
) -> Result<(StatusCode, Json<InviteCodeResponse>), AppError> {
    let invite = state
        .bands
        .create_invite_code(&user, band_id, payload)
        .await?;

    Ok((StatusCode::CREATED, Json(invite)))
}

pub async fn list_invite_codes(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(band_id): Path<i64>,
) -> Result<Json<Vec<InviteCodeResponse>>, AppError> {
    Ok(Json(state.bands.invite_codes(&user, band_id).await?))
}

pub async fn delete_invite_code(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((band_id, code)): Path<(i64, String)>,
) -> Result<StatusCode, AppError> {
    state
        .bands
        .delete_invite_code(&user, band_id, &code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
