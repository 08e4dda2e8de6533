use std::fmt::Formatter;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::store::StoreError;

#[derive(Debug)]
pub enum Resource {
    User,
    Band,
    Member,
    Poll,
    Song,
    Vote,
    InviteCode,
    ResetToken,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Email or password is incorrect.")]
    InvalidCredentials,
    #[error("Invalid token provided.")]
    InvalidToken,
    #[error("Expired token provided.")]
    ExpiredToken,
    #[error("Token creation failed.")]
    TokenCreation,
    #[error("Couldn't find resource: {0}.")]
    NotFound(Resource),
    #[error("You are not authorized to perform this action.")]
    Unauthorized,
    #[error("Only a band leader may perform this action.")]
    LeaderRequired,
    #[error("You must be a member of this band.")]
    MemberRequired,
    #[error("A user with this email already exists.")]
    DuplicateEmail,
    #[error("You have already voted for this song.")]
    DuplicateVote,
    #[error("You are already a member of this band.")]
    AlreadyBandMember,
    #[error("Start date must not be after end date.")]
    InvalidDateRange,
    #[error("The poll is not active right now.")]
    PollNotActive,
    #[error("A band must keep at least one leader.")]
    CannotRemoveLastLeader,
    #[error("This invite code has expired.")]
    InviteCodeExpired,
    #[error("This invite code has already been used.")]
    InviteCodeAlreadyUsed,
    #[error("This password reset token has expired.")]
    ResetTokenExpired,
    #[error("Password hashing failed.")]
    PasswordHashingFailed(#[from] argon2::password_hash::Error),
    #[error("Invalid JSON body: {0}.")]
    JsonRejection(#[from] JsonRejection),
    #[error("Invalid request body: {0}.")]
    InvalidJson(#[from] ValidationErrors),
    #[error("Internal error: {0}.")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            // Conflicts carry operation-specific meaning; call sites that can
            // legitimately hit one map it themselves before `?` gets here.
            StoreError::Conflict => AppError::Internal("unhandled storage conflict".to_string()),
            StoreError::Internal(message) => AppError::Internal(message),
        }
    }
}

impl AppError {
    /// Status code and client-safe message. Anything more detailed than the
    /// returned message is for the logs only.
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Email or password is incorrect.")
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Authentication token is invalid.",
            ),
            AppError::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                "Authentication token has expired.",
            ),
            AppError::TokenCreation => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create authentication token.",
            ),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Resource not found."),
            AppError::Unauthorized => (
                StatusCode::FORBIDDEN,
                "You are not authorized to perform this action.",
            ),
            AppError::LeaderRequired => (
                StatusCode::FORBIDDEN,
                "Only a band leader may perform this action.",
            ),
            AppError::MemberRequired => {
                (StatusCode::FORBIDDEN, "You must be a member of this band.")
            }
            AppError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "A user with this email already exists.",
            ),
            AppError::DuplicateVote => {
                (StatusCode::CONFLICT, "You have already voted for this song.")
            }
            AppError::AlreadyBandMember => (
                StatusCode::CONFLICT,
                "You are already a member of this band.",
            ),
            AppError::InvalidDateRange => (
                StatusCode::BAD_REQUEST,
                "Start date must not be after end date.",
            ),
            AppError::PollNotActive => {
                (StatusCode::BAD_REQUEST, "The poll is not active right now.")
            }
            AppError::CannotRemoveLastLeader => (
                StatusCode::BAD_REQUEST,
                "A band must keep at least one leader.",
            ),
            AppError::InviteCodeExpired => {
                (StatusCode::BAD_REQUEST, "This invite code has expired.")
            }
            AppError::InviteCodeAlreadyUsed => (
                StatusCode::BAD_REQUEST,
                "This invite code has already been used.",
            ),
            AppError::ResetTokenExpired => (
                StatusCode::BAD_REQUEST,
                "This password reset token has expired.",
            ),
            AppError::PasswordHashingFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again later.",
            ),
            AppError::InvalidJson(_) => (StatusCode::BAD_REQUEST, "Invalid form body."),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again later.",
            ),

            AppError::JsonRejection(e) => match e {
                JsonRejection::MissingJsonContentType(_) => (
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "Content-Type header must be application/json.",
                ),
                JsonRejection::JsonSyntaxError(_) => (
                    StatusCode::BAD_REQUEST,
                    "Malformed JSON in request body.",
                ),
                JsonRejection::JsonDataError(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Request body is valid JSON but has incorrect fields.",
                ),
                _ => (StatusCode::BAD_REQUEST, "Invalid JSON request."),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, client_message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::debug!("request rejected: {}", self);
        }

        let error_body = Json(json!({
            "error": {
                "code": status.as_u16(),
                "message": client_message,
            }
        }));

        (status, error_body).into_response()
    }
}
