use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{BandSummary, UserInfo};

// --- Request Payloads ---
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(email(message = "Must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Must be at least 8 characters."))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "Must be between 1 to 50 characters."))]
    pub name: String,
    #[validate(length(max = 100, message = "Must be at most 100 characters."))]
    pub instrument: Option<String>,
    pub invite_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email(message = "Must be a valid email address."))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshPayload {
    #[validate(length(min = 1, message = "Must not be empty."))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordPayload {
    #[validate(email(message = "Must be a valid email address."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordPayload {
    #[validate(length(min = 1, message = "Must not be empty."))]
    pub token: String,
    #[validate(length(min = 8, message = "Must be at least 8 characters."))]
    pub new_password: String,
}

// --- Response Bodies ---
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: usize,
    pub user: UserInfo,
    /// Present when registration redeemed an invite code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<BandSummary>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: usize,
    pub user: UserInfo,
    pub bands: Vec<BandSummary>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
