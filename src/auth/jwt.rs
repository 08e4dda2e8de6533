use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{errors::AppError, models::User, state::AppState};

pub const ACCESS_TOKEN_EXPIRATION_SECONDS: i64 = 15 * 60; // 15 minutes
pub const REFRESH_TOKEN_EXPIRATION_DAYS: i64 = 30; // 30 days

pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl Keys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Discriminates the two token flavors so a refresh token can never be
/// replayed against a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    #[serde(rename = "type")]
    pub kind: TokenKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

pub fn issue_access_token(
    keys: &Keys,
    user: &User,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id,
        kind: TokenKind::Access,
        email: Some(user.email.clone()),
        iat: now.timestamp() as usize,
        exp: (now + Duration::seconds(ACCESS_TOKEN_EXPIRATION_SECONDS)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.encoding).map_err(|_| AppError::TokenCreation)
}

pub fn issue_refresh_token(
    keys: &Keys,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id,
        kind: TokenKind::Refresh,
        email: None,
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(REFRESH_TOKEN_EXPIRATION_DAYS)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.encoding).map_err(|_| AppError::TokenCreation)
}

/// `Validation::default()` checks the signature and `exp` (with a small
/// leeway), so an `Ok` here means the token is genuine and current.
pub fn decode_claims(keys: &Keys, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
            _ => {
                tracing::warn!("token decoding failed: {:?}", e);
                AppError::InvalidToken
            }
        })
}

/// Extractor for protected route handlers. Taking this as a parameter both
/// enforces a valid access token and hands the handler the current user.
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::InvalidToken)?;

        let claims = decode_claims(&app_state.keys, bearer.token())?;

        if claims.kind != TokenKind::Access {
            return Err(AppError::InvalidToken);
        }

        // The account may have been deleted since the token was issued.
        let user = app_state
            .store
            .user_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        Ok(AuthenticatedUser(user))
    }
}
