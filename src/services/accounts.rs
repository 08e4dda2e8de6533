use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Duration;
use uuid::Uuid;

use crate::auth::{
    ACCESS_TOKEN_EXPIRATION_SECONDS, AuthResponse, ForgotPasswordPayload, Keys, LoginPayload,
    LoginResponse, MessageResponse, RefreshPayload, RefreshResponse, RegisterPayload,
    ResetPasswordPayload, TokenKind, decode_claims, issue_access_token, issue_refresh_token,
};
use crate::clock::Clock;
use crate::errors::{AppError, Resource};
use crate::mailer::Mailer;
use crate::models::InviteCode;
use crate::store::{CreatedUser, InviteGrant, NewResetToken, NewUser, Store};
use crate::types::{BandSummary, UserInfo};

pub const RESET_TOKEN_EXPIRATION_MINUTES: i64 = 30; // 30 minutes

/// Registration, login, token refresh, and password recovery.
#[derive(Clone)]
pub struct AccountsService {
    store: Arc<dyn Store>,
    keys: Arc<Keys>,
    clock: Arc<dyn Clock>,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl AccountsService {
    pub fn new(
        store: Arc<dyn Store>,
        keys: Arc<Keys>,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
        frontend_url: String,
    ) -> Self {
        Self {
            store,
            keys,
            clock,
            mailer,
            frontend_url,
        }
    }

    /// Creates the account and, when an invite code is supplied, joins the
    /// band it belongs to in the same transaction. The invite is checked
    /// before the user row is written so a failed redemption leaves nothing
    /// behind.
    pub async fn register(&self, payload: RegisterPayload) -> Result<AuthResponse, AppError> {
        let invite = match &payload.invite_code {
            Some(code) => Some(self.validate_invite(code).await?),
            None => None,
        };

        let password_hash = hash_password(&payload.password)?;
        let now = self.clock.now();

        let grant = invite.as_ref().map(|invite| InviteGrant {
            code_id: invite.id,
            band_id: invite.band_id,
            role: invite.role,
        });

        let created = self
            .store
            .create_user(
                NewUser {
                    email: payload.email,
                    password_hash,
                    name: payload.name,
                    instrument: payload.instrument,
                    created_at: now,
                },
                grant,
            )
            .await?;

        let (user, membership) = match created {
            CreatedUser::Created { user, membership } => (user, membership),
            CreatedUser::EmailTaken => return Err(AppError::DuplicateEmail),
            CreatedUser::InviteSpent => return Err(AppError::InviteCodeAlreadyUsed),
            CreatedUser::AlreadyMember => return Err(AppError::AlreadyBandMember),
        };

        let band = match &membership {
            Some(membership) => {
                let band = self
                    .store
                    .band_by_id(membership.band_id)
                    .await?
                    .ok_or(AppError::NotFound(Resource::Band))?;
                Some(BandSummary::new(&band, membership.role))
            }
            None => None,
        };

        let access_token = issue_access_token(&self.keys, &user, now)?;
        let refresh_token = issue_refresh_token(&self.keys, user.id, now)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: ACCESS_TOKEN_EXPIRATION_SECONDS as usize,
            user: UserInfo::from(&user),
            band,
        })
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<LoginResponse, AppError> {
        let user = self
            .store
            .user_by_email(&payload.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        verify_password(&payload.password, &user.password_hash)?;

        let bands = self
            .store
            .bands_for_user(user.id)
            .await?
            .iter()
            .map(|entry| BandSummary::new(&entry.band, entry.role))
            .collect();

        let now = self.clock.now();
        let access_token = issue_access_token(&self.keys, &user, now)?;
        let refresh_token = issue_refresh_token(&self.keys, user.id, now)?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: ACCESS_TOKEN_EXPIRATION_SECONDS as usize,
            user: UserInfo::from(&user),
            bands,
        })
    }

    /// Trades a refresh token for a fresh access token. Access tokens are
    /// rejected here just like refresh tokens are rejected on protected
    /// routes.
    pub async fn refresh(&self, payload: RefreshPayload) -> Result<RefreshResponse, AppError> {
        let claims = decode_claims(&self.keys, &payload.refresh_token)?;

        if claims.kind != TokenKind::Refresh {
            return Err(AppError::InvalidToken);
        }

        let user = self
            .store
            .user_by_id(claims.sub)
            .await?
            .ok_or(AppError::NotFound(Resource::User))?;

        let access_token = issue_access_token(&self.keys, &user, self.clock.now())?;

        Ok(RefreshResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: ACCESS_TOKEN_EXPIRATION_SECONDS as usize,
        })
    }

    pub async fn forgot_password(
        &self,
        payload: ForgotPasswordPayload,
    ) -> Result<MessageResponse, AppError> {
        let user = self
            .store
            .user_by_email(&payload.email)
            .await?
            .ok_or(AppError::NotFound(Resource::User))?;

        // A newer request supersedes any token still in flight.
        self.store.delete_unused_reset_tokens(&user.email).await?;

        let now = self.clock.now();
        let token = Uuid::new_v4().to_string();

        self.store
            .create_reset_token(NewResetToken {
                token: token.clone(),
                email: user.email.clone(),
                expires_at: now + Duration::minutes(RESET_TOKEN_EXPIRATION_MINUTES),
                created_at: now,
            })
            .await?;

        let reset_url = format!("{}/reset-password?token={}", self.frontend_url, token);
        self.mailer
            .send_password_reset(&user.email, &reset_url)
            .await?;

        Ok(MessageResponse {
            message: "Password reset instructions have been sent.".to_string(),
        })
    }

    pub async fn reset_password(
        &self,
        payload: ResetPasswordPayload,
    ) -> Result<MessageResponse, AppError> {
        let token = self
            .store
            .reset_token_by_token(&payload.token)
            .await?
            .ok_or(AppError::NotFound(Resource::ResetToken))?;

        if token.used {
            return Err(AppError::NotFound(Resource::ResetToken));
        }
        if token.expires_at < self.clock.now() {
            return Err(AppError::ResetTokenExpired);
        }

        self.store
            .user_by_email(&token.email)
            .await?
            .ok_or(AppError::NotFound(Resource::User))?;

        let password_hash = hash_password(&payload.new_password)?;

        if !self
            .store
            .consume_reset_token(token.id, &token.email, &password_hash)
            .await?
        {
            return Err(AppError::NotFound(Resource::ResetToken));
        }

        Ok(MessageResponse {
            message: "Password has been reset.".to_string(),
        })
    }

    async fn validate_invite(&self, code: &str) -> Result<InviteCode, AppError> {
        let invite = self
            .store
            .invite_code_by_code(code)
            .await?
            .ok_or(AppError::NotFound(Resource::InviteCode))?;

        if invite.used_by.is_some() {
            return Err(AppError::InviteCodeAlreadyUsed);
        }
        if invite.expires_at < self.clock.now() {
            return Err(AppError::InviteCodeExpired);
        }

        Ok(invite)
    }
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Any verification failure, including an unparsable stored hash, reads as
/// bad credentials to the caller.
fn verify_password(password: &str, hash: &str) -> Result<(), AppError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AppError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::InvalidCredentials)
}
