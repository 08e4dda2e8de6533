pub mod jwt;
pub mod types;

pub use jwt::{
    ACCESS_TOKEN_EXPIRATION_SECONDS, AuthenticatedUser, Claims, Keys,
    REFRESH_TOKEN_EXPIRATION_DAYS, TokenKind, decode_claims, issue_access_token,
    issue_refresh_token,
};
pub use types::{
    AuthResponse, ForgotPasswordPayload, LoginPayload, LoginResponse, MessageResponse,
    RefreshPayload, RefreshResponse, RegisterPayload, ResetPasswordPayload,
};
