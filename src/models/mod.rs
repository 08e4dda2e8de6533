pub mod band;
pub mod band_member;
pub mod invite_code;
pub mod password_reset_token;
pub mod poll;
pub mod song;
pub mod user;
pub mod vote;

// Re-exports for convenience
pub use band::Band;
pub use band_member::{BandMember, BandRole};
pub use invite_code::InviteCode;
pub use password_reset_token::PasswordResetToken;
pub use poll::{Poll, PollStatus};
pub use song::Song;
pub use user::User;
pub use vote::Vote;
