pub mod auth;
pub mod bands;
pub mod polls;
pub mod songs;
pub mod votes;

// Re-exports for convenience
pub use auth::{forgot_password, login, logout, refresh_token, register, reset_password};
pub use bands::{
    band_detail, create_band, create_invite_code, delete_band, delete_invite_code,
    list_invite_codes, list_members, my_bands, remove_member, update_band, update_member_role,
};
pub use polls::{create_poll, delete_poll, list_polls, poll_detail, update_poll};
pub use songs::{add_song, delete_song, update_song};
pub use votes::{cancel_vote, cast_vote, my_votes};
