pub mod accounts;
pub mod bands;
pub mod permissions;
pub mod polls;
pub mod songs;
pub mod votes;

// Re-exports for convenience
pub use accounts::AccountsService;
pub use bands::BandsService;
pub use permissions::Permissions;
pub use polls::PollsService;
pub use songs::SongsService;
pub use votes::VotesService;
