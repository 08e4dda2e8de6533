pub mod band_dtos;
pub mod poll_dtos;
pub mod song_dtos;
pub mod user_dtos;
pub mod vote_dtos;

pub use band_dtos::{
    BandDetailResponse, BandMemberInfo, BandResponse, BandSummary, CreateBandPayload,
    CreateInviteCodePayload, InviteCodeResponse, UpdateBandPayload, UpdateMemberRolePayload,
};
pub use poll_dtos::{
    CreatePollPayload, PollDetailResponse, PollListQuery, PollResponse, UpdatePollPayload,
};
pub use song_dtos::{CreateSongPayload, SongResponse, UpdateSongPayload};
pub use user_dtos::UserInfo;
pub use vote_dtos::{CastVotePayload, MyVotesResponse, VoteResponse};
