use std::sync::Arc;

use crate::auth::Keys;
use crate::clock::Clock;
use crate::mailer::Mailer;
use crate::services::{
    AccountsService, BandsService, Permissions, PollsService, SongsService, VotesService,
};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub keys: Arc<Keys>,
    pub accounts: AccountsService,
    pub bands: BandsService,
    pub polls: PollsService,
    pub songs: SongsService,
    pub votes: VotesService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        keys: Arc<Keys>,
        clock: Arc<dyn Clock>,
        mailer: Arc<dyn Mailer>,
        frontend_url: String,
    ) -> Self {
        let permissions = Permissions::new(store.clone());

        Self {
            accounts: AccountsService::new(
                store.clone(),
                keys.clone(),
                clock.clone(),
                mailer,
                frontend_url,
            ),
            bands: BandsService::new(store.clone(), permissions.clone(), clock.clone()),
            polls: PollsService::new(store.clone(), permissions.clone(), clock.clone()),
            songs: SongsService::new(store.clone(), permissions.clone(), clock.clone()),
            votes: VotesService::new(store.clone(), permissions, clock),
            store,
            keys,
        }
    }
}
