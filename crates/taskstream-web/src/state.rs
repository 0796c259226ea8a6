//! Application state.

use taskstream_db::{ItemFilter, RedisPool};
use tokio::sync::watch;

use crate::hub::Hub;

/// One broadcast hub per filtered view, created at startup and living for
/// the process lifetime.
#[derive(Clone)]
pub struct ViewHubs {
    pub all: Hub,
    pub active: Hub,
    pub completed: Hub,
}

impl ViewHubs {
    pub fn get(&self, filter: ItemFilter) -> &Hub {
        match filter {
            ItemFilter::All => &self.all,
            ItemFilter::Active => &self.active,
            ItemFilter::Completed => &self.completed,
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: RedisPool,
    pub hubs: ViewHubs,
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(db: RedisPool, hubs: ViewHubs, shutdown: watch::Receiver<bool>) -> Self {
        Self { db, hubs, shutdown }
    }
}
