pub mod channels;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod ingest;
pub mod models;
pub mod selector;
pub mod staging;
pub mod state;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::channels::instagram::InstagramPublisher;
use crate::channels::telegram::TelegramChannel;
use crate::config::Config;
use crate::state::{AppState, SharedState};

/// Wire the live collaborators into shared state. The Telegram channel
/// plays three roles: feed, notification sink, and media fetcher.
pub fn build_state(pool: SqlitePool, config: Config) -> SharedState {
    let telegram = Arc::new(TelegramChannel::new(&config.bot_token, &config.chat_id));
    let instagram = Arc::new(InstagramPublisher::new(&config.instagram));

    Arc::new(AppState {
        pool,
        feed: telegram.clone(),
        notifier: telegram.clone(),
        fetcher: telegram,
        publisher: instagram,
        config,
    })
}
