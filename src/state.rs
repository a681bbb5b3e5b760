use std::sync::Arc;

use sqlx::SqlitePool;

use crate::channels::{MediaFetcher, Notifier, Publisher, VideoFeed};
use crate::config::Config;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub feed: Arc<dyn VideoFeed>,
    pub notifier: Arc<dyn Notifier>,
    pub fetcher: Arc<dyn MediaFetcher>,
    pub publisher: Arc<dyn Publisher>,
}
