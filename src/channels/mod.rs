pub mod instagram;
pub mod telegram;

use std::path::Path;

use async_trait::async_trait;

use crate::error::BotError;

/// A video attachment seen on the chat feed, before it is queued.
#[derive(Debug, Clone)]
pub struct InboundVideo {
    pub file_id: String,
    pub message_id: i64,
    pub file_name: String,
    pub caption: Option<String>,
}

#[async_trait]
pub trait VideoFeed: Send + Sync {
    /// List video attachments currently visible on the feed. The caller
    /// deduplicates against the queue, so returning already-seen items is
    /// fine.
    async fn poll_new_videos(&self) -> Result<Vec<InboundVideo>, BotError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), String>;
}

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Stage the remote media at `dest`. On error the file may exist in a
    /// partially written state; the caller owns removal.
    async fn fetch_to_file(&self, file_id: &str, dest: &Path) -> Result<(), BotError>;
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Establish (or restore) the account session once per invocation.
    async fn ensure_session(&self) -> Result<(), BotError>;

    /// Publish the staged video and return the opaque post code.
    async fn publish(&self, video: &Path, caption: &str) -> Result<String, BotError>;

    /// Canonical public URL for a post code returned by `publish`.
    fn post_url(&self, code: &str) -> String;
}

/// Status notifications never gate the core flow; a failed send is logged
/// and dropped.
pub async fn notify_best_effort(notifier: &dyn Notifier, text: &str) {
    if let Err(e) = notifier.notify(text).await {
        tracing::warn!("Notification not delivered: {e}");
    }
}
