use crate::channels::notify_best_effort;
use crate::db;
use crate::error::BotError;
use crate::ingest;
use crate::models::QueueItem;
use crate::staging::{self, StagedMedia};
use crate::state::SharedState;

/// One full invocation: authenticate, announce, ingest, process at most one
/// item, then sweep the staging directory. Everything below the startup
/// boundary is absorbed here; the worst case is "no item processed this
/// run", never a crash that corrupts the queue.
pub async fn run_invocation(state: &SharedState) {
    if let Err(e) = tokio::fs::create_dir_all(&state.config.download_dir).await {
        tracing::error!(
            "Failed to create download dir {}: {e}",
            state.config.download_dir.display()
        );
        return;
    }

    if let Err(e) = state.publisher.ensure_session().await {
        tracing::error!("Publisher login failed: {e}");
        notify_best_effort(
            state.notifier.as_ref(),
            "❌ Instagram login failed, no videos processed this run",
        )
        .await;
        return;
    }

    notify_best_effort(state.notifier.as_ref(), "🚀 Repost bot started").await;

    ingest::sync_feed(state).await;
    process_next(state).await;

    staging::sweep(&state.config.download_dir);
}

/// Claim and process the next eligible queue item. Returns true if an
/// attempt was made, successful or not.
pub async fn process_next(state: &SharedState) -> bool {
    let max_retries = state.config.max_retries;

    let item = match db::queue::next_eligible(&state.pool, max_retries).await {
        Ok(Some(item)) => item,
        Ok(None) => {
            tracing::info!("No eligible videos in queue");
            return false;
        }
        Err(e) => {
            // A read fault degrades to an empty queue; the next trigger
            // will retry the same item.
            tracing::error!("Queue read failed, treating as empty: {e}");
            return false;
        }
    };

    tracing::info!(
        "Processing video {} ({}, attempt {}/{})",
        item.id,
        item.file_name,
        item.retry_count + 1,
        max_retries
    );
    notify_best_effort(
        state.notifier.as_ref(),
        &format!(
            "⏳ Processing video:\n• Name: {}\n• Attempt: {}/{}",
            item.file_name,
            item.retry_count + 1,
            max_retries
        ),
    )
    .await;

    let staged = StagedMedia::new(&state.config.download_dir, item.id);

    if let Err(e) = state
        .fetcher
        .fetch_to_file(&item.file_id, staged.path())
        .await
    {
        tracing::error!("Download failed for {}: {e}", item.file_id);
        record_failure(state, &item, "Video download failed").await;
        return true;
    }

    match state
        .publisher
        .publish(staged.path(), item.caption_text())
        .await
    {
        Ok(code) => {
            let url = state.publisher.post_url(&code);
            if let Err(e) = db::queue::mark_published(&state.pool, &item.file_id, &url).await {
                tracing::warn!("Dropped success update for {}: {e}", item.file_id);
            }
            tracing::info!("Published {} as {url}", item.file_name);
            notify_best_effort(
                state.notifier.as_ref(),
                &format!(
                    "✅ Video published!\n\n• Name: {}\n• Caption: {}\n\n🔗 {url}",
                    item.file_name,
                    item.caption_text()
                ),
            )
            .await;
        }
        Err(e) => {
            tracing::error!("Publish failed for {}: {e}", item.file_id);
            let reason = match &e {
                BotError::Publish(msg) => msg.clone(),
                other => other.to_string(),
            };
            record_failure(state, &item, &reason).await;
        }
    }

    true
}

/// Record a failed attempt and tell the operator. A lost status write is
/// tolerated; the item simply stays selectable for the next trigger.
async fn record_failure(state: &SharedState, item: &QueueItem, reason: &str) {
    if let Err(e) =
        db::queue::mark_failed(&state.pool, &item.file_id, reason, state.config.max_retries).await
    {
        tracing::warn!("Dropped failure update for {}: {e}", item.file_id);
    }
    notify_best_effort(
        state.notifier.as_ref(),
        &format!("❌ Failed to process {}:\n{reason}", item.file_name),
    )
    .await;
}
