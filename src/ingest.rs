use crate::channels::notify_best_effort;
use crate::db;
use crate::state::SharedState;

/// Poll the feed and queue anything new. Returns the number of rows
/// inserted. Feed and storage faults are logged and absorbed; polling must
/// never take the invocation down.
pub async fn sync_feed(state: &SharedState) -> usize {
    let videos = match state.feed.poll_new_videos().await {
        Ok(videos) => videos,
        Err(e) => {
            tracing::error!("Feed poll failed: {e}");
            return 0;
        }
    };

    let mut queued = Vec::new();
    for video in &videos {
        match db::queue::insert(
            &state.pool,
            &video.file_id,
            video.message_id,
            &video.file_name,
            video.caption.as_deref(),
        )
        .await
        {
            Ok(true) => queued.push(video.file_name.as_str()),
            Ok(false) => {}
            Err(e) => tracing::warn!("Failed to queue video {}: {e}", video.file_id),
        }
    }

    if !queued.is_empty() {
        tracing::info!("Queued {} new videos", queued.len());
        let mut report = String::from("🎥 New videos queued:\n");
        for name in &queued {
            report.push_str(&format!("\n• {name}"));
        }
        notify_best_effort(state.notifier.as_ref(), &report).await;
    }

    queued.len()
}
