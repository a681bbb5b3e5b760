use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::QueueItem;
use crate::selector;

/// Record a video seen on the feed. Returns true if a row was created;
/// re-ingesting a known file_id is a no-op reporting false.
pub async fn insert(
    pool: &SqlitePool,
    file_id: &str,
    message_id: i64,
    file_name: &str,
    caption: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO queue_items (file_id, message_id, file_name, caption)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(file_id) DO NOTHING",
    )
    .bind(file_id)
    .bind(message_id)
    .bind(file_name)
    .bind(caption)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// All rows that have not reached a terminal state, oldest first.
pub async fn unprocessed(pool: &SqlitePool) -> Result<Vec<QueueItem>, sqlx::Error> {
    sqlx::query_as::<_, QueueItem>("SELECT * FROM queue_items WHERE processed = 0 ORDER BY id ASC")
        .fetch_all(pool)
        .await
}

/// Point-in-time pick of the next item to work on. Mutates nothing.
pub async fn next_eligible(
    pool: &SqlitePool,
    max_retries: i64,
) -> Result<Option<QueueItem>, sqlx::Error> {
    let candidates = unprocessed(pool).await?;
    Ok(selector::pick(&candidates, max_retries).cloned())
}

/// Terminal success: the row leaves the queue and keeps the post URL for
/// audit. A repeated call with the same id is a harmless overwrite.
pub async fn mark_published(
    pool: &SqlitePool,
    file_id: &str,
    post_url: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE queue_items
         SET status = 'published', post_url = ?, processed = 1, published_at = ?
         WHERE file_id = ?",
    )
    .bind(post_url)
    .bind(Utc::now())
    .bind(file_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record a failed attempt. The retry count only ever goes up; the moment it
/// reaches the bound the row is also marked processed, so exhausted items
/// leave the queue in the same write.
pub async fn mark_failed(
    pool: &SqlitePool,
    file_id: &str,
    error: &str,
    max_retries: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE queue_items
         SET status = 'failed',
             last_error = ?,
             retry_count = retry_count + 1,
             processed = CASE WHEN retry_count + 1 >= ? THEN 1 ELSE processed END
         WHERE file_id = ?",
    )
    .bind(error)
    .bind(max_retries)
    .bind(file_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_file_id(
    pool: &SqlitePool,
    file_id: &str,
) -> Result<Option<QueueItem>, sqlx::Error> {
    sqlx::query_as::<_, QueueItem>("SELECT * FROM queue_items WHERE file_id = ?")
        .bind(file_id)
        .fetch_optional(pool)
        .await
}

/// Manual override: park an item without deleting it, or bring it back.
pub async fn set_skipped(
    pool: &SqlitePool,
    file_id: &str,
    skipped: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE queue_items SET skipped = ? WHERE file_id = ?")
        .bind(skipped)
        .bind(file_id)
        .execute(pool)
        .await?;
    Ok(())
}
