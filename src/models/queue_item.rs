use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueueItem {
    pub id: i64,
    pub file_id: String,
    pub message_id: i64,
    pub file_name: String,
    pub caption: Option<String>,
    pub status: String,
    pub retry_count: i64,
    pub last_error: Option<String>,
    pub post_url: Option<String>,
    pub skipped: bool,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    /// Caption to publish with, falling back to the file name when the
    /// original message carried none.
    pub fn caption_text(&self) -> &str {
        self.caption
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(&self.file_name)
    }
}
