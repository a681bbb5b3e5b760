use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use super::{InboundVideo, MediaFetcher, Notifier, VideoFeed};
use crate::error::BotError;

/// Telegram Bot API client. One chat is both the video source and the
/// status sink.
pub struct TelegramChannel {
    client: reqwest::Client,
    token: String,
    chat_id: String,
    api_base: String,
}

impl TelegramChannel {
    pub fn new(token: &str, chat_id: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build reqwest client"),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
            api_base: "https://api.telegram.org".to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{file_path}", self.api_base, self.token)
    }
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct Update {
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    message_id: i64,
    chat: Chat,
    video: Option<Video>,
    caption: Option<String>,
}

#[derive(Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Deserialize)]
struct Video {
    file_id: String,
    file_name: Option<String>,
}

#[derive(Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

#[async_trait]
impl VideoFeed for TelegramChannel {
    async fn poll_new_videos(&self) -> Result<Vec<InboundVideo>, BotError> {
        let resp = self
            .client
            .get(self.method_url("getUpdates"))
            .send()
            .await
            .map_err(|e| BotError::Ingestion(format!("getUpdates request failed: {e}")))?;

        let body: ApiResponse<Vec<Update>> = resp
            .json()
            .await
            .map_err(|e| BotError::Ingestion(format!("getUpdates returned invalid JSON: {e}")))?;

        if !body.ok {
            return Err(BotError::Ingestion(
                body.description
                    .unwrap_or_else(|| "getUpdates rejected".to_string()),
            ));
        }

        let mut videos = Vec::new();
        for update in body.result.unwrap_or_default() {
            let Some(message) = update.message else {
                continue;
            };
            if message.chat.id.to_string() != self.chat_id {
                continue;
            }
            let Some(video) = message.video else {
                continue;
            };
            let file_name = video
                .file_name
                .unwrap_or_else(|| format!("video_{}", message.message_id));
            videos.push(InboundVideo {
                file_id: video.file_id,
                message_id: message.message_id,
                file_name,
                caption: message.caption,
            });
        }
        Ok(videos)
    }
}

#[async_trait]
impl Notifier for TelegramChannel {
    async fn notify(&self, text: &str) -> Result<(), String> {
        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .form(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .await
            .map_err(|e| format!("sendMessage request failed: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("sendMessage returned {}", resp.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaFetcher for TelegramChannel {
    async fn fetch_to_file(&self, file_id: &str, dest: &Path) -> Result<(), BotError> {
        let resp = self
            .client
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await
            .map_err(|e| BotError::Download(format!("getFile request failed: {e}")))?;

        let body: ApiResponse<FileInfo> = resp
            .json()
            .await
            .map_err(|e| BotError::Download(format!("getFile returned invalid JSON: {e}")))?;

        if !body.ok {
            return Err(BotError::Download(
                body.description
                    .unwrap_or_else(|| "getFile rejected".to_string()),
            ));
        }

        let file_path = body
            .result
            .and_then(|info| info.file_path)
            .ok_or_else(|| BotError::Download("getFile response missing file_path".to_string()))?;

        let resp = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BotError::Download(format!("File download failed: {e}")))?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| BotError::Download(format!("Failed to create {}: {e}", dest.display())))?;

        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| BotError::Download(format!("File download interrupted: {e}")))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| BotError::Download(format!("Failed to write {}: {e}", dest.display())))?;
        }

        file.flush()
            .await
            .map_err(|e| BotError::Download(format!("Failed to flush {}: {e}", dest.display())))?;
        Ok(())
    }
}
