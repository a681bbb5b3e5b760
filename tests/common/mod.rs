#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::Mutex;

use reelpost::channels::{InboundVideo, MediaFetcher, Notifier, Publisher, VideoFeed};
use reelpost::config::{Config, InstagramConfig};
use reelpost::error::BotError;
use reelpost::state::{AppState, SharedState};

/// Fresh in-memory database with migrations applied. Capped at one
/// connection: every `sqlite::memory:` connection is its own database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

static DIR_SEQ: AtomicU64 = AtomicU64::new(0);

/// Unique staging directory per test.
pub fn staging_dir(label: &str) -> PathBuf {
    let n = DIR_SEQ.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "reelpost-test-{label}-{}-{n}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("Failed to create staging dir");
    dir
}

pub fn test_config(max_retries: i64, download_dir: PathBuf) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        bot_token: "test-token".to_string(),
        chat_id: "1000".to_string(),
        instagram: InstagramConfig {
            username: "tester".to_string(),
            password: "secret".to_string(),
            session_file: download_dir.join("session.json"),
        },
        download_dir,
        max_retries,
        log_level: "warn".to_string(),
    }
}

pub fn video(file_id: &str, message_id: i64, name: &str, caption: Option<&str>) -> InboundVideo {
    InboundVideo {
        file_id: file_id.to_string(),
        message_id,
        file_name: name.to_string(),
        caption: caption.map(str::to_string),
    }
}

// ── Collaborator doubles ────────────────────────────────────────

/// Feed returning a fixed batch on every poll.
pub struct StaticFeed(pub Vec<InboundVideo>);

#[async_trait]
impl VideoFeed for StaticFeed {
    async fn poll_new_videos(&self) -> Result<Vec<InboundVideo>, BotError> {
        Ok(self.0.clone())
    }
}

/// Notifier that records every message it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub async fn snapshot(&self) -> Vec<String> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<(), String> {
        self.messages.lock().await.push(text.to_string());
        Ok(())
    }
}

/// Fetcher that stages a placeholder file, or fails on demand.
pub struct StubFetcher {
    pub fail: bool,
}

#[async_trait]
impl MediaFetcher for StubFetcher {
    async fn fetch_to_file(&self, _file_id: &str, dest: &Path) -> Result<(), BotError> {
        if self.fail {
            return Err(BotError::Download("connection reset".to_string()));
        }
        tokio::fs::write(dest, b"not really a video")
            .await
            .map_err(|e| BotError::Download(e.to_string()))
    }
}

/// Publisher that pops scripted outcomes and records what it saw on disk.
/// Runs out of script → succeeds with a fixed code.
#[derive(Default)]
pub struct ScriptedPublisher {
    outcomes: Mutex<VecDeque<Result<String, String>>>,
    /// (path handed over, whether the file existed at publish time)
    pub seen: Mutex<Vec<(PathBuf, bool)>>,
}

impl ScriptedPublisher {
    pub fn with_outcomes(outcomes: Vec<Result<String, String>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Publisher for ScriptedPublisher {
    async fn ensure_session(&self) -> Result<(), BotError> {
        Ok(())
    }

    async fn publish(&self, video: &Path, _caption: &str) -> Result<String, BotError> {
        self.seen
            .lock()
            .await
            .push((video.to_path_buf(), video.exists()));
        match self.outcomes.lock().await.pop_front() {
            Some(Ok(code)) => Ok(code),
            Some(Err(msg)) => Err(BotError::Publish(msg)),
            None => Ok("TESTCODE".to_string()),
        }
    }

    fn post_url(&self, code: &str) -> String {
        format!("https://www.instagram.com/p/{code}/")
    }
}

/// Publisher whose session establishment always fails.
pub struct NoSessionPublisher;

#[async_trait]
impl Publisher for NoSessionPublisher {
    async fn ensure_session(&self) -> Result<(), BotError> {
        Err(BotError::Auth("challenge_required".to_string()))
    }

    async fn publish(&self, _video: &Path, _caption: &str) -> Result<String, BotError> {
        panic!("publish must not be reached without a session");
    }

    fn post_url(&self, code: &str) -> String {
        format!("https://www.instagram.com/p/{code}/")
    }
}

// ── Harness ─────────────────────────────────────────────────────

pub struct TestHarness {
    pub state: SharedState,
    pub notifier: Arc<RecordingNotifier>,
    pub publisher: Arc<ScriptedPublisher>,
    pub dir: PathBuf,
}

/// Build shared state around an in-memory queue and recording doubles.
pub async fn harness(
    label: &str,
    max_retries: i64,
    feed: Vec<InboundVideo>,
    fetcher_fails: bool,
    outcomes: Vec<Result<String, String>>,
) -> TestHarness {
    let pool = test_pool().await;
    let dir = staging_dir(label);
    let notifier = Arc::new(RecordingNotifier::default());
    let publisher = Arc::new(ScriptedPublisher::with_outcomes(outcomes));

    let state = Arc::new(AppState {
        pool,
        config: test_config(max_retries, dir.clone()),
        feed: Arc::new(StaticFeed(feed)),
        notifier: notifier.clone(),
        fetcher: Arc::new(StubFetcher { fail: fetcher_fails }),
        publisher: publisher.clone(),
    });

    TestHarness {
        state,
        notifier,
        publisher,
        dir,
    }
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true)
}

/// Remove the staging directory after a test completes.
pub fn cleanup(harness: TestHarness) {
    let _ = std::fs::remove_dir_all(&harness.dir);
}
