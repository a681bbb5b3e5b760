use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bot_token: String,
    pub chat_id: String,
    pub instagram: InstagramConfig,
    pub download_dir: PathBuf,
    pub max_retries: i64,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct InstagramConfig {
    pub username: String,
    pub password: String,
    pub session_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_or("DATABASE_URL", "sqlite://videos.db");

        let bot_token = env_required("REELPOST_BOT_TOKEN")?;
        let chat_id = env_required("REELPOST_CHAT_ID")?;

        let instagram = InstagramConfig {
            username: env_required("REELPOST_IG_USERNAME")?,
            password: env_required("REELPOST_IG_PASSWORD")?,
            session_file: env_or("REELPOST_IG_SESSION_FILE", "instagram_session.json").into(),
        };

        let download_dir: PathBuf = env_or("REELPOST_DOWNLOAD_DIR", "downloads").into();

        let max_retries: i64 = env_or("REELPOST_MAX_RETRIES", "3")
            .parse()
            .map_err(|e| format!("Invalid REELPOST_MAX_RETRIES: {e}"))?;
        if max_retries < 1 {
            return Err("REELPOST_MAX_RETRIES must be at least 1".to_string());
        }

        let log_level = env_or("REELPOST_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            bot_token,
            chat_id,
            instagram,
            download_dir,
            max_retries,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
