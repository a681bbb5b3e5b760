#[derive(Debug)]
pub enum BotError {
    Ingestion(String),
    Download(String),
    Publish(String),
    Auth(String),
    Storage(sqlx::Error),
}

impl std::fmt::Display for BotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotError::Ingestion(msg) => write!(f, "Ingestion error: {msg}"),
            BotError::Download(msg) => write!(f, "Download error: {msg}"),
            BotError::Publish(msg) => write!(f, "Publish error: {msg}"),
            BotError::Auth(msg) => write!(f, "Auth error: {msg}"),
            BotError::Storage(err) => write!(f, "Storage error: {err}"),
        }
    }
}

impl std::error::Error for BotError {}

impl From<sqlx::Error> for BotError {
    fn from(err: sqlx::Error) -> Self {
        BotError::Storage(err)
    }
}
