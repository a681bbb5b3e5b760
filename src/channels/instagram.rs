use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use super::Publisher;
use crate::config::InstagramConfig;
use crate::error::BotError;

const WEB_BASE: &str = "https://www.instagram.com";
// App id the web client sends on every API call.
const APP_ID: &str = "936619743392459";

/// Session cookies persisted between invocations so login happens once.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Session {
    sessionid: String,
    csrftoken: String,
    #[serde(default)]
    ds_user_id: String,
}

pub struct InstagramPublisher {
    client: reqwest::Client,
    username: String,
    password: String,
    session_file: PathBuf,
    session: Mutex<Option<Session>>,
}

impl InstagramPublisher {
    pub fn new(config: &InstagramConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
                .build()
                .expect("Failed to build reqwest client"),
            username: config.username.clone(),
            password: config.password.clone(),
            session_file: config.session_file.clone(),
            session: Mutex::new(None),
        }
    }

    async fn load_session(&self) -> Option<Session> {
        let raw = tokio::fs::read_to_string(&self.session_file).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable session file {}: {e}",
                    self.session_file.display()
                );
                None
            }
        }
    }

    async fn save_session(&self, session: &Session) {
        match serde_json::to_string_pretty(session) {
            Ok(raw) => {
                if let Err(e) = tokio::fs::write(&self.session_file, raw).await {
                    tracing::warn!(
                        "Failed to persist session to {}: {e}",
                        self.session_file.display()
                    );
                }
            }
            Err(e) => tracing::warn!("Failed to serialize session: {e}"),
        }
    }

    async fn login(&self) -> Result<Session, BotError> {
        // The login endpoint wants a csrf token issued to the same client.
        let resp = self
            .client
            .get(format!("{WEB_BASE}/accounts/login/"))
            .send()
            .await
            .map_err(|e| BotError::Auth(format!("csrf bootstrap failed: {e}")))?;

        let csrftoken = cookie_value(&resp, "csrftoken")
            .ok_or_else(|| BotError::Auth("no csrftoken cookie in login page response".to_string()))?;

        let enc_password = format!(
            "#PWD_INSTAGRAM_BROWSER:0:{}:{}",
            Utc::now().timestamp(),
            self.password
        );

        let resp = self
            .client
            .post(format!("{WEB_BASE}/accounts/login/ajax/"))
            .header("X-CSRFToken", &csrftoken)
            .header("X-IG-App-ID", APP_ID)
            .header("Cookie", format!("csrftoken={csrftoken}"))
            .form(&[
                ("username", self.username.as_str()),
                ("enc_password", enc_password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BotError::Auth(format!("login request failed: {e}")))?;

        let sessionid = cookie_value(&resp, "sessionid");
        let ds_user_id = cookie_value(&resp, "ds_user_id").unwrap_or_default();
        let csrftoken = cookie_value(&resp, "csrftoken").unwrap_or(csrftoken);

        #[derive(Deserialize)]
        struct LoginResponse {
            #[serde(default)]
            authenticated: bool,
            message: Option<String>,
        }

        let body: LoginResponse = resp
            .json()
            .await
            .map_err(|e| BotError::Auth(format!("login returned invalid JSON: {e}")))?;

        match (body.authenticated, sessionid) {
            (true, Some(sessionid)) => Ok(Session {
                sessionid,
                csrftoken,
                ds_user_id,
            }),
            _ => Err(BotError::Auth(
                body.message
                    .unwrap_or_else(|| "Instagram rejected the credentials".to_string()),
            )),
        }
    }

    fn cookie_header(session: &Session) -> String {
        format!(
            "sessionid={}; csrftoken={}; ds_user_id={}",
            session.sessionid, session.csrftoken, session.ds_user_id
        )
    }
}

#[async_trait]
impl Publisher for InstagramPublisher {
    async fn ensure_session(&self) -> Result<(), BotError> {
        let mut guard = self.session.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        if let Some(session) = self.load_session().await {
            tracing::info!(
                "Instagram session restored from {}",
                self.session_file.display()
            );
            *guard = Some(session);
            return Ok(());
        }

        let session = self.login().await?;
        tracing::info!("Instagram login succeeded, session saved");
        self.save_session(&session).await;
        *guard = Some(session);
        Ok(())
    }

    async fn publish(&self, video: &Path, caption: &str) -> Result<String, BotError> {
        let session = self
            .session
            .lock()
            .await
            .clone()
            .ok_or_else(|| BotError::Publish("no active Instagram session".to_string()))?;

        let bytes = tokio::fs::read(video).await.map_err(|e| {
            BotError::Publish(format!("failed to read staged video {}: {e}", video.display()))
        })?;

        let upload_id = Utc::now().timestamp_millis().to_string();
        let entity_name = format!("{upload_id}_0_{}", bytes.len());
        let rupload_params = json!({
            "upload_id": upload_id,
            "media_type": "2",
        })
        .to_string();

        let resp = self
            .client
            .post(format!("{WEB_BASE}/rupload_igvideo/{entity_name}"))
            .header("Cookie", Self::cookie_header(&session))
            .header("X-CSRFToken", &session.csrftoken)
            .header("X-IG-App-ID", APP_ID)
            .header("X-Instagram-Rupload-Params", rupload_params)
            .header("X-Entity-Name", &entity_name)
            .header("X-Entity-Length", bytes.len().to_string())
            .header("Offset", "0")
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| BotError::Publish(format!("video upload failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(BotError::Publish(format!(
                "video upload returned {}",
                resp.status()
            )));
        }

        let resp = self
            .client
            .post(format!("{WEB_BASE}/api/v1/media/configure_to_clips/"))
            .header("Cookie", Self::cookie_header(&session))
            .header("X-CSRFToken", &session.csrftoken)
            .header("X-IG-App-ID", APP_ID)
            .form(&[
                ("upload_id", upload_id.as_str()),
                ("caption", caption),
                ("source_type", "library"),
            ])
            .send()
            .await
            .map_err(|e| BotError::Publish(format!("configure request failed: {e}")))?;

        #[derive(Deserialize)]
        struct ConfigureResponse {
            status: String,
            media: Option<Media>,
            message: Option<String>,
        }

        #[derive(Deserialize)]
        struct Media {
            code: String,
        }

        let http_status = resp.status();
        let body: ConfigureResponse = resp
            .json()
            .await
            .map_err(|e| BotError::Publish(format!("configure returned invalid JSON: {e}")))?;

        if body.status != "ok" {
            return Err(BotError::Publish(
                body.message
                    .unwrap_or_else(|| format!("configure rejected ({http_status})")),
            ));
        }

        body.media
            .map(|media| media.code)
            .ok_or_else(|| BotError::Publish("configure response missing media code".to_string()))
    }

    fn post_url(&self, code: &str) -> String {
        format!("https://www.instagram.com/p/{code}/")
    }
}

fn cookie_value(resp: &reqwest::Response, name: &str) -> Option<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|raw| {
            let (pair, _) = raw.split_once(';').unwrap_or((raw, ""));
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name && !value.is_empty() && value != "\"\"")
                .then(|| value.to_string())
        })
}
