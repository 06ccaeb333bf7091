use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::DriveError;
use crate::config::DriveConfig;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const EXPIRY_SLACK_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(at) => now + Duration::seconds(EXPIRY_SLACK_SECS) < at,
            None => true,
        }
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

/// Hands out a Drive access token: cached token while fresh, refreshed token
/// when a refresh token and client credentials are available, otherwise the
/// fallback token from the environment.
pub struct DriveAuth {
    client: Client,
    cache_path: PathBuf,
    client_id: Option<String>,
    client_secret: Option<String>,
    fallback: Option<String>,
    token_endpoint: String,
    state: Mutex<Option<CachedToken>>,
}

impl DriveAuth {
    pub fn new(client: Client, cfg: &DriveConfig) -> Self {
        Self {
            client,
            cache_path: cfg.token_cache.clone(),
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            fallback: cfg.access_token.clone(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            state: Mutex::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, DriveError> {
        let mut state = self.state.lock().await;

        if state.is_none() {
            *state = self.load_cache().await?;
        }

        if let Some(token) = state.as_ref() {
            if token.is_fresh(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        if let Some(refresh_token) = state.as_ref().and_then(|t| t.refresh_token.clone()) {
            match self.refresh(&refresh_token).await {
                Ok(token) => {
                    self.store_cache(&token).await?;
                    let access = token.access_token.clone();
                    *state = Some(token);
                    return Ok(access);
                }
                Err(e) => warn!(error = %e, "Drive token refresh failed"),
            }
        }

        self.fallback.clone().ok_or(DriveError::NoCredentials)
    }

    async fn load_cache(&self) -> Result<Option<CachedToken>, DriveError> {
        match tokio::fs::read(&self.cache_path).await {
            Ok(raw) => {
                debug!(path = %self.cache_path.display(), "Loaded Drive token cache");
                Ok(Some(serde_json::from_slice(&raw)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store_cache(&self, token: &CachedToken) -> Result<(), DriveError> {
        let raw = serde_json::to_vec_pretty(token)?;
        tokio::fs::write(&self.cache_path, raw).await?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<CachedToken, DriveError> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret)
        else {
            return Err(DriveError::NoCredentials);
        };

        let res: RefreshResponse = self
            .client
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!("Refreshed Drive access token");

        Ok(CachedToken {
            access_token: res.access_token,
            refresh_token: res.refresh_token.or_else(|| Some(refresh_token.to_string())),
            expires_at: res
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cache: PathBuf, fallback: Option<&str>) -> DriveConfig {
        DriveConfig {
            token_cache: cache,
            access_token: fallback.map(str::to_string),
            client_id: None,
            client_secret: None,
        }
    }

    fn write_cache(path: &std::path::Path, token: &CachedToken) {
        std::fs::write(path, serde_json::to_vec(token).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn fresh_cached_token_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_cache(
            &path,
            &CachedToken {
                access_token: "cached".into(),
                refresh_token: None,
                expires_at: Some(Utc::now() + Duration::hours(1)),
            },
        );

        let auth = DriveAuth::new(Client::new(), &config(path, Some("env")));
        assert_eq!(auth.access_token().await.unwrap(), "cached");
    }

    #[tokio::test]
    async fn expired_token_without_refresh_falls_back_to_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_cache(
            &path,
            &CachedToken {
                access_token: "stale".into(),
                refresh_token: Some("r".into()),
                expires_at: Some(Utc::now() - Duration::hours(1)),
            },
        );

        let auth = DriveAuth::new(Client::new(), &config(path, Some("env")));
        assert_eq!(auth.access_token().await.unwrap(), "env");
    }

    #[tokio::test]
    async fn missing_credentials_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let auth = DriveAuth::new(Client::new(), &config(dir.path().join("none.json"), None));
        assert!(matches!(
            auth.access_token().await,
            Err(DriveError::NoCredentials)
        ));
    }

    #[test]
    fn tokens_without_expiry_stay_fresh() {
        let token = CachedToken {
            access_token: "t".into(),
            refresh_token: None,
            expires_at: None,
        };
        assert!(token.is_fresh(Utc::now()));
    }
}
