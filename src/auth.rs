//! Bearer tokens for the Vertex AI endpoint
//!
//! Tokens are fetched from a [`TokenSource`] and reused until they are 59
//! minutes old.

use crate::error::ModelError;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// How long an acquired token is reused before it is refreshed
pub const TOKEN_TTL: Duration = Duration::from_secs(59 * 60);

/// Something that can mint a fresh access token
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<String, ModelError>;
}

/// Mints tokens with `gcloud auth print-access-token`
pub struct GcloudTokenSource {
    gcloud_path: String,
}

impl GcloudTokenSource {
    pub fn new() -> Self {
        Self {
            gcloud_path: "gcloud".to_string(),
        }
    }

    /// Set custom gcloud CLI path
    pub fn with_gcloud_path(mut self, path: String) -> Self {
        self.gcloud_path = path;
        self
    }
}

impl Default for GcloudTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenSource for GcloudTokenSource {
    async fn fetch_token(&self) -> Result<String, ModelError> {
        let output = Command::new(&self.gcloud_path)
            .arg("auth")
            .arg("print-access-token")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ModelError::Credential(format!(
                    "Failed to run '{}'. Is the Google Cloud SDK installed? {}",
                    self.gcloud_path, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ModelError::Credential(format!(
                "gcloud exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(ModelError::Credential(
                "gcloud returned an empty access token".to_string(),
            ));
        }

        Ok(token)
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    acquired_at: Instant,
}

/// Caches the current access token for the life of the process
///
/// Construct one per process and share it with every client.
pub struct CredentialProvider {
    source: Arc<dyn TokenSource>,
    ttl: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl CredentialProvider {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            ttl: TOKEN_TTL,
            cached: Mutex::new(None),
        }
    }

    /// Provider backed by the gcloud CLI
    pub fn gcloud() -> Self {
        Self::new(Arc::new(GcloudTokenSource::new()))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Current token, refreshed first if missing or expired
    pub async fn access_token(&self) -> Result<String, ModelError> {
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref() {
            if entry.acquired_at.elapsed() < self.ttl {
                return Ok(entry.token.clone());
            }
            log::debug!("Access token expired, refreshing");
        }

        let token = self.source.fetch_token().await?;
        *cached = Some(CachedToken {
            token: token.clone(),
            acquired_at: Instant::now(),
        });

        Ok(token)
    }
}
