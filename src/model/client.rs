//! Gemini client
//!
//! Talks to the Generative Language API when an API key is configured and to
//! Vertex AI with a bearer token otherwise.

use super::types::{GeminiError, GenerateContentRequest, GenerateContentResponse};
use crate::auth::CredentialProvider;
use crate::config::ModelConfig;
use crate::error::ModelError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Wait applied when a rate-limited response carries no usable Retry-After
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Anything that can answer a selector prompt
#[async_trait]
pub trait SelectorModel: Send + Sync {
    /// Send `prompt` and return the trimmed answer text
    async fn query(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Where a query is sent and how it authenticates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Generative Language API, key passed as the `key` query parameter
    ApiKey { url: String },
    /// Vertex AI, bearer token from the credential provider
    Vertex { url: String },
}

impl Endpoint {
    pub fn url(&self) -> &str {
        match self {
            Endpoint::ApiKey { url } | Endpoint::Vertex { url } => url,
        }
    }

    pub fn is_api_key(&self) -> bool {
        matches!(self, Endpoint::ApiKey { .. })
    }
}

/// Gemini API client.
pub struct GeminiClient {
    http: Client,
    config: ModelConfig,
    credentials: Arc<CredentialProvider>,
}

impl GeminiClient {
    pub fn new(
        config: ModelConfig,
        credentials: Arc<CredentialProvider>,
    ) -> Result<Self, ModelError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ModelError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    /// Client configured from the environment, minting tokens with gcloud
    pub fn from_env() -> Result<Self, ModelError> {
        Self::with_gcloud(ModelConfig::from_env())
    }

    /// Client minting tokens with gcloud
    ///
    /// Fails up front if `config` names no usable endpoint, rather than on every query.
    pub fn with_gcloud(config: ModelConfig) -> Result<Self, ModelError> {
        let client = Self::new(config, Arc::new(CredentialProvider::gcloud()))?;
        client.endpoint()?;
        Ok(client)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Endpoint the next query will use
    pub fn endpoint(&self) -> Result<Endpoint, ModelError> {
        let model = &self.config.model;

        if self.config.api_key.is_some() {
            return Ok(Endpoint::ApiKey {
                url: format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.config.api_base_url.trim_end_matches('/'),
                    model
                ),
            });
        }

        let project = self.config.project.as_deref().ok_or_else(|| {
            ModelError::Config(format!(
                "{} must be set when {} is not",
                crate::config::ENV_PROJECT,
                crate::config::ENV_API_KEY
            ))
        })?;
        let location = &self.config.location;
        let base = self
            .config
            .vertex_base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", location));

        Ok(Endpoint::Vertex {
            url: format!(
                "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
                base.trim_end_matches('/'),
                project,
                location,
                model
            ),
        })
    }

    async fn send(&self, prompt: &str) -> Result<reqwest::Response, ModelError> {
        let endpoint = self.endpoint()?;
        let body = GenerateContentRequest::from_prompt(prompt);

        log::debug!(
            "Gemini generate_content: model={} endpoint={}",
            self.config.model,
            endpoint.url()
        );

        let request = match &endpoint {
            Endpoint::ApiKey { url } => {
                let key = self.config.api_key.as_deref().unwrap_or_default();
                self.http.post(url).query(&[("key", key)])
            }
            Endpoint::Vertex { url } => {
                let token = self.credentials.access_token().await?;
                self.http.post(url).bearer_auth(token)
            }
        };

        request
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))
    }
}

#[async_trait]
impl SelectorModel for GeminiClient {
    async fn query(&self, prompt: &str) -> Result<String, ModelError> {
        let response = self.send(prompt).await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = retry_after(response.headers());
            log::warn!(
                "Gemini rate limited, waiting {}s before giving up this attempt",
                retry_after.as_secs()
            );
            tokio::time::sleep(retry_after).await;
            return Err(ModelError::RateLimited { retry_after });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<GeminiError>(&body) {
                Ok(e) if !e.error.message.is_empty() => e.error.message,
                _ => status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| body.clone()),
            };
            return Err(ModelError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::MalformedResponse(format!("invalid JSON: {}", e)))?;

        parsed.into_answer()
    }
}

/// Seconds from a Retry-After header, or [`DEFAULT_RETRY_AFTER`]
pub(crate) fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn client(config: ModelConfig) -> GeminiClient {
        GeminiClient::new(config, Arc::new(CredentialProvider::gcloud())).unwrap()
    }

    #[test]
    fn test_api_key_endpoint() {
        let client = client(
            ModelConfig::default()
                .with_model("gemini-2.0-flash")
                .with_api_key("k"),
        );
        let endpoint = client.endpoint().unwrap();
        assert!(endpoint.is_api_key());
        assert_eq!(
            endpoint.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_vertex_endpoint() {
        let client = client(
            ModelConfig::default()
                .with_project("proj")
                .with_location("europe-west4"),
        );
        let endpoint = client.endpoint().unwrap();
        assert!(!endpoint.is_api_key());
        assert_eq!(
            endpoint.url(),
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/proj/locations/europe-west4/publishers/google/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_vertex_requires_project() {
        let client = client(ModelConfig::default());
        assert!(matches!(client.endpoint(), Err(ModelError::Config(_))));
    }

    #[test]
    fn test_missing_project_rejected_at_construction() {
        let err = GeminiClient::with_gcloud(ModelConfig::default()).err().unwrap();
        assert!(matches!(err, ModelError::Config(_)));

        assert!(GeminiClient::with_gcloud(ModelConfig::default().with_project("proj")).is_ok());
        assert!(GeminiClient::with_gcloud(ModelConfig::default().with_api_key("k")).is_ok());
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Duration::from_secs(7));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), DEFAULT_RETRY_AFTER);
    }
}
