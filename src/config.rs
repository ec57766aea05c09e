//! Model and resolution configuration
//!
//! Model settings come from the environment; resolution options are passed
//! per call.

use std::time::Duration;

pub const ENV_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
pub const ENV_LOCATION: &str = "GOOGLE_CLOUD_LOCATION";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default on-disk location of the selector cache, relative to the working directory.
pub const DEFAULT_CACHE_PATH: &str = "selector-cache.json";

/// Settings for the Gemini backend
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model identifier (e.g., "gemini-1.5-flash")
    pub model: String,

    /// Vertex AI project, required in token mode
    pub project: Option<String>,

    /// Vertex AI region
    pub location: String,

    /// API key; when present the key-authenticated endpoint is used
    pub api_key: Option<String>,

    /// Base URL of the Generative Language API
    pub api_base_url: String,

    /// Base URL override for Vertex AI (defaults to the regional host)
    pub vertex_base_url: Option<String>,

    /// HTTP timeout for a single model request
    pub request_timeout: Duration,
}

impl ModelConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            model: get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            project: get(ENV_PROJECT),
            location: get(ENV_LOCATION).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            api_key: get(ENV_API_KEY),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn without_api_key(mut self) -> Self {
        self.api_key = None;
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_vertex_base_url(mut self, url: impl Into<String>) -> Self {
        self.vertex_base_url = Some(url.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Whether calls go through the key-authenticated endpoint
    pub fn uses_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            project: None,
            location: DEFAULT_LOCATION.to_string(),
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            vertex_base_url: None,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Options for one resolution request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Maximum number of attempts, including the cache attempt
    pub max_retries: u32,

    /// Upper bound for a single attempt (model query plus validation)
    pub timeout: Option<Duration>,

    /// How long `highlight` keeps the outline visible
    pub highlight_duration: Duration,
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_highlight_duration(mut self, duration: Duration) -> Self {
        self.highlight_duration = duration;
        self
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: None,
            highlight_duration: Duration::from_millis(3000),
        }
    }
}
