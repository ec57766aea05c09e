use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Failed to connect to Chrome: {0}")]
    ConnectionFailed(String),

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Every attempt was spent without a selector that matched the page.
    #[error("Could not find element matching description: \"{0}\"")]
    ElementNotFound(String),

    #[error("No page available")]
    NoPage,

    #[error("CDP error: {0}")]
    CdpError(#[from] chromiumoxide::error::CdpError),

    #[error("Selector cache error: {0}")]
    Cache(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LocatorError>;

/// Failure of a single model query.
///
/// None of these abort a resolution; the resolver treats each as a spent attempt.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Rate limited by model backend, waited {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Model request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to acquire access token: {0}")]
    Credential(String),

    #[error("Model configuration error: {0}")]
    Config(String),
}

impl ModelError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ModelError::RateLimited { .. })
    }
}
