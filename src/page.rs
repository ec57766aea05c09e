//! The slice of a browser page the locator engine needs

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A live page that selectors can be resolved and validated against
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Handle bound to a selector (and, for multi-match results, a position)
    type Locator: Send;

    /// URL of the document currently loaded
    async fn current_url(&self) -> Result<String>;

    /// Full serialized HTML of the current document
    async fn content(&self) -> Result<String>;

    /// Whether `selector` currently matches at least one element
    async fn has_match(&self, selector: &str) -> Result<bool>;

    /// Call a JavaScript function expression in the page with JSON arguments
    async fn evaluate_function(&self, function: &str, args: Vec<Value>) -> Result<Value>;

    /// Locator for `selector`; nothing is looked up until it is used
    fn locator(&self, selector: &str) -> Self::Locator;

    /// One locator per element currently matching `selector`, in document order
    async fn locator_all(&self, selector: &str) -> Result<Vec<Self::Locator>>;
}
