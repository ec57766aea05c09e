pub mod auth;
pub mod browser;
pub mod cache;
pub mod config;
pub mod error;
pub mod locator;
pub mod model;
pub mod page;
pub mod resolver;

//  Re-export commonly used items
pub use auth::{CredentialProvider, GcloudTokenSource, TokenSource, TOKEN_TTL};
pub use browser::chrome::{ChromeDriver, ConnectionMode};
pub use browser::page::{ChromePage, ElementLocator};
pub use cache::{CacheStore, FileCacheStore, MemoryCacheStore, SelectorCache};
pub use config::{ModelConfig, ResolveOptions};
pub use error::{LocatorError, ModelError, Result};
pub use locator::{AiPage, AiPageExt};
pub use model::{Endpoint, GeminiClient, SelectorModel};
pub use page::PageHandle;
pub use resolver::{AttemptOutcome, Resolution, SelectorResolver};
