//! Selector resolution
//!
//! Turns a free-text element description into a CSS selector that matches the
//! live page. The cached selector (if any) is tried on the first attempt only;
//! every later attempt asks the model again. A selector is cached only after
//! it matched at least one element.

use crate::cache::{CacheStore, FileCacheStore};
use crate::config::ResolveOptions;
use crate::error::{LocatorError, ModelError, Result};
use crate::model::{parse_answer, selector_prompt, GeminiClient, ModelAnswer, SelectorModel};
use crate::page::PageHandle;
use std::fmt;
use std::sync::Arc;

/// What happened during one attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    /// Candidate matched the page
    Resolved { selector: String, from_cache: bool },
    /// Cached selector no longer matches anything
    CacheHitInvalid(String),
    /// Model query failed (network, rate limit, malformed response, ...)
    ModelError(ModelError),
    /// Model answered with an `ERROR:` explanation
    ModelDeclined(String),
    /// Model selector matched nothing
    ValidationFailed(String),
    /// Page could not be read
    PageError(String),
    /// Attempt exceeded `ResolveOptions::timeout`
    TimedOut,
}

impl AttemptOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, AttemptOutcome::Resolved { .. })
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Resolved {
                selector,
                from_cache: true,
            } => write!(f, "cached selector '{}' matched", selector),
            AttemptOutcome::Resolved { selector, .. } => {
                write!(f, "selector '{}' matched", selector)
            }
            AttemptOutcome::CacheHitInvalid(s) => {
                write!(f, "cached selector '{}' no longer matches", s)
            }
            AttemptOutcome::ModelError(e) => write!(f, "model query failed: {}", e),
            AttemptOutcome::ModelDeclined(reason) => {
                write!(f, "model could not determine a selector: {}", reason)
            }
            AttemptOutcome::ValidationFailed(s) => write!(f, "selector '{}' matched nothing", s),
            AttemptOutcome::PageError(e) => write!(f, "page error: {}", e),
            AttemptOutcome::TimedOut => write!(f, "attempt timed out"),
        }
    }
}

/// Successful resolution and the attempts it took
#[derive(Debug)]
pub struct Resolution {
    pub selector: String,
    pub from_cache: bool,
    /// Failed attempts before the successful one, in order
    pub failed_attempts: Vec<AttemptOutcome>,
}

impl Resolution {
    /// Total attempts used, including the successful one
    pub fn attempts(&self) -> usize {
        self.failed_attempts.len() + 1
    }
}

/// Cache-first selector resolver
pub struct SelectorResolver {
    store: Arc<dyn CacheStore>,
    model: Arc<dyn SelectorModel>,
}

impl SelectorResolver {
    pub fn new(store: Arc<dyn CacheStore>, model: Arc<dyn SelectorModel>) -> Self {
        Self { store, model }
    }

    /// Gemini configured from the environment, cache in `selector-cache.json`
    pub fn from_env() -> std::result::Result<Self, ModelError> {
        Ok(Self::new(
            Arc::new(FileCacheStore::default()),
            Arc::new(GeminiClient::from_env()?),
        ))
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Resolve `description` to a selector matching `page`
    pub async fn resolve<P: PageHandle>(
        &self,
        page: &P,
        description: &str,
        options: &ResolveOptions,
    ) -> Result<String> {
        self.resolve_detailed(page, description, options)
            .await
            .map(|r| r.selector)
    }

    /// Like [`resolve`](Self::resolve), also reporting the failed attempts
    pub async fn resolve_detailed<P: PageHandle>(
        &self,
        page: &P,
        description: &str,
        options: &ResolveOptions,
    ) -> Result<Resolution> {
        let mut cache = self.store.load().await;
        let url = page.current_url().await?;
        let cached = cache.get(&url, description).map(str::to_string);

        let mut failed_attempts = Vec::new();

        for attempt in 1..=options.max_retries {
            let cached_candidate = if attempt == 1 { cached.as_deref() } else { None };
            let run = self.attempt(page, description, cached_candidate);

            let outcome = match options.timeout {
                Some(limit) => tokio::time::timeout(limit, run)
                    .await
                    .unwrap_or(AttemptOutcome::TimedOut),
                None => run.await,
            };

            match outcome {
                AttemptOutcome::Resolved {
                    selector,
                    from_cache,
                } => {
                    if from_cache {
                        log::debug!("Cache hit for \"{}\" on {}: {}", description, url, selector);
                    } else {
                        cache.insert(url.as_str(), description, selector.as_str());
                        self.store.save(&cache).await?;
                        log::info!("Resolved \"{}\" on {} to {}", description, url, selector);
                    }
                    return Ok(Resolution {
                        selector,
                        from_cache,
                        failed_attempts,
                    });
                }
                failed => {
                    log::warn!(
                        "Attempt {}/{} for \"{}\" failed: {}",
                        attempt,
                        options.max_retries,
                        description,
                        failed
                    );
                    failed_attempts.push(failed);
                }
            }
        }

        Err(LocatorError::ElementNotFound(description.to_string()))
    }

    async fn attempt<P: PageHandle>(
        &self,
        page: &P,
        description: &str,
        cached: Option<&str>,
    ) -> AttemptOutcome {
        let (candidate, from_cache) = match cached {
            Some(selector) => (selector.to_string(), true),
            None => {
                let html = match page.content().await {
                    Ok(html) => html,
                    Err(e) => return AttemptOutcome::PageError(e.to_string()),
                };
                let prompt = selector_prompt(description, &html);
                log::debug!("Querying model for \"{}\" ({} bytes of HTML)", description, html.len());

                match self.model.query(&prompt).await {
                    Err(e) => return AttemptOutcome::ModelError(e),
                    Ok(text) => match parse_answer(&text) {
                        ModelAnswer::Declined(reason) => {
                            return AttemptOutcome::ModelDeclined(reason)
                        }
                        ModelAnswer::Selector(selector) => (selector, false),
                    },
                }
            }
        };

        let matched = match page.has_match(&candidate).await {
            Ok(matched) => matched,
            Err(e) => {
                // typically a selector the browser refuses to parse
                log::debug!("Match check for '{}' failed: {}", candidate, e);
                false
            }
        };

        match (matched, from_cache) {
            (true, _) => AttemptOutcome::Resolved {
                selector: candidate,
                from_cache,
            },
            (false, true) => AttemptOutcome::CacheHitInvalid(candidate),
            (false, false) => AttemptOutcome::ValidationFailed(candidate),
        }
    }
}
