//! Natural-language locators on top of a [`PageHandle`]

use crate::config::ResolveOptions;
use crate::error::Result;
use crate::page::PageHandle;
use crate::resolver::SelectorResolver;
use std::sync::Arc;

/// Outlines the first match of a selector, waits, then restores its styling.
/// Resolves to `false` when nothing matches.
pub const HIGHLIGHT_FUNCTION: &str = r#"(selector, durationMs) => new Promise((resolve) => {
    const el = document.querySelector(selector);
    if (!el) {
        resolve(false);
        return;
    }
    const originalOutline = el.style.outline;
    const originalZIndex = el.style.zIndex;
    el.style.outline = '3px solid red';
    el.style.zIndex = '9999';
    setTimeout(() => {
        el.style.outline = originalOutline;
        el.style.zIndex = originalZIndex;
        resolve(true);
    }, durationMs);
})"#;

/// A page whose elements can be found by description
pub struct AiPage<P> {
    page: P,
    resolver: Arc<SelectorResolver>,
}

impl<P: PageHandle> AiPage<P> {
    pub fn new(page: P, resolver: Arc<SelectorResolver>) -> Self {
        Self { page, resolver }
    }

    /// The wrapped page
    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn into_inner(self) -> P {
        self.page
    }

    /// Validated selector for `description`
    pub async fn resolve(&self, description: &str, options: &ResolveOptions) -> Result<String> {
        self.resolver.resolve(&self.page, description, options).await
    }

    /// Locator bound to the selector resolved for `description`
    pub async fn locator(&self, description: &str, options: &ResolveOptions) -> Result<P::Locator> {
        let selector = self.resolve(description, options).await?;
        Ok(self.page.locator(&selector))
    }

    /// Every element currently matching the resolved selector, in document order
    ///
    /// May be empty if the page changed after the selector was validated.
    pub async fn locator_all(
        &self,
        description: &str,
        options: &ResolveOptions,
    ) -> Result<Vec<P::Locator>> {
        let selector = self.resolve(description, options).await?;
        self.page.locator_all(&selector).await
    }

    /// Outline the element for `options.highlight_duration`, then restore it
    ///
    /// Returns whether an element was highlighted; no current match is not an error.
    pub async fn highlight(&self, description: &str, options: &ResolveOptions) -> Result<bool> {
        let selector = self.resolve(description, options).await?;
        let duration_ms = options.highlight_duration.as_millis() as u64;

        let result = self
            .page
            .evaluate_function(
                HIGHLIGHT_FUNCTION,
                vec![
                    serde_json::Value::from(selector.as_str()),
                    serde_json::Value::from(duration_ms),
                ],
            )
            .await?;

        let highlighted = result.as_bool().unwrap_or(false);
        if !highlighted {
            log::debug!("Nothing to highlight for '{}'", selector);
        }
        Ok(highlighted)
    }
}

/// Attach a resolver to any page
pub trait AiPageExt: PageHandle + Sized {
    fn with_resolver(self, resolver: Arc<SelectorResolver>) -> AiPage<Self> {
        AiPage::new(self, resolver)
    }
}

impl<P: PageHandle> AiPageExt for P {}
