//! [`PageHandle`] over a chromiumoxide page

use crate::error::{LocatorError, Result};
use crate::page::PageHandle;
use async_trait::async_trait;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use serde_json::Value;

const MATCH_COUNT_FUNCTION: &str = "(selector) => document.querySelectorAll(selector).length";

/// Build `(function)(arg0, arg1, ...)` with JSON-encoded arguments
pub(crate) fn call_expression(function: &str, args: &[Value]) -> String {
    let args = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("({})({})", function.trim(), args)
}

/// A Chrome tab
#[derive(Debug, Clone)]
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// The underlying chromiumoxide page
    pub fn inner(&self) -> &Page {
        &self.page
    }

    async fn match_count(&self, selector: &str) -> Result<usize> {
        let count = self
            .evaluate_function(MATCH_COUNT_FUNCTION, vec![Value::from(selector)])
            .await?;
        Ok(count.as_u64().unwrap_or(0) as usize)
    }
}

#[async_trait]
impl PageHandle for ChromePage {
    type Locator = ElementLocator;

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(|e| LocatorError::Other(e.to_string()))?
            .ok_or(LocatorError::NoPage)
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| LocatorError::Other(format!("Failed to read page HTML: {}", e)))
    }

    async fn has_match(&self, selector: &str) -> Result<bool> {
        Ok(self.match_count(selector).await? > 0)
    }

    async fn evaluate_function(&self, function: &str, args: Vec<Value>) -> Result<Value> {
        let params = EvaluateParams::builder()
            .expression(call_expression(function, &args))
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(LocatorError::Script)?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| LocatorError::Script(e.to_string()))?;

        Ok(result.into_value().unwrap_or(Value::Null))
    }

    fn locator(&self, selector: &str) -> ElementLocator {
        ElementLocator {
            page: self.page.clone(),
            selector: selector.to_string(),
            index: 0,
        }
    }

    async fn locator_all(&self, selector: &str) -> Result<Vec<ElementLocator>> {
        let count = self.match_count(selector).await?;
        Ok((0..count)
            .map(|index| ElementLocator {
                page: self.page.clone(),
                selector: selector.to_string(),
                index,
            })
            .collect())
    }
}

/// Lazily-resolved element: the `index`-th match of `selector`
#[derive(Debug, Clone)]
pub struct ElementLocator {
    page: Page,
    selector: String,
    index: usize,
}

impl ElementLocator {
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Position among the selector's matches, in document order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Look up the element now
    pub async fn element(&self) -> Result<Element> {
        self.page
            .find_elements(self.selector.as_str())
            .await
            .map_err(|_e| LocatorError::ElementNotFound(self.selector.clone()))?
            .into_iter()
            .nth(self.index)
            .ok_or_else(|| LocatorError::ElementNotFound(self.selector.clone()))
    }

    pub async fn click(&self) -> Result<()> {
        self.element().await?.click().await?;
        Ok(())
    }

    pub async fn inner_text(&self) -> Result<String> {
        let text = self
            .element()
            .await?
            .inner_text()
            .await
            .map_err(|_e| LocatorError::ElementNotFound(self.selector.clone()))?
            .unwrap_or_default();
        Ok(text)
    }

    pub async fn type_str(&self, text: &str) -> Result<()> {
        self.element().await?.click().await?.type_str(text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_expression_encodes_arguments() {
        let expr = call_expression(
            "(a, b) => a + b",
            &[Value::from("it's \"quoted\""), Value::from(3000u64)],
        );
        assert_eq!(expr, r#"((a, b) => a + b)("it's \"quoted\"", 3000)"#);
    }

    #[test]
    fn test_call_expression_without_arguments() {
        assert_eq!(call_expression(" () => 1 ", &[]), "(() => 1)()");
    }
}
