//! Prompt template for selector generation

/// Prefix the model uses when it cannot produce a selector
pub const ERROR_PREFIX: &str = "ERROR:";

/// Generate a prompt asking for one CSS selector matching `description`
pub fn selector_prompt(description: &str, html: &str) -> String {
    format!(
        r#"You are an expert in web page structure and CSS selectors.

Given the HTML of a web page and a description of one element on it, return a
CSS selector that matches that element.

ELEMENT DESCRIPTION: {description}

RULES:

1. Respond with the CSS selector only: no explanation, no quotes, no markdown
2. The selector must be valid for document.querySelector()
3. Prefer stable attributes (id, name, data-testid, aria-label) over position
4. If no element on the page fits the description, respond with
   {ERROR_PREFIX} followed by a short explanation

PAGE HTML:

{html}
"#
    )
}

/// What the model said
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelAnswer {
    /// Candidate selector, not yet validated against the page
    Selector(String),
    /// The model explicitly declined, with its reason
    Declined(String),
}

/// Interpret model text as a selector or an explicit refusal
///
/// Markdown code fences and surrounding backticks are stripped.
pub fn parse_answer(response: &str) -> ModelAnswer {
    let cleaned = clean_response(response);

    if let Some(reason) = cleaned.strip_prefix(ERROR_PREFIX) {
        return ModelAnswer::Declined(reason.trim().to_string());
    }
    if cleaned.is_empty() {
        return ModelAnswer::Declined("empty response".to_string());
    }

    ModelAnswer::Selector(cleaned)
}

fn clean_response(response: &str) -> String {
    let trimmed = response.trim();

    let unfenced = if let Some(rest) = trimmed.strip_prefix("```") {
        // drop an optional language tag on the opening fence line
        let body = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest,
        };
        body.strip_suffix("```").unwrap_or(body)
    } else {
        trimmed
    };

    unfenced.trim().trim_matches('`').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_description_and_html() {
        let prompt = selector_prompt("the login button", "<button id=\"go\">Go</button>");
        assert!(prompt.contains("ELEMENT DESCRIPTION: the login button"));
        assert!(prompt.contains("<button id=\"go\">Go</button>"));
        assert!(prompt.contains(ERROR_PREFIX));
    }

    #[test]
    fn test_parse_plain_selector() {
        assert_eq!(
            parse_answer("  #login  "),
            ModelAnswer::Selector("#login".to_string())
        );
    }

    #[test]
    fn test_parse_fenced_selector() {
        assert_eq!(
            parse_answer("```css\nbutton[type=\"submit\"]\n```"),
            ModelAnswer::Selector("button[type=\"submit\"]".to_string())
        );
        assert_eq!(
            parse_answer("`a.nav`"),
            ModelAnswer::Selector("a.nav".to_string())
        );
    }

    #[test]
    fn test_parse_error_answer() {
        assert_eq!(
            parse_answer("ERROR: no such element"),
            ModelAnswer::Declined("no such element".to_string())
        );
        assert!(matches!(parse_answer("   "), ModelAnswer::Declined(_)));
    }
}
