//! Page capability extension: single, multi and highlight


use fake_page::{FakeLocator, FakePage, ScriptedModel};
use robert_ai_locator::{AiPageExt, MemoryCacheStore, ResolveOptions, SelectorResolver};
use std::sync::Arc;
use std::time::Duration;

const URL: &str = "http://localhost/products";

fn resolver(model: ScriptedModel) -> Arc<SelectorResolver> {
    Arc::new(SelectorResolver::new(
        Arc::new(MemoryCacheStore::new()),
        Arc::new(model),
    ))
}

#[tokio::test]
async fn test_locator_is_bound_to_resolved_selector() {
    let page = FakePage::new(URL)
        .with_match("#add-to-cart", 1)
        .with_resolver(resolver(ScriptedModel::answering("#add-to-cart", 1)));

    let locator = page
        .locator("add to cart button", &ResolveOptions::default())
        .await
        .unwrap();

    assert_eq!(
        locator,
        FakeLocator {
            selector: "#add-to-cart".to_string(),
            index: 0
        }
    );
}

#[tokio::test]
async fn test_locator_all_returns_every_match_in_order() {
    let page = FakePage::new(URL)
        .with_match("li.product", 4)
        .with_resolver(resolver(ScriptedModel::answering("li.product", 1)));

    let locators = page
        .locator_all("product list items", &ResolveOptions::default())
        .await
        .unwrap();

    assert_eq!(locators.len(), 4);
    let indices: Vec<usize> = locators.iter().map(|l| l.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_locator_all_fails_once_elements_are_removed() {
    let page = FakePage::new(URL)
        .with_match("li.product", 2)
        .with_resolver(resolver(ScriptedModel::answering("li.product", 1)));
    let options = ResolveOptions::default();

    page.resolve("product list items", &options).await.unwrap();

    // cached selector no longer matches and the model has nothing better
    page.page().set_matches("li.product", 0);
    let result = page.locator_all("product list items", &options).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_highlight_runs_page_script_with_duration() {
    let page = FakePage::new(URL)
        .with_match("#add-to-cart", 1)
        .with_resolver(resolver(ScriptedModel::answering("#add-to-cart", 1)));

    let options = ResolveOptions::default().with_highlight_duration(Duration::from_millis(250));
    let highlighted = page.highlight("add to cart button", &options).await.unwrap();

    assert!(highlighted);
    let evaluations = page.page().evaluations();
    assert_eq!(evaluations.len(), 1);
    let (function, args) = &evaluations[0];
    assert!(function.contains("style.outline"));
    assert!(function.contains("zIndex"));
    assert_eq!(args[0], "#add-to-cart");
    assert_eq!(args[1], 250);
}

#[tokio::test]
async fn test_highlight_default_duration_is_three_seconds() {
    let page = FakePage::new(URL)
        .with_match("#add-to-cart", 1)
        .with_resolver(resolver(ScriptedModel::answering("#add-to-cart", 1)));

    page.highlight("add to cart button", &ResolveOptions::default())
        .await
        .unwrap();

    let evaluations = page.page().evaluations();
    assert_eq!(evaluations[0].1[1], 3000);
}

#[tokio::test]
async fn test_unresolvable_description_surfaces_error() {
    let page = FakePage::new(URL).with_resolver(resolver(ScriptedModel::new(vec![])));

    let err = page
        .locator("checkout button", &ResolveOptions::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("checkout button"));
    assert!(page.page().evaluations().is_empty());
}
