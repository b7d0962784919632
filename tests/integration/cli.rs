//! `check` results and error presentation for broken sites.

use pagesmith::cli::check_config;
use pagesmith::core::{PagesmithError, user_friendly_error};
use pagesmith::server::Site;
use pagesmith::test_utils::{SiteFixture, StubFetcher};
use serde_json::json;
use std::fs;
use std::sync::Arc;

#[tokio::test]
async fn test_check_lists_pages_and_every_error() {
    let site = SiteFixture::new()
        .template("home", "<h1>{{title}}</h1>")
        .template("post", "{{> byline}}")
        .template("broken", "{{#open}}")
        .layout("main", "<main>{{{content}}}</main>")
        .static_page("home", "/", "home", json!({"title": "hi"}))
        .backend_page("post", "/posts/:id", "post", "http://api/posts/:id")
        .build()
        .unwrap();
    let config = site.config().await.unwrap();

    let results = check_config(&config);
    assert!(!results.valid);
    assert_eq!(results.templates, 1);
    assert_eq!(results.layouts, 1);
    assert_eq!(results.errors.len(), 2);
    assert!(results.errors.iter().any(|e| e.contains("'broken'")));
    assert!(results.errors.iter().any(|e| e.contains("byline")));

    let post = results.pages.iter().find(|page| page.name == "post").unwrap();
    assert_eq!(post.route, "/posts/{id}");
    assert_eq!(post.source, "http://api/posts/:id");
    assert_eq!(results.pages.iter().find(|page| page.name == "home").unwrap().source, "static");

    site.write_partial("byline", "by {{author}}").unwrap();
    site.write_template("broken", "{{#open}}{{/open}}").unwrap();
    let results = check_config(&config);
    assert!(results.valid, "unexpected errors: {:?}", results.errors);
    assert_eq!(results.templates, 3);
}

#[tokio::test]
async fn test_missing_partial_is_explained() {
    let site = SiteFixture::new()
        .template("home", "{{> header}}")
        .static_page("home", "/", "home", json!({}))
        .build()
        .unwrap();
    let config = site.config().await.unwrap();

    let err = Site::with_fetcher(&config, Arc::new(StubFetcher::new())).await.unwrap_err();
    let context = user_friendly_error(err);
    assert!(matches!(context.error, PagesmithError::TemplateError { .. }));
    assert!(context.error.to_string().contains("header"));
    assert!(context.suggestion.unwrap().contains("partials_dir"));
}

#[tokio::test]
async fn test_typo_in_config_suggests_name() {
    let site = SiteFixture::new()
        .template("home", "x")
        .static_page("home", "/", "home", json!({}))
        .build()
        .unwrap();
    let text = fs::read_to_string(site.config_path()).unwrap();
    fs::write(site.config_path(), text.replace("template = \"home\"", "template = \"hmoe\"")).unwrap();

    let context = user_friendly_error(site.config().await.unwrap_err());
    assert!(matches!(context.error, PagesmithError::InvalidConfig { .. }));
    assert_eq!(context.suggestion.as_deref(), Some("Did you mean 'home'?"));
}

#[tokio::test]
async fn test_malformed_toml() {
    let site = SiteFixture::new().build().unwrap();
    fs::write(site.config_path(), "[[pages]\nname = ").unwrap();

    let context = user_friendly_error(site.config().await.unwrap_err());
    assert!(matches!(context.error, PagesmithError::ConfigParseError { .. }));
}
