//! Recompiling templates while handlers keep serving.

use pagesmith::config::Page;
use pagesmith::server::Site;
use pagesmith::test_utils::{SiteFixture, StubFetcher, TestSite, init_test_logging};
use serde_json::json;
use std::sync::Arc;

use crate::common::{eventually, get};

async fn start(fixture: SiteFixture) -> (TestSite, Site) {
    init_test_logging(None);
    let test_site = fixture.build().unwrap();
    let config = test_site.config().await.unwrap();
    let site = Site::with_fetcher(&config, Arc::new(StubFetcher::new())).await.unwrap();
    (test_site, site)
}

async fn body(site: &Site, uri: &str) -> String {
    get(&site.router(), uri).await.body
}

#[tokio::test]
async fn test_reload_reaches_every_page_on_the_topic() {
    let fixture = SiteFixture::new()
        .template("article", "v1 {{title}}")
        .template("other", "untouched")
        .static_page("a", "/a", "article", json!({"title": "A"}))
        .static_page("b", "/b", "article", json!({"title": "B"}))
        .static_page("c", "/c", "other", json!({}));
    let (test_site, site) = start(fixture).await;
    let before = site.handler("c").unwrap().renderer();

    test_site.write_template("article", "v2 {{title}}").unwrap();
    let report = site.broker().reload(vec!["article".to_string()]).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.rebuilt.len(), 1);

    let a = site.handler("a").unwrap().clone();
    let b = site.handler("b").unwrap().clone();
    assert!(
        eventually(|| {
            let (a, b) = (a.clone(), b.clone());
            async move {
                let current = b.renderer();
                Arc::ptr_eq(&a.renderer(), &current)
                    && current.render_to_vec(&json!({})).unwrap() == b"v2 "
            }
        })
        .await,
        "handlers did not converge on the reloaded renderer"
    );

    assert_eq!(body(&site, "/a").await, "v2 A");
    assert_eq!(body(&site, "/b").await, "v2 B");
    assert!(Arc::ptr_eq(&before, &site.handler("c").unwrap().renderer()));
}

#[tokio::test]
async fn test_failed_reload_keeps_serving_previous_version() {
    let fixture = SiteFixture::new()
        .template("home", "<h1>{{title}}</h1>")
        .static_page("home", "/", "home", json!({"title": "ok"}));
    let (test_site, site) = start(fixture).await;

    test_site.write_template("home", "<h1>{{#title}}</h1>").unwrap();
    let report = site.broker().reload(Vec::new()).await.unwrap();
    assert!(!report.is_clean());
    assert_eq!(report.failed.len(), 1);
    assert!(report.rebuilt.is_empty());

    assert_eq!(body(&site, "/").await, "<h1>ok</h1>");

    test_site.write_template("home", "<h2>{{title}}</h2>").unwrap();
    assert!(site.broker().reload(Vec::new()).await.unwrap().is_clean());
    let site = &site;
    assert!(eventually(|| async move { body(site, "/").await == "<h2>ok</h2>" }).await);
}

#[tokio::test]
async fn test_partial_edits_apply_on_full_reload() {
    let fixture = SiteFixture::new()
        .partial("footer", "<footer>old</footer>")
        .template("home", "<p>{{title}}</p>{{> footer}}")
        .layout("main", "<body>{{{content}}}</body>")
        .page(Page {
            name: "home".to_string(),
            url_pattern: "/".to_string(),
            template: "home".to_string(),
            layout: Some("main".to_string()),
            extra: json!({"title": "hi"}),
            ..Default::default()
        });
    let (test_site, site) = start(fixture).await;
    assert_eq!(body(&site, "/").await, "<body><p>hi</p><footer>old</footer></body>");

    test_site.write_partial("footer", "<footer>new</footer>").unwrap();
    assert_eq!(body(&site, "/").await, "<body><p>hi</p><footer>old</footer></body>");

    site.broker().reload(Vec::new()).await.unwrap();
    let site = &site;
    assert!(
        eventually(|| async move { body(site, "/").await == "<body><p>hi</p><footer>new</footer></body>" })
            .await
    );
}

#[tokio::test]
async fn test_layout_reload() {
    let fixture = SiteFixture::new()
        .template("home", "{{title}}")
        .layout("main", "[{{{content}}}]")
        .page(Page {
            name: "home".to_string(),
            url_pattern: "/".to_string(),
            template: "home".to_string(),
            layout: Some("main".to_string()),
            extra: json!({"title": "hi"}),
            ..Default::default()
        });
    let (test_site, site) = start(fixture).await;

    test_site.write_layout("main", "<{{{content}}}>").unwrap();
    let report = site.broker().reload(vec!["main".to_string(), "missing".to_string()]).await.unwrap();
    assert_eq!(report.unknown, vec!["missing".to_string()]);

    let site = &site;
    assert!(eventually(|| async move { body(site, "/").await == "<hi>" }).await);
}
