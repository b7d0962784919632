//! Configuration parsing and validation.

use pagesmith::config::{Config, ConfigError, Page, parse_duration};
use std::time::Duration;

const TEMPLATES: &str = r#"
[templates]
post = "templates/post.hbs"
posts = "templates/posts.hbs"

[layouts]
main = "layouts/main.hbs"
"#;

fn parse(pages: &str) -> anyhow::Result<Config> {
    Config::from_toml_str(&format!("{TEMPLATES}\n{pages}"), "/site")
}

fn config_error(pages: &str) -> ConfigError {
    parse(pages).unwrap_err().downcast::<ConfigError>().unwrap()
}

#[test]
fn test_page_cache_control() {
    let page = |ttl: &str| Page {
        name: "p".to_string(),
        cache_ttl: ttl.to_string(),
        ..Default::default()
    };

    assert_eq!(page("").cache_control(), "public, max-age=3600");
    assert_eq!(page("90s").cache_control(), "public, max-age=90");
    assert_eq!(page("1.5h").cache_control(), "public, max-age=5400");
    assert_eq!(page("0").cache_control(), "public, max-age=0");
    assert_eq!(page("soon").cache_control(), "public, max-age=3600");
}

#[test]
fn test_durations() {
    assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
    assert!(parse_duration("-1s").is_err());
    assert!(parse_duration("10").is_err());
}

#[test]
fn test_valid_site() {
    let config = parse(
        r#"
[[pages]]
name = "post"
url_pattern = "/posts/:id"
template = "post"
layout = "main"
backend = "https://api.example.com/posts/:id"

[[pages]]
name = "posts"
url_pattern = "/posts"
template = "posts"
backend = "https://api.example.com/posts"
is_array = true
"#,
    )
    .unwrap();

    assert_eq!(config.pages.len(), 2);
    let post = config.page("post").unwrap();
    assert!(post.is_dynamic());
    assert_eq!(post.topic(), config.page("post").unwrap().topic());
    assert_ne!(post.topic(), config.page("posts").unwrap().topic());
    assert!(config.page("posts").unwrap().is_array);
    assert_eq!(
        config.resolve_path(&config.templates["post"]),
        std::path::Path::new("/site/templates/post.hbs")
    );
}

#[test]
fn test_unknown_template_suggests_closest_name() {
    let err = config_error(
        r#"
[[pages]]
name = "post"
url_pattern = "/posts/:id"
template = "psot"
"#,
    );
    assert!(matches!(err, ConfigError::UnknownTemplate { ref template, .. } if template == "psot"));
    assert_eq!(err.suggestion(), Some("post"));
}

#[test]
fn test_unknown_layout() {
    let err = config_error(
        r#"
[[pages]]
name = "post"
url_pattern = "/posts"
template = "post"
layout = "mian"
"#,
    );
    assert!(matches!(err, ConfigError::UnknownLayout { .. }));
    assert_eq!(err.suggestion(), Some("main"));
}

#[test]
fn test_route_conflicts() {
    let err = config_error(
        r#"
[[pages]]
name = "a"
url_pattern = "/same"
template = "post"

[[pages]]
name = "b"
url_pattern = "/same"
template = "post"
"#,
    );
    assert_eq!(
        err,
        ConfigError::DuplicateRoute {
            pattern: "/same".to_string(),
            existing: "/same".to_string()
        }
    );

    let err = config_error(
        r#"
[[pages]]
name = "a"
url_pattern = "relative"
template = "post"
"#,
    );
    assert!(matches!(err, ConfigError::InvalidRoute { .. }));
}

#[test]
fn test_routes_differing_only_in_parameter_names_conflict() {
    let err = config_error(
        r#"
[[pages]]
name = "a"
url_pattern = "/posts/:id"
template = "post"

[[pages]]
name = "b"
url_pattern = "/posts/:slug"
template = "post"
"#,
    );
    assert_eq!(
        err,
        ConfigError::DuplicateRoute {
            pattern: "/posts/:slug".to_string(),
            existing: "/posts/:id".to_string()
        }
    );

    let ok = parse(
        r#"
[[pages]]
name = "a"
url_pattern = "/posts/:id"
template = "post"

[[pages]]
name = "b"
url_pattern = "/posts/:id/comments"
template = "post"
"#,
    );
    assert!(ok.is_ok(), "{:?}", ok.err());
}

#[test]
fn test_static_txt_paths_must_be_absolute() {
    let err = config_error(
        r#"
[static_txt]
"robots.txt" = "robots.txt"
"#,
    );
    assert_eq!(
        err,
        ConfigError::InvalidStaticPath {
            path: "robots.txt".to_string()
        }
    );

    let err = config_error(
        r#"
[static_txt]
"/robots.txt" = "robots.txt"

[[pages]]
name = "a"
url_pattern = "/robots.txt"
template = "post"
"#,
    );
    assert!(matches!(err, ConfigError::DuplicateRoute { .. }));
}

#[test]
fn test_backend_placeholders_must_be_captured() {
    let err = config_error(
        r#"
[[pages]]
name = "post"
url_pattern = "/posts"
template = "post"
backend = "https://api.example.com/posts/:id"
"#,
    );
    assert_eq!(
        err,
        ConfigError::UnboundParameter {
            page: "post".to_string(),
            param: "id".to_string()
        }
    );
}
