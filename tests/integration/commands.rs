//! Running the `pagesmith` binary.

use assert_cmd::Command;
use pagesmith::test_utils::{SiteFixture, TestSite};
use predicates::prelude::*;
use serde_json::json;
use std::fs;

fn blog() -> TestSite {
    SiteFixture::new()
        .template("home", "<h1>{{title}}</h1>")
        .layout("main", "<body>{{{content}}}</body>")
        .page(pagesmith::config::Page {
            name: "home".to_string(),
            url_pattern: "/".to_string(),
            template: "home".to_string(),
            layout: Some("main".to_string()),
            extra: json!({"title": "Blog"}),
            ..Default::default()
        })
        .build()
        .unwrap()
}

fn pagesmith(site: &TestSite) -> Command {
    let mut cmd = Command::cargo_bin("pagesmith").unwrap();
    cmd.arg("--config").arg(site.config_path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_render_prints_page() {
    let site = blog();
    pagesmith(&site)
        .args(["render", "home"])
        .assert()
        .success()
        .stdout(predicate::eq("<body><h1>Blog</h1></body>"));
}

#[test]
fn test_render_with_data_file() {
    let site = blog();
    let data = site.path().join("data.json");
    fs::write(&data, r#"{"title": "Override"}"#).unwrap();

    pagesmith(&site)
        .args(["render", "home", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Override</h1>"));
}

#[test]
fn test_render_unknown_page() {
    let site = blog();
    pagesmith(&site)
        .args(["render", "about"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Page 'about' is not configured"))
        .stderr(predicate::str::contains("pagesmith check"));
}

#[test]
fn test_check_json() {
    let site = blog();
    pagesmith(&site)
        .args(["check", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"))
        .stdout(predicate::str::contains("\"layouts\": 1"));
}

#[test]
fn test_check_fails_on_broken_template() {
    let site = blog();
    site.write_template("home", "{{#title}}").unwrap();
    pagesmith(&site)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("home"))
        .stderr(predicate::str::contains("failed to compile"));
}

#[test]
fn test_missing_config() {
    let dir = tempfile::TempDir::new().unwrap();
    Command::cargo_bin("pagesmith")
        .unwrap()
        .current_dir(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pagesmith.toml"))
        .stderr(predicate::str::contains("--config"));
}
