//! Response generators driven by a stub backend.

use pagesmith::client::FetchError;
use pagesmith::config::Page;
use pagesmith::generator::{DecodeMode, GenerateError, PageRequest, ResponseGenerator, build_url};
use pagesmith::test_utils::StubFetcher;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

fn backend_page(backend: &str, is_array: bool) -> Page {
    Page {
        name: "items".to_string(),
        url_pattern: "/items".to_string(),
        template: "items".to_string(),
        backend: Some(backend.to_string()),
        is_array,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_array_backend_yields_ordered_sequence() {
    let stub = Arc::new(StubFetcher::new().respond("/api/x", 200, r#"[{"id":1}]"#));
    let generator = ResponseGenerator::for_page(&backend_page("/api/x", true), stub.clone());

    let data = generator.generate(&PageRequest::new()).await.unwrap();
    assert_eq!(data, json!([{"id": 1}]));
    assert_eq!(stub.calls(), vec!["/api/x".to_string()]);
}

#[tokio::test]
async fn test_server_error_is_classified_as_status() {
    let stub = Arc::new(StubFetcher::new().respond("/api/x", 500, "boom"));
    let generator = ResponseGenerator::for_page(&backend_page("/api/x", true), stub);

    let err = generator.generate(&PageRequest::new()).await.unwrap_err();
    assert!(matches!(err, GenerateError::Status { status: 500, .. }), "got {err:?}");
    assert_eq!(err.kind(), "status");
}

#[tokio::test]
async fn test_shape_mismatch_is_a_decode_error() {
    let stub = Arc::new(
        StubFetcher::new().respond("/api/list", 200, r#"{"id":1}"#).respond("/api/one", 200, "[1,2]"),
    );

    let as_array = ResponseGenerator::for_page(&backend_page("/api/list", true), stub.clone());
    assert_eq!(as_array.generate(&PageRequest::new()).await.unwrap_err().kind(), "decode");

    let as_object = ResponseGenerator::for_page(&backend_page("/api/one", false), stub);
    assert_eq!(as_object.generate(&PageRequest::new()).await.unwrap_err().kind(), "decode");
}

#[tokio::test]
async fn test_invalid_json_is_a_decode_error() {
    let stub = Arc::new(StubFetcher::new().respond("/api/x", 200, "<html>"));
    let generator = ResponseGenerator::backend("/api/x", stub, DecodeMode::Object);

    let err = generator.generate(&PageRequest::new()).await.unwrap_err();
    assert!(matches!(err, GenerateError::Decode { ref url, .. } if url == "/api/x"));
}

#[tokio::test]
async fn test_transport_failures_pass_through() {
    let stub = Arc::new(StubFetcher::new().fail(
        "/api/x",
        FetchError::Timeout {
            url: "/api/x".to_string(),
        },
    ));
    let generator = ResponseGenerator::backend("/api/x", stub, DecodeMode::Object);

    let err = generator.generate(&PageRequest::new()).await.unwrap_err();
    assert!(matches!(err, GenerateError::Transport(FetchError::Timeout { .. })));
    assert_eq!(err.kind(), "transport");
}

#[tokio::test]
async fn test_route_parameters_fill_the_backend_url() {
    let stub = Arc::new(StubFetcher::new().respond("/api/users/7/posts/42", 200, r#"{"title":"t"}"#));
    let generator = ResponseGenerator::backend("/api/users/:user/posts/:id", stub.clone(), DecodeMode::Object);

    let request = PageRequest::new().with_param("user", "7").with_param("id", "42");
    assert_eq!(generator.generate(&request).await.unwrap(), json!({"title": "t"}));
    assert_eq!(stub.call_count("/api/users/7/posts/42"), 1);
}

#[tokio::test]
async fn test_static_payload_never_fetches() {
    let stub = Arc::new(StubFetcher::new());
    let page = Page {
        extra: json!({"title": "About"}),
        ..Default::default()
    };
    let generator = ResponseGenerator::for_page(&page, stub.clone());

    let data = generator.generate(&PageRequest::new().with_param("ignored", "x")).await.unwrap();
    assert_eq!(data, json!({"title": "About"}));
    assert!(stub.calls().is_empty());
}

#[test]
fn test_build_url_matches_whole_names() {
    let params: HashMap<String, String> =
        [("id", "1"), ("idx", "2")].into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    assert_eq!(build_url("/a/:idx/b/:id", &params), "/a/2/b/1");
    assert_eq!(build_url("/a/:other", &params), "/a/:other");
}

#[test]
fn test_build_url_does_not_substitute_inserted_values() {
    let params: HashMap<String, String> =
        [("idx", ":id"), ("id", "7")].into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    assert_eq!(build_url("/a/:idx", &params), "/a/:id");
    assert_eq!(build_url("/a/:id/:idx", &params), "/a/7/:id");
}
