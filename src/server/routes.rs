//! HTTP glue between axum and page handlers.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use crate::generator::PageRequest;
use crate::handler::Handler;
use crate::templating::Renderer;

pub(crate) const HTML: &str = "text/html; charset=utf-8";
pub(crate) const TEXT: &str = "text/plain; charset=utf-8";
pub(crate) const REQUEST_ID: &str = "x-request-id";

/// Content that does not depend on the request.
#[derive(Debug, Clone)]
pub(crate) struct FixedPage {
    renderer: Renderer,
    content_type: &'static str,
}

impl FixedPage {
    pub(crate) fn new(bytes: impl Into<Arc<[u8]>>, content_type: &'static str) -> Self {
        Self {
            renderer: Renderer::fixed(bytes),
            content_type,
        }
    }

    pub(crate) fn respond(&self, status: StatusCode) -> Response {
        match self.renderer.render_to_vec(&Value::Null) {
            Ok(body) => (status, [(header::CONTENT_TYPE, self.content_type)], body).into_response(),
            Err(e) => {
                warn!(error = %e, "Failed to write fixed page");
                status.into_response()
            }
        }
    }
}

#[derive(Debug, Clone)]
struct PageState {
    handler: Arc<Handler>,
    server_error: FixedPage,
}

/// Translate a `:param` URL pattern into axum's `{param}` syntax.
///
/// A trailing `*name` segment becomes a catch-all `{*name}`.
pub fn axum_route(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn page_route(router: Router, handler: Arc<Handler>, server_error: FixedPage) -> Router {
    let route = axum_route(&handler.page().url_pattern);
    let state = PageState {
        handler,
        server_error,
    };
    router.route(&route, get(serve_page).with_state(state))
}

pub(crate) fn fixed_route(router: Router, path: &str, page: FixedPage) -> Router {
    router.route(
        path,
        get(move || {
            let page = page.clone();
            async move { page.respond(StatusCode::OK) }
        }),
    )
}

async fn serve_page(
    State(state): State<PageState>,
    params: Option<Path<HashMap<String, String>>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let request = PageRequest {
        params: params.map(|Path(params)| params).unwrap_or_default(),
        query,
    };
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("request", id = %request_id, page = %state.handler.page().name);

    let result = state.handler.handle(&request).instrument(span.clone()).await;
    let mut response = match result {
        Ok(page) => {
            span.in_scope(|| debug!(bytes = page.body.len(), "Rendered"));
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, HTML.to_string()), (header::CACHE_CONTROL, page.cache_control)],
                page.body,
            )
                .into_response()
        }
        Err(_) => state.server_error.respond(StatusCode::INTERNAL_SERVER_ERROR),
    };
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    response
}
