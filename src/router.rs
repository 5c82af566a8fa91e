//! The request router: pass-through vs. rewrite-and-forward.
//!
//! Every request a page routes through the worker lands here exactly
//! once. Classification looks only at the method and URL path, never
//! the body, so a pass-through body can be streamed to the network
//! without buffering. Only once the rewrite branch is chosen is the
//! body consumed.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use reqwest::Url;

use crate::config::ConfigStore;

/// Path suffix of the submission endpoint. Matched literally; no
/// pattern language.
pub const ENTRIES_PATH: &str = "/entries";

/// Outcome of classifying one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Forward to the original target unchanged.
    Passthrough,
    /// Re-target the configured backend with credentials stripped.
    Rewrite,
}

/// Decides how a request is routed from its method and path alone.
pub fn classify(method: &Method, path: &str) -> RouteDecision {
    if method == Method::POST && path.ends_with(ENTRIES_PATH) {
        RouteDecision::Rewrite
    } else {
        RouteDecision::Passthrough
    }
}

/// Forwards intercepted requests, rewriting submissions to the
/// configured backend.
pub struct RequestRouter {
    config: Arc<ConfigStore>,
    origin: Url,
    http: reqwest::Client,
}

impl RequestRouter {
    /// Creates a router fronting `origin` for pass-through traffic.
    pub fn new(config: Arc<ConfigStore>, origin: Url) -> Self {
        Self {
            config,
            origin,
            http: reqwest::Client::new(),
        }
    }

    /// Routes one intercepted request and returns the upstream's
    /// response. Forwarding failures surface as 502; there is no
    /// retry and no fallback to pass-through.
    pub async fn route(&self, req: Request) -> Response {
        let (parts, body) = req.into_parts();
        match classify(&parts.method, parts.uri.path()) {
            RouteDecision::Passthrough => {
                tracing::debug!(method = %parts.method, uri = %parts.uri, "pass-through");
                self.passthrough(parts.method, &parts.uri, parts.headers, body)
                    .await
            }
            RouteDecision::Rewrite => {
                tracing::debug!(method = %parts.method, uri = %parts.uri, "rewrite");
                self.rewrite(parts.method, &parts.uri, parts.headers, body)
                    .await
            }
        }
    }

    /// Forwards the request to the origin exactly as the page issued
    /// it, streaming the body through without buffering.
    async fn passthrough(
        &self,
        method: Method,
        uri: &Uri,
        headers: HeaderMap,
        body: Body,
    ) -> Response {
        // Copy the path and query onto the origin verbatim. Resolving
        // the path as a relative reference instead would let a path
        // starting with `//` re-target another host with the page's
        // credentials attached.
        let mut target = self.origin.clone();
        target.set_path(uri.path());
        target.set_query(uri.query());

        let mut request = self
            .http
            .request(method, target)
            .body(reqwest::Body::wrap_stream(body.into_data_stream()));
        for (name, value) in &headers {
            // Framing and hop-by-hop headers are regenerated for the
            // new connection; everything else, credentials included,
            // travels untouched.
            if *name == header::HOST
                || *name == header::CONTENT_LENGTH
                || *name == header::TRANSFER_ENCODING
                || *name == header::CONNECTION
            {
                continue;
            }
            request = request.header(name, value);
        }

        match request.send().await {
            Ok(upstream) => upstream_response(upstream),
            Err(e) => {
                tracing::warn!(?e, "pass-through forward failed");
                bad_gateway(e)
            }
        }
    }

    /// Buffers the body and re-issues the request against the backend
    /// currently held by the configuration store.
    async fn rewrite(&self, method: Method, uri: &Uri, headers: HeaderMap, body: Body) -> Response {
        // Interception-time read: an in-flight request always targets
        // the freshest known backend, not a value frozen earlier.
        let server = self.config.get();
        let Some(target) = rewrite_target(self.origin.scheme(), &server, uri) else {
            tracing::warn!(server = %server, "configured server yields an unparsable target");
            return bad_gateway(format!("invalid server address {server:?}"));
        };

        let bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(?e, "failed to read submission body");
                return (StatusCode::BAD_REQUEST, format!("unreadable body: {e}"))
                    .into_response();
            }
        };

        // The rewritten request carries only the body and its content
        // type. Cookies and authorization never reach the new
        // destination.
        let mut request = self.http.request(method, target).body(bytes);
        if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
            request = request.header(header::CONTENT_TYPE, content_type);
        }

        match request.send().await {
            Ok(upstream) => upstream_response(upstream),
            Err(e) => {
                tracing::warn!(?e, server = %server, "rewrite forward failed");
                bad_gateway(e)
            }
        }
    }
}

/// Builds the rewritten target: the original URL with its host
/// replaced by `server`. A scheme-qualified `server` replaces the
/// scheme as well.
fn rewrite_target(origin_scheme: &str, server: &str, uri: &Uri) -> Option<Url> {
    let base = if server.contains("://") {
        format!("{}{}", server.trim_end_matches('/'), uri.path())
    } else {
        format!(
            "{}://{}{}",
            origin_scheme,
            server.trim_end_matches('/'),
            uri.path()
        )
    };
    let full = match uri.query() {
        Some(query) => format!("{base}?{query}"),
        None => base,
    };
    Url::parse(&full).ok()
}

/// Translates the upstream reply into the response handed back to the
/// page, streaming the body through.
fn upstream_response(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    headers.remove(header::TRANSFER_ENCODING);
    headers.remove(header::CONNECTION);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn bad_gateway(err: impl std::fmt::Display) -> Response {
    (StatusCode::BAD_GATEWAY, format!("proxy error: {err}")).into_response()
}
