//! Catalog upstream forwarding.
//!
//! Storefront routes are proxied to the catalog service after the channel
//! filter has rewritten them. The gate never serves catalog data itself.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{debug, error};

use crate::access::EnforcedChannels;
use crate::auth::ErrorResponse;

use super::AppState;

/// Largest request body forwarded upstream.
const MAX_FORWARD_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Headers scoped to a single connection, never forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Errors raised while proxying to the catalog.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Request body could not be read")]
    InvalidBody,

    #[error("Unsupported method")]
    InvalidMethod,

    #[error("Catalog upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Catalog upstream returned an invalid response")]
    InvalidResponse,
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::InvalidBody => (StatusCode::BAD_REQUEST, "INVALID_BODY"),
            Self::InvalidMethod => (StatusCode::METHOD_NOT_ALLOWED, "INVALID_METHOD"),
            Self::Request(_) | Self::InvalidResponse => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Build the upstream URL for a request path and query.
fn upstream_url(base: &str, path_and_query: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path_and_query)
}

/// Forward a request to the catalog upstream and relay its response.
#[tracing::instrument(skip(state, request), fields(path = %request.uri().path()))]
pub async fn forward(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, UpstreamError> {
    let (parts, body) = request.into_parts();

    if let Some(EnforcedChannels(channels)) = parts.extensions.get::<EnforcedChannels>() {
        debug!(enforced = ?channels, "Forwarding filtered request");
    }

    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
    let url = upstream_url(&state.config.catalog_upstream_url, &path_and_query);

    let method = reqwest::Method::from_bytes(parts.method.as_str().as_bytes())
        .map_err(|_| UpstreamError::InvalidMethod)?;
    let bytes = to_bytes(body, MAX_FORWARD_BODY_BYTES)
        .await
        .map_err(|_| UpstreamError::InvalidBody)?;

    let mut upstream = state.http.request(method, &url);
    for (name, value) in &parts.headers {
        if is_hop_by_hop(name.as_str()) {
            continue;
        }
        upstream = upstream.header(name.as_str(), value.as_bytes());
    }
    if !bytes.is_empty() {
        upstream = upstream.body(bytes);
    }

    let upstream_response = upstream.send().await.map_err(|e| {
        error!(url = %url, error = %e, "Catalog upstream request failed");
        UpstreamError::Request(e)
    })?;

    let status = StatusCode::from_u16(upstream_response.status().as_u16())
        .map_err(|_| UpstreamError::InvalidResponse)?;
    let headers: Vec<(HeaderName, HeaderValue)> = upstream_response
        .headers()
        .iter()
        .filter(|(name, _)| !is_hop_by_hop(name.as_str()))
        .filter_map(|(name, value)| {
            Some((
                HeaderName::from_bytes(name.as_str().as_bytes()).ok()?,
                HeaderValue::from_bytes(value.as_bytes()).ok()?,
            ))
        })
        .collect();
    let body = upstream_response.bytes().await?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().extend(headers);

    Ok(response)
}
