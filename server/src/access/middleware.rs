//! Axum middleware enforcing sales channel access on storefront routes.
//!
//! Reads the requested channel ids, resolves what the caller may see, and
//! rewrites the request so downstream handlers only ever receive enforced ids.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::api::AppState;
use crate::auth::{AuthCustomer, ErrorResponse};

use super::error::AccessError;
use super::filter::{enforce, ChannelParamMode};
use super::models::{AccessRequest, ChannelId};
use super::params;
use super::resolver::resolve_authorized_channels;

/// Header carrying the publishable API key.
pub const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

/// Largest JSON body the filter will buffer to read the channel field.
const MAX_FILTER_BODY_BYTES: usize = 1024 * 1024;

/// Per-route channel filtering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelScope {
    /// Shape of the channel parameter downstream expects.
    pub mode: ChannelParamMode,
    /// Collection key of the route's list response (e.g. `products`).
    pub collection: &'static str,
}

impl ChannelScope {
    #[must_use]
    pub const fn array(collection: &'static str) -> Self {
        Self {
            mode: ChannelParamMode::Array,
            collection,
        }
    }

    #[must_use]
    pub const fn scalar(collection: &'static str) -> Self {
        Self {
            mode: ChannelParamMode::Scalar,
            collection,
        }
    }
}

impl Default for ChannelScope {
    fn default() -> Self {
        Self::array("products")
    }
}

/// Channel ids the request was enforced to, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcedChannels(pub Vec<ChannelId>);

/// Errors raised while filtering a request.
#[derive(Debug, Error)]
pub enum ChannelFilterError {
    /// Authorized set could not be resolved.
    #[error(transparent)]
    Resolution(#[from] AccessError),

    /// JSON body could not be read or parsed.
    #[error("Invalid request body")]
    InvalidBody,

    /// Rewritten request could not be rebuilt.
    #[error("Failed to rewrite request: {0}")]
    Rewrite(String),
}

impl IntoResponse for ChannelFilterError {
    fn into_response(self) -> Response {
        match self {
            Self::Resolution(err) => err.into_response(),
            Self::InvalidBody => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "INVALID_BODY".to_string(),
                    message: self.to_string(),
                }),
            )
                .into_response(),
            Self::Rewrite(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "INTERNAL_ERROR".to_string(),
                    message: "Internal server error while filtering sales channels".to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// Whether the body is JSON: `application/json` or any `+json` media type,
/// compared case-insensitively.
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase())
        .is_some_and(|essence| essence == "application/json" || essence.ends_with("+json"))
}

fn publishable_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(PUBLISHABLE_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Empty list response in the storefront's list shape.
fn empty_listing(collection: &str) -> Response {
    let mut body = serde_json::Map::new();
    body.insert(collection.to_string(), Value::Array(Vec::new()));
    body.insert("count".to_string(), Value::from(0));
    body.insert("offset".to_string(), Value::from(0));
    body.insert("limit".to_string(), Value::from(0));
    (StatusCode::OK, Json(Value::Object(body))).into_response()
}

/// Whether `path` addresses the route's collection rather than one item in it.
fn is_collection_path(path: &str, collection: &str) -> bool {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .is_some_and(|last| last == collection)
}

/// Response when nothing is authorized: an empty listing for the collection,
/// `404` for anything addressing a single item.
fn nothing_authorized(path: &str, collection: &str) -> Response {
    if is_collection_path(path, collection) {
        return empty_listing(collection);
    }

    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "NOT_FOUND".to_string(),
            message: "Not found".to_string(),
        }),
    )
        .into_response()
}

/// Middleware restricting a request to the sales channels its caller may use.
///
/// Apply after `authenticate_customer` so the customer is already known:
///
/// ```ignore
/// Router::new()
///     .route("/store/products", get(handler))
///     .layer(from_fn_with_state(state.clone(), filter_sales_channels))
///     .layer(from_fn(with_channel_scope(ChannelScope::array("products"))))
///     .layer(from_fn_with_state(state.clone(), authenticate_customer))
/// ```
///
/// # Behavior
///
/// - If sales channels are disabled by configuration, requests pass through.
/// - Requested ids come from the JSON body field when present, otherwise from
///   the query string.
/// - The enforced list replaces the query parameter (and the body field when
///   the body carried one) and is stored as [`EnforcedChannels`].
/// - If nothing is authorized, responds with an empty listing (or `404` for
///   item paths) without calling downstream.
/// - If resolution fails, responds `500` and never calls downstream.
#[tracing::instrument(skip(state, request, next), fields(path = %request.uri().path()))]
pub async fn filter_sales_channels(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ChannelFilterError> {
    if !state.config.sales_channels_enabled {
        return Ok(next.run(request).await);
    }

    let scope = request
        .extensions()
        .get::<ChannelScope>()
        .copied()
        .unwrap_or_default();
    let customer_id = request
        .extensions()
        .get::<AuthCustomer>()
        .map(|customer| customer.id.clone());
    let credential = publishable_key(request.headers());

    let (mut parts, body) = request.into_parts();

    let (body, json) = if is_json(&parts.headers) {
        let bytes = to_bytes(body, MAX_FILTER_BODY_BYTES)
            .await
            .map_err(|_| ChannelFilterError::InvalidBody)?;
        let json = if bytes.is_empty() {
            None
        } else {
            Some(
                serde_json::from_slice::<Value>(&bytes)
                    .map_err(|_| ChannelFilterError::InvalidBody)?,
            )
        };
        (Body::from(bytes), json)
    } else {
        (body, None)
    };

    let requested = json
        .as_ref()
        .and_then(params::requested_from_body)
        .unwrap_or_else(|| params::requested_from_query(parts.uri.query()));

    let access_request = AccessRequest::new(customer_id, credential);
    let authorized = resolve_authorized_channels(
        state.channel_store.as_ref(),
        &access_request,
        &state.config.access_policy,
        state.config.access_store_timeout,
    )
    .await
    .map_err(|e| {
        error!(
            customer_id = ?access_request.customer_id,
            error = %e,
            "Failed to resolve sales channels"
        );
        e
    })?;

    let enforced = enforce(&requested, &authorized, scope.mode.is_array());

    debug!(
        requested = ?requested,
        enforced = ?enforced,
        "Enforced sales channels"
    );

    if enforced.is_empty() {
        if !requested.is_empty() {
            warn!(requested = ?requested, "No authorized sales channels for request");
        }
        return Ok(nothing_authorized(parts.uri.path(), scope.collection));
    }

    parts.uri = params::rewrite_uri(&parts.uri, &enforced, scope.mode)
        .map_err(|e| ChannelFilterError::Rewrite(e.to_string()))?;

    let body = match json {
        Some(mut value) if value.get(params::CHANNEL_PARAM).is_some() => {
            params::rewrite_body(&mut value, &enforced, scope.mode);
            let bytes = serde_json::to_vec(&value)
                .map_err(|e| ChannelFilterError::Rewrite(e.to_string()))?;
            parts.headers.remove(CONTENT_LENGTH);
            Body::from(bytes)
        }
        _ => body,
    };

    parts.extensions.insert(EnforcedChannels(enforced));

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Sets the channel scope for `filter_sales_channels`.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .route("/store/products", get(handler))
///     .layer(from_fn_with_state(state.clone(), filter_sales_channels))
///     .layer(from_fn(with_channel_scope(ChannelScope::array("products"))));
/// ```
pub fn with_channel_scope(
    scope: ChannelScope,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Response> + Send>>
       + Clone
       + Send
       + 'static {
    move |mut request: Request, next: Next| {
        request.extensions_mut().insert(scope);
        Box::pin(async move { next.run(request).await })
    }
}
