//! Authentication Middleware

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::access::CustomerId;
use crate::api::AppState;

use super::error::{AuthError, AuthResult};
use super::jwt::{validate_access_token, ActorType, Claims};

/// Authenticated storefront customer injected into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCustomer {
    /// Customer ID.
    pub id: CustomerId,
}

/// Authenticated admin user injected into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    /// Admin user ID.
    pub id: String,
}

/// Extract the Bearer token, if an Authorization header is present.
fn bearer_token(headers: &HeaderMap) -> AuthResult<Option<&str>> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    Ok(Some(token))
}

fn claims_from_headers(headers: &HeaderMap, public_key: &str) -> AuthResult<Option<Claims>> {
    bearer_token(headers)?
        .map(|token| validate_access_token(token, public_key))
        .transpose()
}

/// Middleware attaching the customer to the request when one is logged in.
///
/// Authentication is optional on storefront routes: requests without an
/// Authorization header continue anonymously. A header that is present but
/// malformed, expired, or signed with the wrong key is rejected. Tokens issued
/// to admin users do not count as customers.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/store/products", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, authenticate_customer))
/// ```
pub async fn authenticate_customer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = claims_from_headers(request.headers(), &state.config.jwt_public_key)?;

    match claims {
        Some(claims) if claims.actor_type == ActorType::Customer => {
            request.extensions_mut().insert(AuthCustomer {
                id: CustomerId(claims.sub),
            });
        }
        Some(claims) => {
            debug!(actor_type = ?claims.actor_type, "Non-customer token on storefront route");
        }
        None => {}
    }

    Ok(next.run(request).await)
}

/// Middleware requiring an admin user token.
///
/// # Usage
///
/// ```ignore
/// Router::new()
///     .route("/admin/customer-groups/{id}/sales-channel", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, require_admin))
/// ```
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = claims_from_headers(request.headers(), &state.config.jwt_public_key)?
        .ok_or(AuthError::MissingAuthHeader)?;

    if claims.actor_type != ActorType::User {
        return Err(AuthError::Forbidden);
    }

    request
        .extensions_mut()
        .insert(AdminUser { id: claims.sub });

    Ok(next.run(request).await)
}

/// Extractor for the admin user in handlers behind `require_admin`.
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}
