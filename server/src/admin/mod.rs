//! Admin API
//!
//! Customer group to sales channel binding. A group binds to at most one
//! channel; binding a channel removes it from implicit access for everyone
//! outside the group.

mod handlers;
mod types;

use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::api::AppState;
use crate::auth::require_admin;

pub use handlers::BindingError;
pub use types::{BindSalesChannelRequest, BindSalesChannelResponse, UnbindSalesChannelResponse};

/// Create the admin router. All routes require an admin user token.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/customer-groups/{id}/sales-channel",
            get(handlers::get_sales_channel)
                .post(handlers::set_sales_channel)
                .delete(handlers::delete_sales_channel),
        )
        .layer(from_fn_with_state(state, require_admin))
}
