//! Customer group sales channel binding handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::info;
use validator::Validate;

use crate::api::AppState;
use crate::auth::{AdminUser, ErrorResponse};
use crate::db::{self, BindOutcome, ClearOutcome, SalesChannel};

use super::types::{BindSalesChannelRequest, BindSalesChannelResponse, UnbindSalesChannelResponse};

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("Customer group not found")]
    GroupNotFound,

    #[error("Sales channel not found")]
    ChannelNotFound,

    #[error("No sales channel to delete")]
    NotBound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for BindingError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::GroupNotFound => (StatusCode::NOT_FOUND, "GROUP_NOT_FOUND"),
            Self::ChannelNotFound => (StatusCode::NOT_FOUND, "CHANNEL_NOT_FOUND"),
            Self::NotBound => (StatusCode::NOT_FOUND, "NOT_BOUND"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the sales channel a group is bound to.
///
/// `GET /admin/customer-groups/{id}/sales-channel`
///
/// Responds with the channel, or `null` when the group has no binding.
#[tracing::instrument(skip(state, _admin))]
pub async fn get_sales_channel(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(group_id): Path<String>,
) -> Result<Json<Option<SalesChannel>>, BindingError> {
    if db::find_customer_group(&state.db, &group_id).await?.is_none() {
        return Err(BindingError::GroupNotFound);
    }

    let channel = db::get_group_sales_channel(&state.db, &group_id).await?;
    Ok(Json(channel))
}

/// Bind a group to a sales channel, replacing any existing binding.
///
/// `POST /admin/customer-groups/{id}/sales-channel`
#[tracing::instrument(skip(state, body), fields(admin_id = %admin.id))]
pub async fn set_sales_channel(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(group_id): Path<String>,
    Json(body): Json<BindSalesChannelRequest>,
) -> Result<Json<BindSalesChannelResponse>, BindingError> {
    body.validate()
        .map_err(|e| BindingError::Validation(e.to_string()))?;

    match db::set_group_sales_channel(&state.db, &group_id, &body.sales_channel_id).await? {
        BindOutcome::Bound(channel) => {
            info!(
                group_id = %group_id,
                channel_id = %channel.id,
                "Customer group bound to sales channel"
            );
            Ok(Json(BindSalesChannelResponse {
                message: "Sales channel updated successfully",
                sales_channel: channel,
            }))
        }
        BindOutcome::GroupNotFound => Err(BindingError::GroupNotFound),
        BindOutcome::ChannelNotFound => Err(BindingError::ChannelNotFound),
    }
}

/// Remove a group's binding.
///
/// `DELETE /admin/customer-groups/{id}/sales-channel`
#[tracing::instrument(skip(state), fields(admin_id = %admin.id))]
pub async fn delete_sales_channel(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(group_id): Path<String>,
) -> Result<Json<UnbindSalesChannelResponse>, BindingError> {
    match db::clear_group_sales_channel(&state.db, &group_id).await? {
        ClearOutcome::Cleared(previous) => {
            info!(
                group_id = %group_id,
                channel_id = %previous,
                "Customer group unbound from sales channel"
            );
            Ok(Json(UnbindSalesChannelResponse {
                message: "Sales channel deleted successfully",
            }))
        }
        ClearOutcome::NotBound => Err(BindingError::NotBound),
        ClearOutcome::GroupNotFound => Err(BindingError::GroupNotFound),
    }
}
