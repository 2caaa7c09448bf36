//! Admin request/response types.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::SalesChannel;

/// Request to bind a customer group to a sales channel.
#[derive(Debug, Deserialize, Validate)]
pub struct BindSalesChannelRequest {
    #[validate(length(min = 1, max = 255, message = "sales_channel_id must be 1-255 characters"))]
    pub sales_channel_id: String,
}

/// Response after binding a group.
#[derive(Debug, Serialize)]
pub struct BindSalesChannelResponse {
    pub message: &'static str,
    pub sales_channel: SalesChannel,
}

/// Response after removing a binding.
#[derive(Debug, Serialize)]
pub struct UnbindSalesChannelResponse {
    pub message: &'static str,
}
