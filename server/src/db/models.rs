//! Database Models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::access::ChannelId;

/// Sales channel model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct SalesChannel {
    pub id: ChannelId,
    pub name: String,
    pub description: Option<String>,
    pub is_disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer group model.
///
/// `sales_channel_id` is the group's single channel binding, if any.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerGroup {
    pub id: String,
    pub name: String,
    pub sales_channel_id: Option<ChannelId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
