//! Store interface consumed by the access resolver.
//!
//! ```text
//! resolver
//!     |
//!     v
//! ChannelAccessStore (trait)
//!     |
//!     +---> PgChannelStore (PostgreSQL)
//!     |
//!     +---> MemoryChannelStore (in-process snapshot)
//! ```
//!
//! Both queries apply the same filters: the channel is not disabled and not
//! soft-deleted, and a credential only scopes results while it is active
//! (neither `revoked_at` nor `revoked_by` set). A revoked or unknown
//! credential scopes nothing and grants nothing.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::error::AccessResult;
use super::models::{ChannelId, CustomerId};

/// Read-only queries backing channel access resolution.
#[async_trait]
pub trait ChannelAccessStore: Send + Sync {
    /// Channels granted to `customer_id` through the groups they belong to.
    ///
    /// Only non-deleted groups count. When `credential` is an active key, only
    /// channels inside the key's scope are returned.
    async fn find_explicit_channels(
        &self,
        customer_id: &CustomerId,
        credential: Option<&str>,
    ) -> AccessResult<BTreeSet<ChannelId>>;

    /// Channels that no non-deleted group binds to.
    ///
    /// When `limit_by_credential` is set and `credential` is an active key, only
    /// channels inside the key's scope are returned.
    async fn find_implicit_channels(
        &self,
        credential: Option<&str>,
        limit_by_credential: bool,
    ) -> AccessResult<BTreeSet<ChannelId>>;
}
