//! In-process channel access store.
//!
//! Holds a snapshot of channels, groups, memberships and publishable keys and
//! answers the same queries as [`super::PgChannelStore`]. Used by tests and for
//! running the gate without a database.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::{AccessError, AccessResult};
use super::models::{ChannelId, CustomerId};
use super::store::ChannelAccessStore;

#[derive(Debug, Clone)]
struct ChannelRecord {
    disabled: bool,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct GroupRecord {
    sales_channel_id: Option<ChannelId>,
    deleted_at: Option<DateTime<Utc>>,
    members: HashSet<CustomerId>,
}

#[derive(Debug, Clone)]
struct KeyRecord {
    revoked: bool,
    channels: HashSet<ChannelId>,
}

#[derive(Debug, Default)]
struct Snapshot {
    channels: HashMap<ChannelId, ChannelRecord>,
    groups: HashMap<String, GroupRecord>,
    keys: HashMap<String, KeyRecord>,
    failure: Option<String>,
}

impl Snapshot {
    fn channel_is_live(&self, id: &ChannelId) -> bool {
        self.channels
            .get(id)
            .is_some_and(|c| !c.disabled && c.deleted_at.is_none())
    }

    /// Scope of an active key. Revoked or unknown keys scope nothing.
    fn active_scope(&self, credential: Option<&str>) -> Option<&HashSet<ChannelId>> {
        credential
            .and_then(|token| self.keys.get(token))
            .filter(|key| !key.revoked)
            .map(|key| &key.channels)
    }

    fn check_available(&self) -> AccessResult<()> {
        match &self.failure {
            Some(reason) => Err(AccessError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

/// [`ChannelAccessStore`] over an in-memory snapshot.
///
/// Cloning shares the underlying snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryChannelStore {
    inner: Arc<RwLock<Snapshot>>,
}

impl MemoryChannelStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Snapshot> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Snapshot> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Add or replace a live channel.
    pub fn add_channel(&self, id: impl Into<ChannelId>) -> &Self {
        self.write().channels.insert(
            id.into(),
            ChannelRecord {
                disabled: false,
                deleted_at: None,
            },
        );
        self
    }

    /// Add or replace a disabled channel.
    pub fn add_disabled_channel(&self, id: impl Into<ChannelId>) -> &Self {
        self.write().channels.insert(
            id.into(),
            ChannelRecord {
                disabled: true,
                deleted_at: None,
            },
        );
        self
    }

    /// Soft-delete a channel.
    pub fn delete_channel(&self, id: impl Into<ChannelId>) -> &Self {
        if let Some(channel) = self.write().channels.get_mut(&id.into()) {
            channel.deleted_at = Some(Utc::now());
        }
        self
    }

    /// Add or replace a group, optionally bound to a channel.
    pub fn add_group(&self, id: &str, sales_channel_id: Option<&str>) -> &Self {
        self.write().groups.insert(
            id.to_string(),
            GroupRecord {
                sales_channel_id: sales_channel_id.map(ChannelId::from),
                deleted_at: None,
                members: HashSet::new(),
            },
        );
        self
    }

    /// Rebind a group. `None` clears the binding.
    pub fn bind_group(&self, id: &str, sales_channel_id: Option<&str>) -> &Self {
        if let Some(group) = self.write().groups.get_mut(id) {
            group.sales_channel_id = sales_channel_id.map(ChannelId::from);
        }
        self
    }

    /// Soft-delete a group.
    pub fn delete_group(&self, id: &str) -> &Self {
        if let Some(group) = self.write().groups.get_mut(id) {
            group.deleted_at = Some(Utc::now());
        }
        self
    }

    /// Add a customer to a group.
    pub fn add_member(&self, group_id: &str, customer_id: &str) -> &Self {
        if let Some(group) = self.write().groups.get_mut(group_id) {
            group.members.insert(CustomerId::from(customer_id));
        }
        self
    }

    /// Add or replace a publishable key scoped to `channels`.
    pub fn add_key(&self, token: &str, channels: &[&str]) -> &Self {
        self.write().keys.insert(
            token.to_string(),
            KeyRecord {
                revoked: false,
                channels: channels.iter().copied().map(ChannelId::from).collect(),
            },
        );
        self
    }

    /// Revoke a publishable key.
    pub fn revoke_key(&self, token: &str) -> &Self {
        if let Some(key) = self.write().keys.get_mut(token) {
            key.revoked = true;
        }
        self
    }

    /// Make every query fail with [`AccessError::Unavailable`], or recover with `None`.
    pub fn set_failure(&self, reason: Option<&str>) -> &Self {
        self.write().failure = reason.map(str::to_string);
        self
    }
}

#[async_trait]
impl ChannelAccessStore for MemoryChannelStore {
    async fn find_explicit_channels(
        &self,
        customer_id: &CustomerId,
        credential: Option<&str>,
    ) -> AccessResult<BTreeSet<ChannelId>> {
        let snapshot = self.read();
        snapshot.check_available()?;
        let scope = snapshot.active_scope(credential);

        Ok(snapshot
            .groups
            .values()
            .filter(|g| g.deleted_at.is_none() && g.members.contains(customer_id))
            .filter_map(|g| g.sales_channel_id.as_ref())
            .filter(|id| snapshot.channel_is_live(id))
            .filter(|id| scope.map_or(true, |s| s.contains(*id)))
            .cloned()
            .collect())
    }

    async fn find_implicit_channels(
        &self,
        credential: Option<&str>,
        limit_by_credential: bool,
    ) -> AccessResult<BTreeSet<ChannelId>> {
        let snapshot = self.read();
        snapshot.check_available()?;
        let scope = snapshot
            .active_scope(credential)
            .filter(|_| limit_by_credential);

        let gated: HashSet<&ChannelId> = snapshot
            .groups
            .values()
            .filter(|g| g.deleted_at.is_none())
            .filter_map(|g| g.sales_channel_id.as_ref())
            .collect();

        Ok(snapshot
            .channels
            .keys()
            .filter(|id| snapshot.channel_is_live(id))
            .filter(|id| !gated.contains(id))
            .filter(|id| scope.map_or(true, |s| s.contains(*id)))
            .cloned()
            .collect())
    }
}
