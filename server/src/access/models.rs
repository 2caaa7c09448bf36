//! Access resolution types.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sales channel identifier (e.g. `sc_01H...`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ChannelId(pub String);

impl ChannelId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ChannelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Customer (principal) identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct CustomerId(pub String);

impl CustomerId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Policy toggles for a resolution.
///
/// Fixed per route or deployment; never derived from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    /// Channels with no binding group are open to callers.
    pub allow_implicit: bool,
    /// Customers with an explicit grant also see the open channels.
    pub group_can_also_see_implicit: bool,
    /// An active publishable key narrows the open channels to its scope.
    pub limit_implicit_by_credential: bool,
}

impl AccessPolicy {
    /// Whether the implicit set contributes, given the size of the explicit set.
    #[must_use]
    pub const fn implicit_applies(&self, explicit_is_empty: bool) -> bool {
        self.allow_implicit && (explicit_is_empty || self.group_can_also_see_implicit)
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            allow_implicit: true,
            group_can_also_see_implicit: false,
            limit_implicit_by_credential: true,
        }
    }
}

/// Inputs identifying the caller of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRequest {
    /// Authenticated customer, if any.
    pub customer_id: Option<CustomerId>,
    /// Publishable API key from the request headers, if any.
    pub credential: Option<String>,
}

impl AccessRequest {
    #[must_use]
    pub const fn new(customer_id: Option<CustomerId>, credential: Option<String>) -> Self {
        Self {
            customer_id,
            credential,
        }
    }

    /// Request carrying neither a customer nor a credential.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            customer_id: None,
            credential: None,
        }
    }
}

/// Channels a single request may query against.
///
/// Recomputed per request and never persisted. Iteration is in ascending id
/// order, which makes the scalar fallback in [`crate::access::enforce`]
/// reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuthorizedChannels(BTreeSet<ChannelId>);

impl AuthorizedChannels {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    #[must_use]
    pub fn contains(&self, id: &ChannelId) -> bool {
        self.0.contains(id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Smallest id, used for scalar fallback.
    #[must_use]
    pub fn first(&self) -> Option<&ChannelId> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelId> {
        self.0.iter()
    }

    /// Add every id from `other`.
    pub fn extend(&mut self, other: impl IntoIterator<Item = ChannelId>) {
        self.0.extend(other);
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ChannelId> {
        self.0.into_iter().collect()
    }
}

impl From<BTreeSet<ChannelId>> for AuthorizedChannels {
    fn from(set: BTreeSet<ChannelId>) -> Self {
        Self(set)
    }
}

impl FromIterator<ChannelId> for AuthorizedChannels {
    fn from_iter<I: IntoIterator<Item = ChannelId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
