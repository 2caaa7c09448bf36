//! Access resolution logic.
//!
//! Computes the channels a request may query against from explicit grants
//! (group bindings) and implicit grants (channels no group gates).

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::debug;

use super::error::{AccessError, AccessResult};
use super::models::{AccessPolicy, AccessRequest, AuthorizedChannels, ChannelId};
use super::store::ChannelAccessStore;

/// Merge explicit and implicit grants under `policy`.
///
/// The implicit set only contributes when the policy allows implicit access
/// and either the explicit set is empty or explicit holders may also see
/// open channels.
pub fn merge_channel_sets(
    explicit: BTreeSet<ChannelId>,
    implicit: Option<BTreeSet<ChannelId>>,
    policy: &AccessPolicy,
) -> AuthorizedChannels {
    let include_implicit = policy.implicit_applies(explicit.is_empty());

    let mut authorized = AuthorizedChannels::from(explicit);
    if include_implicit {
        if let Some(implicit) = implicit {
            authorized.extend(implicit);
        }
    }

    authorized
}

/// Resolve the authorized channel set for one request.
///
/// Resolution order:
/// 1. Explicit channels through group membership (only with a customer)
/// 2. Implicit channels, fetched concurrently when the policy allows them
/// 3. Union of both, with the implicit part dropped when the policy says so
///
/// Both store reads are bounded by `timeout` together. A store failure or
/// timeout fails the whole resolution; no partial set is returned.
#[tracing::instrument(skip(store, request), fields(customer_id = ?request.customer_id))]
pub async fn resolve_authorized_channels<S>(
    store: &S,
    request: &AccessRequest,
    policy: &AccessPolicy,
    timeout: Duration,
) -> AccessResult<AuthorizedChannels>
where
    S: ChannelAccessStore + ?Sized,
{
    let credential = request.credential.as_deref();

    let explicit = async {
        match &request.customer_id {
            Some(customer_id) => store.find_explicit_channels(customer_id, credential).await,
            None => Ok(BTreeSet::new()),
        }
    };

    let implicit = async {
        if policy.allow_implicit {
            store
                .find_implicit_channels(credential, policy.limit_implicit_by_credential)
                .await
                .map(Some)
        } else {
            Ok(None)
        }
    };

    let (explicit, implicit) =
        tokio::time::timeout(timeout, async { tokio::try_join!(explicit, implicit) })
            .await
            .map_err(|_| AccessError::Timeout(timeout))??;

    let authorized = merge_channel_sets(explicit, implicit, policy);
    debug!(count = authorized.len(), "Resolved authorized channels");

    Ok(authorized)
}
