//! Reconciles the channels a caller asked for with the channels it may use.

use super::models::{AuthorizedChannels, ChannelId};

/// Shape of the channel parameter a route expects downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelParamMode {
    /// Downstream accepts a list of channel ids.
    Array,
    /// Downstream accepts exactly one channel id.
    Scalar,
}

impl ChannelParamMode {
    #[must_use]
    pub const fn is_array(self) -> bool {
        matches!(self, Self::Array)
    }
}

/// Produce the channel ids a request is allowed to run with.
///
/// - A non-empty request whose ids are all authorized is returned verbatim,
///   keeping the caller's order and duplicates.
/// - Anything else falls back to the authorized set: all of it in array mode,
///   or only its smallest id in scalar mode.
///
/// Unauthorized ids are replaced silently so callers cannot probe for channel
/// existence. An empty authorized set always yields an empty list.
pub fn enforce(
    requested: &[ChannelId],
    authorized: &AuthorizedChannels,
    array_mode: bool,
) -> Vec<ChannelId> {
    let all_permitted = !requested.is_empty() && requested.iter().all(|id| authorized.contains(id));

    if all_permitted {
        return requested.to_vec();
    }

    if array_mode {
        authorized.iter().cloned().collect()
    } else {
        authorized.first().cloned().into_iter().collect()
    }
}
