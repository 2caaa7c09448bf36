//! Sales channel access control.
//!
//! Two-part model:
//! - Resolver: computes the channels a caller may query from explicit grants
//!   (customer group bindings) and implicit grants (channels no group gates)
//! - Filter: reconciles the channels a request asks for with that set

pub mod error;
pub mod filter;
pub mod memory;
pub mod middleware;
pub mod models;
pub mod params;
pub mod queries;
pub mod resolver;
pub mod store;

pub use error::{AccessError, AccessResult};
pub use filter::{enforce, ChannelParamMode};
pub use memory::MemoryChannelStore;
pub use middleware::{
    filter_sales_channels, with_channel_scope, ChannelFilterError, ChannelScope, EnforcedChannels,
    PUBLISHABLE_KEY_HEADER,
};
pub use models::*;
pub use queries::PgChannelStore;
pub use resolver::{merge_channel_sets, resolve_authorized_channels};
pub use store::ChannelAccessStore;
