//! Response caching.
//!
//! The engine talks to an external key/response store through
//! [`CacheGateway`]. TTLs are decided per request by [`CachePolicy`] and
//! applied by the store.

mod gateway;
mod policy;
mod store;

pub use gateway::CacheGateway;
pub use policy::CachePolicy;
pub use store::{CacheStore, CachedEntry, MemoryCacheStore, StoredResponse, Validity};
