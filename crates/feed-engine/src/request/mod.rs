//! Request building.
//!
//! Pure functions that turn a host [`RequestConfig`](crate::models::RequestConfig)
//! into a validated configuration, a deterministic [`RequestKey`] and a
//! serialized request URL correlated by a [`CallbackToken`].

mod builder;
mod validate;

pub use builder::{build_url, select_clause, CallbackToken, LiveRequest, RequestKey};
pub use validate::validate;
