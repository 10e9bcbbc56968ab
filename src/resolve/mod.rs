//! Back-reference resolution over the pool.
//!
//! [`Resolver`] provides the dereference and coercion policies; [`IconResolver`]
//! adds image path lookup on top of it.

mod icon;
mod resolver;

pub use icon::{basename_key, IconResolver, ImageIndex};
pub use resolver::{is_asset_path, is_truthy, Resolver, MAX_CHAIN_STEPS, MAX_SEARCH_DEPTH};
