//! Item classification and extraction from the pool.
//!
//! This module handles:
//! - Recognizing item-shaped dictionaries by structural signature
//! - Resolving their fields through the [`Resolver`](crate::resolve::Resolver)
//! - Turning stat tuples into named attributes
//!
//! Candidates that fail the signature, id or name checks are dropped whole and
//! only counted in [`ExtractionStats`].

mod attributes;
mod classify;
mod items;

pub use attributes::humanize_attribute_values;
pub use classify::{classify, looks_like_item, Rejection, ITEM_KEYS};
pub use items::{
    extract_items, is_display_text, is_item_name, Discard, ExtractionStats, Extractor,
    NON_ITEM_NAME_TOKENS,
};
