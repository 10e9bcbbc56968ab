//! itempool - item catalogue extraction from a deduplicated JSON pool
//!
//! The game data export is a single JSON array in which every repeated value
//! is stored once and referenced elsewhere by its integer position. Items are
//! dictionaries somewhere in that array whose fields point back into it.
//!
//! # Architecture
//!
//! ```text
//! Source → Pool → Classify → Extract → Assets → Export
//!    ↓       ↓        ↓          ↓         ↓        ↓
//!  ureq    Vec<    shape      Resolver   ureq    serde_json
//!  gzip    Value>  signature  + icons    + .part  {meta, items}
//!  redb                       (rayon)
//! ```
//!
//! An HTML listing page can stand in for the pool (see [`html`]); it produces
//! fewer fields per item.

pub mod assets;
pub mod cache;
pub mod config;
pub mod extraction;
pub mod html;
pub mod pool;
pub mod rendering;
pub mod resolve;
pub mod source;
pub mod types;

pub use pool::{Pool, PoolError};
pub use resolve::{IconResolver, ImageIndex, Resolver};
pub use extraction::{extract_items, ExtractionStats, Extractor};
pub use types::{Attribute, Export, Item, Meta, SnapshotItem};
pub use config::Config;
