//! Pool acquisition: network fetch or a previously cached copy.
//!
//! ```text
//! use_local? ── yes ── cache hit? ── yes ──► parse
//!     │                   │
//!     no                  no
//!     └───────────────────┴──► fetch ─► gunzip ─► parse ─► write cache
//! ```

mod fetch;

use anyhow::{Context, Result};

use crate::cache::PoolCache;
use crate::pool::Pool;

pub use fetch::{decode_body, fetch_pool_text};

/// Where to get the pool from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSource {
    pub lang: String,
    pub url: String,
    /// Prefer the cached copy when one exists.
    pub use_local: bool,
}

/// Where a loaded pool came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
}

#[derive(Debug)]
pub struct LoadedPool {
    pub pool: Pool,
    pub origin: Origin,
}

/// Load the pool, going to the network unless a usable cached copy exists.
///
/// A document that is not a JSON array is a hard error.
pub fn load_pool(source: &PoolSource, cache: Option<&PoolCache>) -> Result<LoadedPool> {
    load_pool_with(source, cache, fetch_pool_text)
}

/// [`load_pool`] with an injectable fetch function.
pub fn load_pool_with<F>(source: &PoolSource, cache: Option<&PoolCache>, fetch: F) -> Result<LoadedPool>
where
    F: FnOnce(&str) -> Result<String>,
{
    if source.use_local {
        if let Some(cached) = cache.and_then(|c| c.get(&source.lang)) {
            tracing::info!(lang = %source.lang, url = %cached.url, "using cached pool");
            let pool = Pool::from_json_str(&cached.json)
                .with_context(|| format!("Cached pool for '{}' is unusable", source.lang))?;
            return Ok(LoadedPool {
                pool,
                origin: Origin::Cache,
            });
        }
        tracing::info!(lang = %source.lang, "no cached pool, fetching");
    }

    let text = fetch(&source.url)?;
    let pool = Pool::from_json_str(&text)
        .with_context(|| format!("Pool fetched from {} is unusable", source.url))?;

    if let Some(cache) = cache {
        if let Err(e) = cache.set(&source.lang, &source.url, &text) {
            tracing::warn!(error = %format!("{e:#}"), "failed to cache pool");
        }
    }

    Ok(LoadedPool {
        pool,
        origin: Origin::Network,
    })
}
