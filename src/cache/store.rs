//! Persistent pool cache using redb.
//!
//! Cache structure:
//! - Database: `<cache_dir>/pool.redb`
//! - Key: language code (`fr`, `en`, ...)
//! - Value: bincode-serialized (fetched_secs, url, json)
//!
//! The JSON is stored as text, not as a parsed value: the pool is arbitrary
//! JSON and bincode cannot encode self-describing values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};

/// Key = language, Value = serialized CacheEntry
const POOLS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("pools");

/// Cached pool text with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheEntry {
    /// Fetch time, seconds since UNIX_EPOCH
    fetched_secs: u64,
    /// URL the pool was fetched from
    url: String,
    /// Decoded JSON document
    json: String,
}

impl CacheEntry {
    fn new(fetched_at: SystemTime, url: &str, json: &str) -> Result<Self> {
        let duration = fetched_at
            .duration_since(SystemTime::UNIX_EPOCH)
            .context("Fetch time is before UNIX_EPOCH")?;

        Ok(Self {
            fetched_secs: duration.as_secs(),
            url: url.to_string(),
            json: json.to_string(),
        })
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).context("Failed to serialize cache entry")
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).context("Failed to deserialize cache entry")
    }
}

/// A pool read back from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPool {
    pub fetched_secs: u64,
    pub url: String,
    pub json: String,
}

/// Persistent pool cache backed by redb.
pub struct PoolCache {
    db: Database,
    cache_dir: PathBuf,
}

impl PoolCache {
    /// Open or create the cache database under `cache_dir`.
    pub fn open(cache_dir: &Path) -> Result<Self> {
        fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;

        let db_path = cache_dir.join("pool.redb");
        let db = Database::create(&db_path)
            .with_context(|| format!("Failed to open cache database: {}", db_path.display()))?;

        Ok(Self {
            db,
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cached pool for `lang`, if any.
    ///
    /// A missing table, missing key or undecodable entry all read as a miss.
    pub fn get(&self, lang: &str) -> Option<CachedPool> {
        let read_txn = self.db.begin_read().ok()?;
        let table = read_txn.open_table(POOLS_TABLE).ok()?;

        let value_guard = table.get(lang).ok()??;
        let entry = CacheEntry::from_bytes(value_guard.value()).ok()?;

        Some(CachedPool {
            fetched_secs: entry.fetched_secs,
            url: entry.url,
            json: entry.json,
        })
    }

    /// Store the pool text for `lang`, replacing any previous entry.
    pub fn set(&self, lang: &str, url: &str, json: &str) -> Result<()> {
        let entry = CacheEntry::new(SystemTime::now(), url, json)?;
        let bytes = entry.to_bytes()?;

        let write_txn = self.db.begin_write()
            .context("Failed to begin write transaction")?;

        {
            let mut table = write_txn.open_table(POOLS_TABLE)
                .context("Failed to open pools table")?;

            table.insert(lang, bytes.as_slice())
                .with_context(|| format!("Failed to insert cache entry for {}", lang))?;
        }

        write_txn.commit()
            .context("Failed to commit cache write")?;

        Ok(())
    }

    /// Remove every cached pool. The database file itself stays.
    pub fn clear(&self) -> Result<()> {
        let write_txn = self.db.begin_write()
            .context("Failed to begin write transaction for clear")?;

        {
            let mut table = write_txn.open_table(POOLS_TABLE)
                .context("Failed to open pools table")?;

            let keys: Vec<String> = table.iter()
                .ok()
                .into_iter()
                .flatten()
                .filter_map(|r| r.ok())
                .map(|(k, _)| k.value().to_string())
                .collect();

            for key in keys {
                table.remove(key.as_str())
                    .context("Failed to remove cache entry during clear")?;
            }
        }

        write_txn.commit()
            .context("Failed to commit cache clear")?;

        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let read_txn = match self.db.begin_read() {
            Ok(txn) => txn,
            Err(_) => return CacheStats::default(),
        };

        let table = match read_txn.open_table(POOLS_TABLE) {
            Ok(t) => t,
            Err(_) => return CacheStats::default(),
        };

        let entries = table.len().unwrap_or(0) as usize;

        let size_bytes = table.iter()
            .ok()
            .into_iter()
            .flatten()
            .filter_map(|r| r.ok())
            .map(|(k, v)| k.value().len() + v.value().len())
            .sum::<usize>() as u64;

        CacheStats { entries, size_bytes }
    }
}

/// Cache statistics for verbose output.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cached pools
    pub entries: usize,
    /// Approximate total size in bytes (keys + values)
    pub size_bytes: u64,
}

impl CacheStats {
    /// Format size in human-readable form (KB, MB, GB)
    pub fn size_human(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if self.size_bytes >= GB {
            format!("{:.2} GB", self.size_bytes as f64 / GB as f64)
        } else if self.size_bytes >= MB {
            format!("{:.2} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{:.2} KB", self.size_bytes as f64 / KB as f64)
        } else {
            format!("{} B", self.size_bytes)
        }
    }
}
