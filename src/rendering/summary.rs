//! Colored end-of-run summary.
//!
//! ```text
//! ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//! ## Statistics
//! Pool values:        48213
//! Candidates:         3120
//! Items:              2874
//!   discarded:        246 (stat tuples 180, no id/name 12, ...)
//! Images:             ok 2790 / ko 3 (1904 in pool)
//! Cache:              1 pool(s), 5.21 MB
//! Output:             dune_awakening_items_fr.json
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use owo_colors::OwoColorize;

use crate::assets::DownloadStats;
use crate::cache::CacheStats;
use crate::extraction::ExtractionStats;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Colors for summary fields, no-ops when color is off.
#[derive(Debug, Clone, Copy)]
pub struct Colorizer {
    enabled: bool,
}

impl Colorizer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Headline counts (bold green)
    pub fn count(&self, n: usize) -> String {
        if self.enabled {
            n.green().bold().to_string()
        } else {
            n.to_string()
        }
    }

    /// Failures: red when non-zero
    pub fn failures(&self, n: usize) -> String {
        if self.enabled && n > 0 {
            n.bright_red().bold().to_string()
        } else {
            n.to_string()
        }
    }

    pub fn path(&self, p: &Path) -> String {
        let shown = p.display().to_string();
        if self.enabled {
            shown.bright_blue().to_string()
        } else {
            shown
        }
    }

    pub fn dim(&self, s: &str) -> String {
        if self.enabled {
            s.dimmed().to_string()
        } else {
            s.to_string()
        }
    }
}

/// Everything worth reporting about one run. Sections left `None` are omitted.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub extraction: Option<ExtractionStats>,
    /// Items read from an HTML snapshot instead of the pool.
    pub snapshot_items: Option<usize>,
    pub downloads: Option<DownloadStats>,
    pub cache: Option<CacheStats>,
    pub output: Option<PathBuf>,
    pub elapsed: Option<Duration>,
}

impl RunSummary {
    pub fn render(&self, color: Colorizer) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "## Statistics");

        if let Some(stats) = &self.extraction {
            let _ = writeln!(out, "{:<20}{}", "Pool values:", stats.pool_len);
            let _ = writeln!(out, "{:<20}{}", "Candidates:", stats.candidates);
            let _ = writeln!(out, "{:<20}{}", "Items:", color.count(stats.items));
            if stats.discarded() > 0 {
                let detail = format!(
                    "(stat tuples {}, no id/name {}, no item keys {}, no id {}, bad name {})",
                    stats.stat_tuples,
                    stats.missing_identity,
                    stats.no_item_keys,
                    stats.no_id,
                    stats.invalid_name,
                );
                let _ = writeln!(
                    out,
                    "{:<20}{} {}",
                    "  discarded:",
                    stats.discarded(),
                    color.dim(&detail)
                );
            }
        }

        if let Some(n) = self.snapshot_items {
            let _ = writeln!(out, "{:<20}{}", "Snapshot items:", color.count(n));
        }

        if let Some(dl) = &self.downloads {
            let _ = writeln!(
                out,
                "{:<20}ok {} / ko {} {}",
                "Images:",
                color.count(dl.downloaded_ok),
                color.failures(dl.downloaded_ko),
                color.dim(&format!(
                    "({} in pool, {} icons, {} tier icons)",
                    dl.pool_images, dl.items_with_icon, dl.items_with_tier_icon
                )),
            );
        }

        if let Some(cache) = &self.cache {
            let _ = writeln!(
                out,
                "{:<20}{} pool(s), {}",
                "Cache:",
                cache.entries,
                cache.size_human()
            );
        }

        if let Some(path) = &self.output {
            let _ = writeln!(out, "{:<20}{}", "Output:", color.path(path));
        }

        if let Some(elapsed) = self.elapsed {
            let _ = writeln!(out, "{:<20}{:.2?}", "Total time:", elapsed);
        }

        out
    }
}
