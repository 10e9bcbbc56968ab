//! itempool CLI - export the item catalogue from the game data pool
//!
//! Pipeline:
//!
//! 1. Config: defaults, `itempool.toml`, environment, then flags
//! 2. Source: fetch the gzip pool (or reuse the redb cache with --use-local)
//! 3. Extraction: classify every dictionary, resolve item fields (parallel)
//! 4. Assets: mirror item icons (or every pool image) from the CDN
//! 5. Export: `{meta, items}` JSON
//!
//! When an HTML snapshot of the listing page is present (or --html is given)
//! the items come from that page instead of the pool.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use itempool::assets::{acquire_all, acquire_item_assets, AssetLocator, DownloadStats, HttpAssetFetcher};
use itempool::cache::PoolCache;
use itempool::html::import_snapshot;
use itempool::rendering::{Colorizer, RunSummary};
use itempool::source::{load_pool, Origin};
use itempool::{extract_items, Config, Export, ImageIndex};

/// Export the Dune Awakening item catalogue from the deduplicated data pool
///
/// Examples:
///   itempool                        # French catalogue, icons into ./images
///   itempool --lang en --use-local  # English, reuse the cached pool
///   itempool --skip-images --stats  # JSON only, print a summary
///   itempool --html --html-path page.html
#[derive(Parser, Debug)]
#[command(name = "itempool")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Data language (overrides DUNE_LANG and the config file)
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Reuse the cached pool instead of fetching it when available
    #[arg(long)]
    pub use_local: bool,

    /// Read items from the saved HTML listing page
    #[arg(long)]
    pub html: bool,

    /// Path of the saved HTML listing page
    #[arg(long, value_name = "FILE")]
    pub html_path: Option<PathBuf>,

    /// Export path (default: dune_awakening_items_{lang}.json)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not download any image
    #[arg(long)]
    pub skip_images: bool,

    /// Download images even when a local copy exists
    #[arg(long)]
    pub redownload: bool,

    /// Download every image referenced by the pool, not only item icons
    #[arg(long)]
    pub download_all: bool,

    /// Clear the cached pools before loading
    ///
    /// Forces a fresh download even with --use-local.
    #[arg(long)]
    pub refresh: bool,

    /// Config file (default: ./itempool.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Progress messages on stderr, `info` log level
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a summary when done
    #[arg(long)]
    pub stats: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Flags win over every other config layer.
    fn apply(&self, config: &mut Config) {
        if let Some(lang) = &self.lang {
            config.lang = lang.clone();
        }
        if self.use_local {
            config.use_local = true;
        }
        if self.html {
            config.use_html = true;
        }
        if let Some(path) = &self.html_path {
            config.html_path = path.clone();
        }
        if let Some(path) = &self.output {
            config.output = Some(path.clone());
        }
        if self.skip_images {
            config.skip_images = true;
        }
        if self.redownload {
            config.redownload_images = true;
        }
        if self.download_all {
            config.download_all_images = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let start = Instant::now();
    let config = load_config(&cli)?;

    if cli.verbose {
        eprintln!("📦 itempool v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("{}", config.display_summary());
    }

    let cache = match PoolCache::open(&config.cache_dir) {
        Ok(cache) => Some(cache),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "pool cache unavailable");
            None
        }
    };

    if cli.refresh {
        if let Some(cache) = &cache {
            refresh_cache(cache, cli.verbose)?;
        }
    }

    let mut summary = RunSummary::default();
    let output = config.output_path();

    let count = if config.html_mode() {
        run_snapshot(&cli, &config, cache.as_ref(), &output, &mut summary)?
    } else {
        run_pool(&cli, &config, cache.as_ref(), &output, &mut summary)?
    };

    println!("{} items exported to '{}'", count, output.display());

    if cli.stats {
        summary.cache = cache.as_ref().map(PoolCache::stats);
        summary.output = Some(output);
        summary.elapsed = Some(start.elapsed());
        eprint!("{}", summary.render(Colorizer::new(!cli.no_color)));
    }

    Ok(())
}

fn refresh_cache(cache: &PoolCache, verbose: bool) -> Result<()> {
    let cleared = cache.stats().entries;
    cache.clear()?;
    if verbose {
        eprintln!("🗑️  Cleared {} cached pool(s) in {}", cleared, cache.cache_dir().display());
    }
    Ok(())
}

/// `RUST_LOG` when set, otherwise `warn` (`info` with --verbose).
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        None => Config::load(Path::new(".")),
    };
    cli.apply(&mut config);
    Ok(config)
}

fn run_pool(
    cli: &Cli,
    config: &Config,
    cache: Option<&PoolCache>,
    output: &Path,
    summary: &mut RunSummary,
) -> Result<usize> {
    let fetch_start = Instant::now();
    let loaded = load_pool(&config.pool_source(), cache)?;

    if cli.verbose {
        let from = match loaded.origin {
            Origin::Cache => "cache",
            Origin::Network => "network",
        };
        eprintln!(
            "✓ Loaded pool of {} values from {} ({:.2?})",
            loaded.pool.len(),
            from,
            fetch_start.elapsed()
        );
    }

    let locator = config.asset_locator();
    let extract_start = Instant::now();
    let (items, stats) = extract_items(&loaded.pool, locator.clone());
    summary.extraction = Some(stats);

    if cli.verbose {
        eprintln!(
            "✓ Extracted {} items from {} candidates ({:.2?})",
            stats.items,
            stats.candidates,
            extract_start.elapsed()
        );
    }

    if !config.skip_images {
        let mut downloads = DownloadStats {
            pool_images: loaded.pool.image_paths().count(),
            ..DownloadStats::default()
        };
        download_images(config, &locator, &items, &loaded.pool, &mut downloads);
        summary.downloads = Some(downloads);
    }

    write_export(output, items)
}

fn download_images(
    config: &Config,
    locator: &AssetLocator,
    items: &[itempool::Item],
    pool: &itempool::Pool,
    downloads: &mut DownloadStats,
) {
    let fetcher = HttpAssetFetcher::new(config.redownload_images);

    acquire_item_assets(items, locator, &fetcher, downloads);
    if config.download_all_images {
        acquire_all(pool.image_paths(), locator, &fetcher, downloads);
    }

    tracing::info!(
        pool = downloads.pool_images,
        items_with_icon = downloads.items_with_icon,
        items_with_tier_icon = downloads.items_with_tier_icon,
        dl_ok = downloads.downloaded_ok,
        dl_ko = downloads.downloaded_ko,
        "[images]"
    );
}

fn run_snapshot(
    cli: &Cli,
    config: &Config,
    cache: Option<&PoolCache>,
    output: &Path,
    summary: &mut RunSummary,
) -> Result<usize> {
    if cli.verbose {
        eprintln!("📄 HTML snapshot: {}", config.html_path.display());
    }

    // The pool is only needed to map page images back to CDN paths.
    let pool = match load_pool(&config.pool_source(), cache) {
        Ok(loaded) => Some(loaded.pool),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "no pool for image remapping");
            None
        }
    };
    let index = pool.as_ref().map(|p| ImageIndex::build(p.image_paths()));
    if cli.verbose {
        match &index {
            Some(index) if !index.is_empty() => eprintln!("✓ Indexed {} pool images", index.len()),
            _ => eprintln!("⚠️  No pool images to remap page icons"),
        }
    }

    let items = import_snapshot(&config.html_path, &config.asset_locator(), index.as_ref())?;
    summary.snapshot_items = Some(items.len());

    if cli.verbose {
        eprintln!("✓ Parsed {} item cards", items.len());
    }

    write_export(output, items)
}

fn write_export<T: Serialize>(path: &Path, items: Vec<T>) -> Result<usize> {
    let count = items.len();
    let last_updated = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let json = Export::new(items, last_updated)
        .to_json_pretty()
        .context("Failed to serialize export")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_minimal() {
        let cli = Cli::parse_from(["itempool"]);
        assert_eq!(cli.lang, None);
        assert!(!cli.use_local);
        assert!(!cli.html);
        assert!(!cli.stats);
    }

    #[test]
    fn test_cli_parse_flags() {
        let cli = Cli::parse_from([
            "itempool",
            "--lang",
            "en",
            "--use-local",
            "--skip-images",
            "--redownload",
            "--download-all",
            "--refresh",
            "--stats",
            "-v",
        ]);
        assert_eq!(cli.lang.as_deref(), Some("en"));
        assert!(cli.use_local && cli.skip_images && cli.redownload && cli.download_all);
        assert!(cli.refresh);
        assert!(cli.stats && cli.verbose);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "itempool",
            "-l",
            "de",
            "--html-path",
            "page.html",
            "-o",
            "out/items.json",
        ]);
        let mut config = Config::default();
        config.use_local = true;
        cli.apply(&mut config);

        assert_eq!(config.lang, "de");
        assert_eq!(config.html_path, PathBuf::from("page.html"));
        assert_eq!(config.output_path(), PathBuf::from("out/items.json"));
        // Absent flags leave config values alone.
        assert!(config.use_local);
        assert!(!config.use_html);
    }

    #[test]
    fn test_refresh_clears_cached_pools() -> Result<()> {
        let dir = std::env::temp_dir().join("itempool_test_refresh");
        let _ = fs::remove_dir_all(&dir);
        let cache = PoolCache::open(&dir)?;
        cache.set("fr", "https://x/fr", "[1]")?;
        cache.set("en", "https://x/en", "[2]")?;

        refresh_cache(&cache, false)?;
        assert!(cache.get("fr").is_none());
        assert!(cache.get("en").is_none());
        assert_eq!(cache.stats().entries, 0);

        drop(cache);
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[test]
    fn test_write_export() -> Result<()> {
        let dir = std::env::temp_dir().join("itempool_test_export");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("items.json");

        let count = write_export(&path, vec![serde_json::json!({"name": "Knife"})])?;
        assert_eq!(count, 1);

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(written["meta"]["itemCount"], 1);
        assert_eq!(written["items"][0]["name"], "Knife");
        assert_eq!(written["meta"]["lastUpdated"].as_str().map(str::len), Some(10));

        fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
