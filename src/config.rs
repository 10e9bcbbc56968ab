//! Configuration loading from itempool.toml and the environment.
//!
//! Layers, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. `itempool.toml` in the working directory (or `--config`)
//! 3. Environment variables (`DUNE_LANG`, `USE_LOCAL`, ...)
//! 4. Command-line flags (applied by the binary)
//!
//! ## Example
//!
//! ```toml
//! [source]
//! lang = "en"
//! use-local = true
//!
//! [assets]
//! redownload = false
//! download-all = false
//! images-dir = "images"
//!
//! [html]
//! path = "Dune Awakening Items.html"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::assets::AssetLocator;
use crate::source::PoolSource;

pub const DEFAULT_LANG: &str = "fr";
pub const DEFAULT_BASE_URL: &str = "https://data.gtcdn.info/dune/1.1.25.0/data";
pub const DEFAULT_CDN_ROOT: &str = "https://gtcdn.info/dune/1.1.25.0";
pub const DEFAULT_ASSET_VERSION: &str = "1755896551038";
pub const DEFAULT_HTML_PATH: &str = "Dune Awakening Items.html";
pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_CACHE_DIR: &str = ".itempool.cache";
pub const CONFIG_FILE: &str = "itempool.toml";

/// Effective settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// File the settings were read from (for display).
    pub source: Option<PathBuf>,

    /// Data language, e.g. `fr`.
    pub lang: String,
    pub base_url: String,
    pub cdn_root: String,
    pub asset_version: String,
    /// Read the pool from the cache when present.
    pub use_local: bool,
    pub cache_dir: PathBuf,

    /// Re-download images that already exist locally.
    pub redownload_images: bool,
    /// Download every image in the pool, not only item icons.
    pub download_all_images: bool,
    /// Skip image downloads entirely.
    pub skip_images: bool,
    pub images_dir: PathBuf,

    /// Force HTML snapshot mode.
    pub use_html: bool,
    pub html_path: PathBuf,

    /// Export path; defaults to `dune_awakening_items_{lang}.json`.
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            lang: DEFAULT_LANG.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cdn_root: DEFAULT_CDN_ROOT.to_string(),
            asset_version: DEFAULT_ASSET_VERSION.to_string(),
            use_local: false,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            redownload_images: false,
            download_all_images: false,
            skip_images: false,
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            use_html: false,
            html_path: PathBuf::from(DEFAULT_HTML_PATH),
            output: None,
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    source: Option<RawSource>,
    assets: Option<RawAssets>,
    html: Option<RawHtml>,
    output: Option<RawOutput>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawSource {
    lang: Option<String>,
    base_url: Option<String>,
    cdn_root: Option<String>,
    asset_version: Option<String>,
    use_local: Option<bool>,
    cache_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawAssets {
    redownload: Option<bool>,
    download_all: Option<bool>,
    skip: Option<bool>,
    images_dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawHtml {
    enabled: Option<bool>,
    path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawOutput {
    path: Option<String>,
}

impl Config {
    /// Load configuration from `directory`, then apply the process environment.
    ///
    /// A missing or unparsable config file falls back to defaults.
    pub fn load(directory: &Path) -> Self {
        let mut config = Self::load_file(&directory.join(CONFIG_FILE)).unwrap_or_default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load a specific TOML file without environment overrides.
    pub fn load_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<RawConfig>(&content) {
            Ok(raw) => Some(Self::from_raw(raw, path.to_path_buf())),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                None
            }
        }
    }

    fn from_raw(raw: RawConfig, source: PathBuf) -> Self {
        let defaults = Self::default();
        let src = raw.source.unwrap_or_default();
        let assets = raw.assets.unwrap_or_default();
        let html = raw.html.unwrap_or_default();
        let output = raw.output.unwrap_or_default();

        Self {
            source: Some(source),
            lang: src.lang.unwrap_or(defaults.lang),
            base_url: src.base_url.unwrap_or(defaults.base_url),
            cdn_root: src.cdn_root.unwrap_or(defaults.cdn_root),
            asset_version: src.asset_version.unwrap_or(defaults.asset_version),
            use_local: src.use_local.unwrap_or(defaults.use_local),
            cache_dir: src.cache_dir.map(PathBuf::from).unwrap_or(defaults.cache_dir),
            redownload_images: assets.redownload.unwrap_or(defaults.redownload_images),
            download_all_images: assets.download_all.unwrap_or(defaults.download_all_images),
            skip_images: assets.skip.unwrap_or(defaults.skip_images),
            images_dir: assets.images_dir.map(PathBuf::from).unwrap_or(defaults.images_dir),
            use_html: html.enabled.unwrap_or(defaults.use_html),
            html_path: html.path.map(PathBuf::from).unwrap_or(defaults.html_path),
            output: output.path.map(PathBuf::from),
        }
    }

    /// Overlay environment variables read through `var`.
    ///
    /// Flags are on only for the exact value `1`.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(lang) = var("DUNE_LANG").map(|l| l.trim().to_string()) {
            if !lang.is_empty() {
                self.lang = lang;
            }
        }

        let flag = |key: &str| var(key).map(|v| v == "1");
        if let Some(on) = flag("USE_LOCAL") {
            self.use_local = on;
        }
        if let Some(on) = flag("REDOWNLOAD_IMAGES") {
            self.redownload_images = on;
        }
        if let Some(on) = flag("DOWNLOAD_ALL_IMAGES") {
            self.download_all_images = on;
        }
        if let Some(on) = flag("USE_HTML") {
            self.use_html = on;
        }
        if let Some(path) = var("HTML_PATH") {
            self.html_path = PathBuf::from(path);
        }
    }

    /// `{base_url}/{lang}/items.json.gz?version={asset_version}`
    pub fn pool_url(&self) -> String {
        format!(
            "{}/{}/items.json.gz?version={}",
            self.base_url, self.lang, self.asset_version
        )
    }

    pub fn pool_source(&self) -> PoolSource {
        PoolSource {
            lang: self.lang.clone(),
            url: self.pool_url(),
            use_local: self.use_local,
        }
    }

    pub fn asset_locator(&self) -> AssetLocator {
        AssetLocator::new(&self.cdn_root, &self.asset_version, &self.images_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("dune_awakening_items_{}.json", self.lang)))
    }

    /// HTML mode when forced, or when a snapshot file is present.
    pub fn html_mode(&self) -> bool {
        self.use_html || self.html_path.exists()
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        if let Some(ref source) = self.source {
            lines.push(format!("   Config: {}", source.display()));
        } else {
            lines.push("   Config: (defaults)".to_string());
        }

        lines.push(format!("   Language: {}", self.lang));
        lines.push(format!("   Pool: {}", self.pool_url()));
        if self.use_local {
            lines.push(format!("   Cache: {} (preferred)", self.cache_dir.display()));
        }

        let mut image_flags = Vec::new();
        if self.skip_images {
            image_flags.push("skip");
        }
        if self.redownload_images {
            image_flags.push("redownload");
        }
        if self.download_all_images {
            image_flags.push("all");
        }
        if image_flags.is_empty() {
            lines.push(format!("   Images: {}", self.images_dir.display()));
        } else {
            lines.push(format!(
                "   Images: {} ({})",
                self.images_dir.display(),
                image_flags.join(", ")
            ));
        }

        if self.html_mode() {
            lines.push(format!("   HTML snapshot: {}", self.html_path.display()));
        }

        lines.join("\n")
    }
}
