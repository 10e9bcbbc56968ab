//! Items scraped from a saved HTML listing page.
//!
//! Used when the JSON pool is unavailable. The page only carries name, category,
//! tier and an image, so the output is a [`SnapshotItem`] list. Relative images
//! are remapped to the CDN through the pool's image index when one is given,
//! and the saved file is copied next to the downloaded pool images.

mod parser;

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::assets::{AssetLink, AssetLocator};
use crate::resolve::{basename_key, ImageIndex};
use crate::types::SnapshotItem;

pub use parser::{decode_entities, parse_cards, Card};

/// Subdirectory of the images dir receiving copied page assets.
pub const HTML_ASSETS_DIR: &str = "html_assets";

/// Converts page cards into snapshot items.
pub struct SnapshotImporter<'a> {
    /// Directory relative image paths are resolved against.
    page_dir: PathBuf,
    locator: &'a AssetLocator,
    index: Option<&'a ImageIndex<'a>>,
}

impl<'a> SnapshotImporter<'a> {
    pub fn new(page_dir: impl Into<PathBuf>, locator: &'a AssetLocator) -> Self {
        Self {
            page_dir: page_dir.into(),
            locator,
            index: None,
        }
    }

    /// Remap relative images to CDN URLs using `index`.
    pub fn with_index(mut self, index: &'a ImageIndex<'a>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn import(&self, html: &str) -> Vec<SnapshotItem> {
        parse_cards(html)
            .into_iter()
            .map(|card| self.convert(card))
            .collect()
    }

    fn convert(&self, card: Card) -> SnapshotItem {
        let mut icon_url = card.image_url.clone();
        let mut icon_local_path = String::new();

        if !is_remote(&card.image_url) {
            if let Some(link) = self.cdn_link(&card.image_url) {
                icon_url = link.url;
            }
            match self.copy_local(&card.image_url) {
                Ok(Some(copied)) => icon_local_path = copied,
                Ok(None) => {}
                Err(e) => tracing::warn!(src = %card.image_url, error = %format!("{e:#}"), "failed to copy page image"),
            }
        }

        SnapshotItem {
            name: card.name,
            category: card.category,
            tier: card.tier.map(Value::from),
            icon_url,
            icon_local_path,
            source_url: card.href,
            ..SnapshotItem::default()
        }
    }

    fn cdn_link(&self, src: &str) -> Option<AssetLink> {
        let index = self.index?;
        let path = index.get(&basename_key(strip_query(src)))?;
        self.locator.link(path)
    }

    /// Copy the saved image into `{images_dir}/html_assets/`.
    ///
    /// Returns the destination path, `None` when the source file is missing.
    fn copy_local(&self, src: &str) -> Result<Option<String>> {
        let relative = strip_query(src).trim_start_matches("./");
        // Saved pages escape file names in `src` (`Items%20Page_files/...`).
        let decoded = String::from_utf8_lossy(&urlencoding::decode_binary(relative.as_bytes())).into_owned();
        let Some(source) = [relative, decoded.as_str()]
            .iter()
            .map(|candidate| self.page_dir.join(candidate))
            .find(|candidate| candidate.is_file())
        else {
            return Ok(None);
        };

        let dest = self
            .locator
            .images_dir
            .join(HTML_ASSETS_DIR)
            .join(asset_subpath(&decoded));

        let up_to_date = match (fs::metadata(&source), fs::metadata(&dest)) {
            (Ok(s), Ok(d)) => s.len() == d.len(),
            _ => false,
        };
        if !up_to_date {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::copy(&source, &dest)
                .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))?;
        }

        Ok(Some(dest.to_string_lossy().replace('\\', "/")))
    }
}

/// Read the saved page at `path` and import its cards.
pub fn import_snapshot(
    path: &Path,
    locator: &AssetLocator,
    index: Option<&ImageIndex<'_>>,
) -> Result<Vec<SnapshotItem>> {
    let html = fs::read_to_string(path)
        .with_context(|| format!("Failed to read HTML snapshot: {}", path.display()))?;

    let page_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let importer = SnapshotImporter::new(page_dir, locator);
    let items = match index {
        Some(index) => importer.with_index(index).import(&html),
        None => importer.import(&html),
    };

    tracing::info!(path = %path.display(), items = items.len(), "imported HTML snapshot");
    Ok(items)
}

fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

fn strip_query(src: &str) -> &str {
    src.split(['?', '#']).next().unwrap_or(src)
}

/// Path below the first `*_files` directory, or the whole relative path.
fn asset_subpath(relative: &str) -> PathBuf {
    let parts: Vec<&str> = Path::new(relative)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();

    let start = match parts.first() {
        Some(first) if first.ends_with("_files") && parts.len() > 1 => 1,
        _ => 0,
    };
    parts[start..].iter().collect()
}
