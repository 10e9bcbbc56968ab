//! Image asset acquisition.
//!
//! The extractor only computes where an asset lives remotely and where it
//! should live locally ([`AssetLocator`]). Downloading is a separate step driven
//! by an [`AssetFetcher`], run after extraction; its outcome never changes the
//! extracted items.

mod fetch;

use std::path::{Component, Path, PathBuf};

use crate::pool::IMAGE_PREFIX;
use crate::types::Item;

pub use fetch::HttpAssetFetcher;

/// Remote URL and local mirror path for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLink {
    pub url: String,
    pub local_path: PathBuf,
}

impl AssetLink {
    /// Local path with forward slashes, as written into exported items.
    pub fn local_display(&self) -> String {
        self.local_path.to_string_lossy().replace('\\', "/")
    }
}

/// Maps pool image paths to CDN URLs and local mirror paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocator {
    pub cdn_root: String,
    pub asset_version: String,
    pub images_dir: PathBuf,
}

impl AssetLocator {
    pub fn new(
        cdn_root: impl Into<String>,
        asset_version: impl Into<String>,
        images_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cdn_root: cdn_root.into(),
            asset_version: asset_version.into(),
            images_dir: images_dir.into(),
        }
    }

    /// `{cdn_root}{path}?v={version}` and `{images_dir}/{path minus /images/}`.
    ///
    /// Returns `None` for an empty path. Only plain segments reach the local
    /// path; `.`, `..` and roots are dropped so it stays under `images_dir`.
    pub fn link(&self, path: &str) -> Option<AssetLink> {
        if path.is_empty() {
            return None;
        }

        let url = format!("{}{}?v={}", self.cdn_root, path, self.asset_version);

        let sub_path = path.trim_start_matches('/');
        let sub_path = sub_path
            .strip_prefix(&IMAGE_PREFIX[1..])
            .unwrap_or(sub_path);
        let local_path = Path::new(sub_path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(segment) => Some(segment),
                _ => None,
            })
            .fold(self.images_dir.clone(), |acc, segment| acc.join(segment));

        Some(AssetLink { url, local_path })
    }
}

/// Something that can put a remote asset at a local path.
///
/// Returns whether the file is present afterwards. Failures are not errors.
pub trait AssetFetcher {
    fn fetch(&self, url: &str, local_path: &Path) -> bool;
}

impl<F> AssetFetcher for F
where
    F: Fn(&str, &Path) -> bool,
{
    fn fetch(&self, url: &str, local_path: &Path) -> bool {
        self(url, local_path)
    }
}

/// Counters for one acquisition run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Image paths present anywhere in the pool.
    pub pool_images: usize,
    pub items_with_icon: usize,
    pub items_with_tier_icon: usize,
    pub downloaded_ok: usize,
    pub downloaded_ko: usize,
}

impl DownloadStats {
    fn record(&mut self, ok: bool) {
        if ok {
            self.downloaded_ok += 1;
        } else {
            self.downloaded_ko += 1;
        }
    }
}

/// Fetch the icon and tier icon of every item that resolved one.
pub fn acquire_item_assets(
    items: &[Item],
    locator: &AssetLocator,
    fetcher: &dyn AssetFetcher,
    stats: &mut DownloadStats,
) {
    for item in items {
        if let Some(link) = item.icon_path.as_deref().and_then(|p| locator.link(p)) {
            stats.record(fetcher.fetch(&link.url, &link.local_path));
            stats.items_with_icon += 1;
        }
        if let Some(link) = item.tier_icon_path.as_deref().and_then(|p| locator.link(p)) {
            stats.record(fetcher.fetch(&link.url, &link.local_path));
            stats.items_with_tier_icon += 1;
        }
    }
}

/// Fetch every distinct image path, whether or not an item uses it.
pub fn acquire_all<'p>(
    paths: impl IntoIterator<Item = &'p str>,
    locator: &AssetLocator,
    fetcher: &dyn AssetFetcher,
    stats: &mut DownloadStats,
) {
    let mut seen = std::collections::HashSet::new();
    for path in paths {
        if !seen.insert(path) {
            continue;
        }
        if let Some(link) = locator.link(path) {
            stats.record(fetcher.fetch(&link.url, &link.local_path));
        }
    }
}
