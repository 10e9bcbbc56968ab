//! HTTP asset download with skip-if-present.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use super::AssetFetcher;

/// Downloads assets over HTTP into a local mirror.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    agent: ureq::Agent,
    /// Download even when the local file already exists.
    redownload: bool,
}

impl HttpAssetFetcher {
    pub fn new(redownload: bool) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(60))
            .build();
        Self { agent, redownload }
    }

    fn download(&self, url: &str, local_path: &Path) -> Result<()> {
        let response = self
            .agent
            .get(url)
            .call()
            .with_context(|| format!("GET {url}"))?;

        write_via_partial(&mut response.into_reader(), local_path)
    }
}

/// `knife.webp` downloads to `knife.webp.part`.
fn partial_path(local_path: &Path) -> PathBuf {
    let mut name = local_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Stream `reader` into `local_path` through a `.part` file.
///
/// Only a complete transfer is renamed into place; on any failure the partial
/// file is removed.
fn write_via_partial(reader: &mut dyn Read, local_path: &Path) -> Result<()> {
    let partial = partial_path(local_path);

    let result = (|| -> Result<()> {
        let mut out = fs::File::create(&partial)
            .with_context(|| format!("Failed to create {}", partial.display()))?;
        io::copy(reader, &mut out)
            .with_context(|| format!("Failed to write {}", partial.display()))?;
        drop(out);
        fs::rename(&partial, local_path)
            .with_context(|| format!("Failed to move download to {}", local_path.display()))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

impl Default for HttpAssetFetcher {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AssetFetcher for HttpAssetFetcher {
    fn fetch(&self, url: &str, local_path: &Path) -> bool {
        if url.is_empty() || local_path.as_os_str().is_empty() {
            return false;
        }

        if let Some(parent) = local_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(dir = %parent.display(), error = %e, "cannot create asset directory");
                return false;
            }
        }

        if local_path.exists() && !self.redownload {
            return true;
        }

        match self.download(url, local_path) {
            Ok(()) => {
                tracing::debug!(%url, path = %local_path.display(), "downloaded asset");
                true
            }
            Err(e) => {
                tracing::warn!(%url, error = %format!("{e:#}"), "asset download failed");
                false
            }
        }
    }
}
