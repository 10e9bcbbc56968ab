//! Icon path resolution.
//!
//! Icons are referenced in two ways: as a (possibly deeply wrapped) reference to
//! an `/images/...` string, or as a bare engine token such as
//! `/Game/UI/Icons/T_Knife_Icon.T_Knife_Icon` whose basename matches one of the
//! pool's image files. The second case is handled by a basename index built
//! once from every image path in the pool.

use std::collections::HashMap;

use serde_json::Value;

use super::resolver::Resolver;

/// Lower-cased basename (without extension) of a `/`-separated path.
///
/// `"/images/icons/T_Knife.webp"` becomes `"t_knife"`.
pub fn basename_key(path: &str) -> String {
    let base = path.rsplit('/').next().unwrap_or(path);
    let stem = match base.rfind('.') {
        Some(pos) if !base[..pos].chars().all(|c| c == '.') => &base[..pos],
        _ => base,
    };
    stem.to_lowercase()
}

/// Lookup table from basename to full image path.
#[derive(Debug, Clone, Default)]
pub struct ImageIndex<'a> {
    /// `None` marks a basename shared by several distinct paths.
    by_basename: HashMap<String, Option<&'a str>>,
    /// Every image path, in pool order.
    paths: Vec<&'a str>,
}

impl<'a> ImageIndex<'a> {
    pub fn build(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut by_basename: HashMap<String, Option<&'a str>> = HashMap::new();
        let mut all = Vec::new();

        for path in paths {
            all.push(path);
            by_basename
                .entry(basename_key(path))
                .and_modify(|slot| {
                    if slot.is_some_and(|existing| existing != path) {
                        *slot = None;
                    }
                })
                .or_insert(Some(path));
        }

        Self {
            by_basename,
            paths: all,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Exact basename match. Ambiguous basenames never match.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.by_basename.get(key).copied().flatten()
    }

    /// Resolve a token to a single image path.
    ///
    /// Tries the exact basename first, then accepts a substring match only when
    /// exactly one path contains the token.
    pub fn lookup(&self, token: &str) -> Option<&'a str> {
        if token.is_empty() {
            return None;
        }
        if let Some(path) = self.get(token) {
            return Some(path);
        }

        let mut matches = self
            .paths
            .iter()
            .filter(|p| p.to_lowercase().contains(token));
        let first = matches.next()?;
        if matches.any(|p| p != first) {
            return None;
        }
        Some(*first)
    }
}

/// Resolves icon fields to image paths.
#[derive(Debug, Clone)]
pub struct IconResolver<'a> {
    resolver: Resolver<'a>,
    index: ImageIndex<'a>,
}

impl<'a> IconResolver<'a> {
    pub fn new(resolver: Resolver<'a>) -> Self {
        let index = ImageIndex::build(resolver.pool().image_paths());
        Self { resolver, index }
    }

    /// Find the image path behind an icon field.
    ///
    /// Deep search first; if no `/images/` string is reachable, the field is
    /// read as text and its basename is matched against the index.
    pub fn resolve_icon_path<'v>(&self, reference: &'v Value) -> Option<&'v str>
    where
        'a: 'v,
    {
        if let Some(found) = self.resolver.deep_find_image_path(reference) {
            return Some(found);
        }

        let token = self
            .resolver
            .to_text(reference)
            .or_else(|| self.resolver.to_value(reference).as_str())?;

        self.index.lookup(&basename_key(token))
    }
}
