//! Registry tying together every loaded [`Archive`] and standalone asset,
//! resolving `archive:` URLs and cross-file [`ObjectPointer`] references.
//!
//! Loaded archives live in an arena (`Vec<Box<Archive>>`); callers and
//! [`ObjectPointer`]s address an asset by an [`AssetLocation`] index pair
//! rather than holding an owning reference to it, so resolving a pointer
//! never has to fight the borrow checker over who owns what (see
//! `DESIGN.md`'s note on the `ObjectInfo`/`SerializedFile` reference cycle).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::archive::Archive;
use crate::error::{Error, Result};
use crate::serialized_file::SerializedFile;
use crate::value::{ObjectPointer, Value};

/// Locates one asset within an [`Environment`]'s arena of loaded archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetLocation {
    archive_index: usize,
    node_index: usize,
}

/// A process-wide (or, in this crate, caller-owned) registry of loaded
/// bundles and the assets they contain, keyed by lowercased node name.
pub struct Environment {
    archives: Vec<Box<Archive>>,
    archive_paths: Vec<PathBuf>,
    assets: HashMap<String, AssetLocation>,
    base_path: PathBuf,
}

impl Environment {
    /// Creates an environment that resolves bare asset names (not found in
    /// any already-loaded archive) relative to `base_path`.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            archives: Vec::new(),
            archive_paths: Vec::new(),
            assets: HashMap::new(),
            base_path: base_path.into(),
        }
    }

    /// Loads and registers the archive at `path`, unless it's already
    /// loaded (identity dedup by canonicalized absolute path), in which
    /// case the existing archive's index is returned.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let canon = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if let Some(index) = self.archive_paths.iter().position(|p| *p == canon) {
            return Ok(index);
        }

        let file = std::fs::File::open(path).map_err(Error::from)?;
        let archive = Archive::open(file)?;
        let index = self.archives.len();

        for node_index in 0..archive.node_count() {
            if archive.is_resource(node_index) {
                continue;
            }
            if let Some(name) = archive.node_name(node_index) {
                self.assets
                    .entry(name.to_lowercase())
                    .or_insert(AssetLocation { archive_index: index, node_index });
            }
        }

        log::info!("loaded archive {} ({} assets)", canon.display(), archive.node_count());
        self.archives.push(Box::new(archive));
        self.archive_paths.push(canon);
        Ok(index)
    }

    #[must_use]
    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    pub fn archive(&self, index: usize) -> Result<&Archive> {
        self.archives
            .get(index)
            .map(Box::as_ref)
            .ok_or_else(|| Error::not_found(format!("no archive at index {index}")))
    }

    /// Parses the asset at `loc`.
    pub fn serialized_file(&self, loc: AssetLocation) -> Result<SerializedFile<'_>> {
        self.archive(loc.archive_index)?.serialized_file(loc.node_index)
    }

    /// Looks up an asset by its bare (CAB-prefixed or plain) file name,
    /// discovering sibling files on disk if it isn't already registered.
    pub fn get_asset_by_filename(&mut self, name: &str) -> Result<AssetLocation> {
        let key = name.to_lowercase();
        if let Some(loc) = self.assets.get(&key) {
            return Ok(*loc);
        }

        let candidate = self.base_path.join(name);
        if candidate.is_file() {
            self.load(&candidate)?;
            if let Some(loc) = self.assets.get(&key) {
                return Ok(*loc);
            }
        }

        self.discover(name)?;
        self.assets
            .get(&key)
            .copied()
            .ok_or_else(|| Error::not_found(format!("asset {name} not found")))
    }

    /// Scans the directory of every already-loaded archive for a sibling
    /// whose own stem makes `name == "CAB-" + stem`, loading any match.
    pub fn discover(&mut self, name: &str) -> Result<()> {
        let key = name.to_lowercase();
        log::trace!("discovering CAB sibling for requested asset {name}");

        let dirs: Vec<PathBuf> = self
            .archive_paths
            .iter()
            .filter_map(|p| p.parent().map(Path::to_path_buf))
            .collect();

        for dir in dirs {
            let Ok(entries) = std::fs::read_dir(&dir) else { continue };
            for entry in entries.flatten() {
                let path = entry.path();
                let Some(entry_stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
                if key == format!("cab-{}", entry_stem.to_lowercase()) {
                    self.load(&path)?;
                }
            }
        }
        Ok(())
    }

    /// Resolves an `archive:/<archive-name>/<asset-name>` URL (both path
    /// segments case-insensitive).
    pub fn get_asset(&mut self, url: &str) -> Result<AssetLocation> {
        let rest = url
            .strip_prefix("archive:")
            .ok_or_else(|| Error::unsupported(format!("unsupported url scheme: {url}")))?
            .trim_start_matches('/');

        let mut parts = rest.splitn(2, '/');
        let archive_name = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::corrupt("malformed archive url: missing archive name"))?
            .to_lowercase();
        let asset_name = parts
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::corrupt("malformed archive url: missing asset name"))?
            .to_lowercase();

        let mut archive_index = self.find_archive_by_name(&archive_name);
        if archive_index.is_none() {
            self.discover(&archive_name)?;
            archive_index = self.find_archive_by_name(&archive_name);
        }
        let archive_index =
            archive_index.ok_or_else(|| Error::not_found(format!("archive {archive_name} not found")))?;

        let archive = &self.archives[archive_index];
        let node_index = (0..archive.node_count())
            .find(|&i| archive.node_name(i).is_some_and(|n| n.to_lowercase() == asset_name))
            .ok_or_else(|| Error::not_found(format!("asset {asset_name} not found in archive {archive_name}")))?;

        Ok(AssetLocation { archive_index, node_index })
    }

    /// Resolves an `archive:` URL's archive segment against each loaded
    /// archive's own declared name (the first node's name for `UnityFS`, the
    /// bundle name for `UnityRaw`/`UnityWeb`) rather than its on-disk file
    /// name, matching spec §4.7.
    fn find_archive_by_name(&self, name: &str) -> Option<usize> {
        self.archives.iter().position(|a| a.name.to_lowercase() == name)
    }

    /// Resolves a `PPtr` emitted while reading an object in the asset at
    /// `source`, returning the decoded value it points to.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `pointer` is null or its target asset/object
    /// can't be located; propagates [`Error::Corrupt`] from a malformed
    /// `asset_refs` index.
    pub fn resolve_pointer(&mut self, source: AssetLocation, pointer: ObjectPointer) -> Result<Value> {
        if pointer.is_null() {
            return Err(Error::not_found("cannot resolve a null pointer"));
        }

        if pointer.file_id == 0 {
            return self.serialized_file(source)?.read_object(pointer.path_id);
        }

        let file_path = {
            let file = self.serialized_file(source)?;
            let index = usize::try_from(pointer.file_id)
                .map_err(|_| Error::corrupt("negative file_id"))?
                .checked_sub(1)
                .ok_or_else(|| Error::corrupt("file_id 0 should have been handled above"))?;
            file.asset_refs
                .get(index)
                .ok_or_else(|| Error::not_found("asset_ref index out of range"))?
                .file_path
                .clone()
        };

        log::debug!("resolving cross-asset pointer into {file_path} (path_id {})", pointer.path_id);
        let target_loc = self.get_asset_by_filename(&file_path)?;
        self.serialized_file(target_loc)?.read_object(pointer.path_id)
    }
}
