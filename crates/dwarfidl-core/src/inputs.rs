//! # Input Selection
//!
//! Builds the ordered list of object files for a run.
//!
//! Sources are taken in this order, and the first occurrence of a path wins:
//!
//! 1. explicit object paths
//! 2. object directories, scanned recursively in file-name order for files
//!    with an [`OBJECT_EXTENSIONS`] extension
//! 3. manifest files listing one path per line
//!
//! The ignore side mirrors it: ignored objects, ignored directories (every
//! selected path below them is dropped) and ignore manifests.
//!
//! Explicit object paths are passed through even when they do not exist, so
//! that [`crate::Pipeline`] can apply its own missing-file policy. Directories
//! and manifests must exist unless `ignore_missing` is set.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{DwarfIdlError, Result};

/// File extensions collected from object directories.
pub const OBJECT_EXTENSIONS: &[&str] = &["o", "obj"];

/// Include and ignore lists for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSelection
{
    pub objects: Vec<PathBuf>,
    pub object_dirs: Vec<PathBuf>,
    /// Manifests of objects to include
    pub object_files: Vec<PathBuf>,
    pub ignore_objects: Vec<PathBuf>,
    pub ignore_object_dirs: Vec<PathBuf>,
    /// Manifests of objects to leave out
    pub ignore_object_files: Vec<PathBuf>,
    /// Warn about missing directories, manifests and ignore entries instead of failing
    pub ignore_missing: bool,
}

impl InputSelection
{
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.objects.is_empty() && self.object_dirs.is_empty() && self.object_files.is_empty()
    }

    /// Expand every source and apply the ignore lists.
    ///
    /// ## Errors
    ///
    /// - `MissingInput`: a directory, manifest or ignore entry does not exist
    ///   and `ignore_missing` is not set
    /// - `Io`: a manifest or directory cannot be read
    pub fn resolve(&self) -> Result<Vec<PathBuf>>
    {
        let mut selected = IndexSet::new();
        for object in &self.objects {
            selected.insert(normalize(object));
        }
        for dir in &self.object_dirs {
            selected.extend(self.scan_dir(dir)?);
        }
        for manifest in &self.object_files {
            selected.extend(self.read_manifest(manifest)?);
        }

        let mut ignored = HashSet::new();
        for object in &self.ignore_objects {
            if self.check_exists(object)? {
                ignored.insert(normalize(object));
            }
        }
        for manifest in &self.ignore_object_files {
            for object in self.read_manifest(manifest)? {
                if self.check_exists(&object)? {
                    ignored.insert(object);
                }
            }
        }
        let mut ignored_dirs = Vec::new();
        for dir in &self.ignore_object_dirs {
            if self.check_exists(dir)? {
                ignored_dirs.push(normalize(dir));
            }
        }

        let total = selected.len();
        let inputs: Vec<PathBuf> = selected
            .into_iter()
            .filter(|path| !ignored.contains(path) && !ignored_dirs.iter().any(|dir| path.starts_with(dir)))
            .collect();
        debug!("Selected {} of {total} inputs", inputs.len());
        Ok(inputs)
    }

    fn check_exists(&self, path: &Path) -> Result<bool>
    {
        if path.exists() {
            return Ok(true);
        }
        if self.ignore_missing {
            warn!("Skipping missing input {}", path.display());
            return Ok(false);
        }
        Err(DwarfIdlError::MissingInput(path.to_path_buf()))
    }

    fn scan_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>
    {
        if !self.check_exists(dir)? {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && is_object(entry.path()) {
                found.push(normalize(entry.path()));
            }
        }
        debug!("Found {} objects under {}", found.len(), dir.display());
        Ok(found)
    }

    fn read_manifest(&self, manifest: &Path) -> Result<Vec<PathBuf>>
    {
        if !self.check_exists(manifest)? {
            return Ok(Vec::new());
        }
        Ok(read_file_list(manifest)?.iter().map(|path| normalize(path)).collect())
    }
}

/// Read a manifest: one path per line, blank lines and `#` comments ignored.
/// Relative entries are taken relative to the manifest's directory.
///
/// ## Errors
///
/// - `Io`: the manifest cannot be read
pub fn read_file_list(path: impl AsRef<Path>) -> Result<Vec<PathBuf>>
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(parse_file_list(&text)
        .into_iter()
        .map(|entry| if entry.is_relative() { base.join(entry) } else { entry })
        .collect())
}

fn parse_file_list(text: &str) -> Vec<PathBuf>
{
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect()
}

fn is_object(path: &Path) -> bool
{
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| OBJECT_EXTENSIONS.contains(&extension))
}

/// Canonical form for comparisons; paths that do not exist are kept as given.
fn normalize(path: &Path) -> PathBuf
{
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
