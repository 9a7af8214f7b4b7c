//! # Pipeline
//!
//! Drives input files through the two passes and accumulates one output
//! namespace tree.
//!
//! Files are processed strictly in order. For each file a fresh
//! [`FlatTypeTable`] is built by walking every compilation unit with the
//! policy selected for it; Ada records are then dispersed into their package
//! namespaces, and finally every entity the file created or re-observed is
//! resolved against that file's table. The table is dropped before the next
//! file, since offsets are only meaningful inside the file that produced them.

use std::io;
use std::path::Path;

use tracing::{info, warn};

use crate::disperse::disperse_ada_structures;
use crate::error::{DwarfIdlError, Result};
use crate::language::Language;
use crate::loader::{CompileUnit, DebugInfoFile};
use crate::model::Namespace;
use crate::policy::create_policy;
use crate::resolver::TypeResolver;
use crate::table::FlatTypeTable;
use crate::walker::SkeletonBuilder;

/// Library-level knobs for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions
{
    /// Warn about input paths that do not exist instead of failing
    pub lenient_missing_files: bool,
}

/// Counters accumulated over every processed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats
{
    pub files: usize,
    pub missing_files: usize,
    pub units: usize,
    pub skipped_units: usize,
    pub type_fragments: usize,
    pub dispersed: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

/// Accumulates the namespace tree of one run.
#[derive(Debug, Default)]
pub struct Pipeline
{
    options: PipelineOptions,
    namespace: Namespace,
    stats: PipelineStats,
}

impl Pipeline
{
    #[must_use]
    pub fn new(options: PipelineOptions) -> Self
    {
        Self {
            options,
            namespace: Namespace::root(),
            stats: PipelineStats::default(),
        }
    }

    /// Load one object file and run both passes over its units.
    ///
    /// ## Errors
    ///
    /// - `Io`: the file cannot be read (a missing file is only a warning
    ///   with [`PipelineOptions::lenient_missing_files`])
    /// - `Object`, `Dwarf`: the file is not a readable object file
    /// - `MissingAttribute`, `UnknownAccessibilityDefault`: see
    ///   [`Pipeline::process_units`]
    pub fn process_file(&mut self, path: impl AsRef<Path>) -> Result<()>
    {
        let path = path.as_ref();
        let file = match DebugInfoFile::open(path) {
            Ok(file) => file,
            Err(DwarfIdlError::Io(err)) if err.kind() == io::ErrorKind::NotFound && self.options.lenient_missing_files => {
                warn!("Skipping {}: file not found", path.display());
                self.stats.missing_files += 1;
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        info!("Processing {}", path.display());
        self.process_units(file.into_units())?;
        self.stats.files += 1;
        Ok(())
    }

    /// Run both passes over the compilation units of one file.
    ///
    /// Units with an unknown language or no format version are skipped with
    /// a warning. Types that cannot be resolved are counted, not returned.
    ///
    /// ## Errors
    ///
    /// - `MissingAttribute`: a policy read an attribute it did not check
    /// - `UnknownAccessibilityDefault`: a member without accessibility in a
    ///   parent that has no default
    pub fn process_units(&mut self, units: Vec<CompileUnit>) -> Result<()>
    {
        let mut table = FlatTypeTable::new();
        let mut saw_ada = false;

        for mut unit in units {
            let policy = match create_policy(unit.version, unit.tree.root()) {
                Ok(policy) => policy,
                Err(err) if err.is_unit_skip() => {
                    warn!("Skipping compilation unit at {}: {err}", unit.offset);
                    self.stats.skipped_units += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };
            saw_ada |= policy.language() == Language::Ada;

            SkeletonBuilder::new(policy.as_ref(), &mut table).build_unit(&mut unit.tree, &mut self.namespace)?;
            self.stats.units += 1;
        }
        self.stats.type_fragments += table.len();

        if saw_ada {
            self.stats.dispersed += disperse_ada_structures(&mut self.namespace);
        }

        let resolution = TypeResolver::new(&table).resolve_namespace(&mut self.namespace)?;
        if resolution.unresolved > 0 {
            warn!("{} entities could not be resolved", resolution.unresolved);
        }
        self.stats.resolved += resolution.resolved;
        self.stats.unresolved += resolution.unresolved;
        Ok(())
    }

    #[must_use]
    pub fn namespace(&self) -> &Namespace
    {
        &self.namespace
    }

    #[must_use]
    pub fn stats(&self) -> PipelineStats
    {
        self.stats
    }

    #[must_use]
    pub fn into_namespace(self) -> Namespace
    {
        self.namespace
    }
}
