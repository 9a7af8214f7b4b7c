//! # dwarfidl-core
//!
//! Type-graph resolution over DWARF debug information.
//!
//! This crate turns the debug-info trees of compiled object files into a
//! namespace-organized model of structures, unions, enumerations and their
//! members, with every member's type chased to a terminal, sized, named type.
//! The model serializes as JIDL, which code generators consume.
//!
//! ## Passes
//!
//! 1. **Skeleton** ([`walker`]): one depth-first walk per compilation unit
//!    builds the namespace skeleton and a flat, offset-keyed table of raw
//!    type fragments ([`table`]).
//! 2. **Ada dispersal** ([`disperse`]): records with `__`-expanded names are
//!    moved into the package namespaces their names describe.
//! 3. **Resolution** ([`resolver`]): every pending member, base edge and
//!    enumeration is completed against the file's table.
//!
//! Producer differences (language, DWARF 2 accessibility rules, array lower
//! bounds, Ada inheritance) are isolated in [`policy`] objects selected once
//! per compilation unit.
//!
//! ## Example
//!
//! ```no_run
//! use dwarfidl_core::{jidl, Pipeline, PipelineOptions};
//!
//! let mut pipeline = Pipeline::new(PipelineOptions::default());
//! pipeline.process_file("target/debug/libshapes.o")?;
//! println!("{}", jidl::to_string_pretty(pipeline.namespace())?);
//! # Ok::<(), dwarfidl_core::DwarfIdlError>(())
//! ```

pub mod disperse;
pub mod error;
pub mod inputs;
pub mod jidl;
pub mod language;
pub mod loader;
pub mod model;
pub mod node;
pub mod pipeline;
pub mod policy;
pub mod resolver;
pub mod table;
pub mod walker;

// Re-export commonly used types
pub use error::{DwarfIdlError, Result};
pub use language::Language;
pub use loader::{CompileUnit, DebugInfoFile};
pub use model::{Accessibility, Enumeration, Member, Namespace, Structure, Union};
pub use node::{Attr, AttrValue, DieRef, NodeTree, Offset, Tag};
pub use inputs::{read_file_list, InputSelection};
pub use pipeline::{Pipeline, PipelineOptions, PipelineStats};
pub use policy::{create_policy, TypePolicy};
