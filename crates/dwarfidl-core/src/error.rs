//! # Error Types
//!
//! General error handling for the type-model pipeline.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

use crate::node::{Attr, Offset};

/// Main error type for pipeline operations
///
/// Not every variant aborts a run. The pipeline decides per category:
///
/// 1. **Per-unit errors**: `UnknownLanguage`, `MissingVersion` skip one compilation unit
/// 2. **Per-entity errors**: `TypeNotFound`, `TypeChainTooDeep` stop resolution of one member
/// 3. **Contract errors**: `MissingAttribute`, `UnknownAccessibilityDefault` abort the current file
/// 4. **Input errors**: `Dwarf`, `Object`, `Io` come from reading the binary, `MissingInput` from input selection
/// 5. **Output errors**: `Json` from the JIDL boundary
#[derive(Error, Debug)]
pub enum DwarfIdlError
{
    /// The compilation unit names a producer language that has no policy
    #[error("Unknown producer language 0x{code:04x} in unit at {offset}")]
    UnknownLanguage
    {
        /// Raw `DW_AT_language` code
        code: u16,
        /// Offset of the compilation unit root
        offset: Offset,
    },

    /// An attribute getter was called without checking `has` first
    ///
    /// This is an implementation bug inside a policy or builder, never a data
    /// condition, so it is propagated instead of skipped.
    #[error("Missing attribute {attribute} on node at {offset}")]
    MissingAttribute
    {
        /// Attribute that was requested
        attribute: Attr,
        /// Offset of the node it was requested on
        offset: Offset,
    },

    /// A type offset has no fragment in the flat type table
    #[error("Type not found for offset {0}")]
    TypeNotFound(Offset),

    /// A chain of type references did not terminate
    #[error("Type chain starting at {0} is too deep")]
    TypeChainTooDeep(Offset),

    /// Member has no accessibility attribute and its parent has no default
    #[error("Unknown default accessibility for node at {0}")]
    UnknownAccessibilityDefault(Offset),

    /// The compilation unit root carries no format version
    #[error("Compilation unit at {0} has no format version")]
    MissingVersion(Offset),

    /// DWARF parsing failed
    #[error("DWARF error: {0}")]
    Dwarf(String),

    /// The object container could not be parsed
    #[error("Object file error: {0}")]
    Object(String),

    /// An input directory, manifest or ignore entry does not exist
    #[error("Input not found: {}", .0.display())]
    MissingInput(std::path::PathBuf),

    /// Invalid argument passed to a pipeline function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error (for file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JIDL serialization or parsing failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DwarfIdlError
{
    /// Errors that only affect one member, enumeration or base edge.
    #[must_use]
    pub fn is_local(&self) -> bool
    {
        matches!(self, Self::TypeNotFound(_) | Self::TypeChainTooDeep(_))
    }

    /// Errors that skip one compilation unit and let the file continue.
    #[must_use]
    pub fn is_unit_skip(&self) -> bool
    {
        matches!(self, Self::UnknownLanguage { .. } | Self::MissingVersion(_))
    }
}

/// Map a gimli DWARF error to a `DwarfIdlError` with context.
pub(crate) fn map_dwarf_error(context: &str, err: gimli::Error) -> DwarfIdlError
{
    DwarfIdlError::Dwarf(format!("{context}: {err}"))
}

/// Convenience type alias for `Result<T, DwarfIdlError>`
///
/// ```rust
/// use dwarfidl_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, DwarfIdlError>;
