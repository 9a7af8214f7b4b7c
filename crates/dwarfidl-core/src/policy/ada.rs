//! Ada producers (GNAT).
//!
//! GNAT emits tagged-record inheritance as an ordinary member named
//! [`ADA_PARENT_MEMBER`] and places every record in the unit root with a
//! `package__record` mangled name. Records from the Ada runtime carry an
//! `ada__` prefix and are never part of the user's model.

use crate::error::Result;
use crate::language::Language;
use crate::model::Accessibility;
use crate::node::{Attr, DieRef};
use crate::policy::{DefaultPolicy, TypePolicy};

/// Member name GNAT uses for the embedded parent record.
pub const ADA_PARENT_MEMBER: &str = "_parent";

/// Marker of records that belong to the Ada runtime.
const ADA_RUNTIME_MARKER: &str = "ada__";

#[derive(Debug, Clone, Copy)]
pub struct AdaPolicy
{
    base: DefaultPolicy,
}

impl AdaPolicy
{
    #[must_use]
    pub fn new(version: u16) -> Self
    {
        Self {
            base: DefaultPolicy::new(version, Language::Ada),
        }
    }
}

impl TypePolicy for AdaPolicy
{
    fn version(&self) -> u16
    {
        self.base.version()
    }

    fn language(&self) -> Language
    {
        Language::Ada
    }

    fn is_inheritance(&self, die: DieRef<'_>) -> bool
    {
        die.is_member() && matches!(die.name(), Ok(ADA_PARENT_MEMBER))
    }

    fn valid_structure(&self, die: DieRef<'_>) -> bool
    {
        self.base.valid_structure(die)
            && self
                .type_name(die)
                .is_ok_and(|name| !name.contains(ADA_RUNTIME_MARKER))
    }

    /// DWARF 2 GNAT output leaves parents public unless stated otherwise.
    fn inheritance_accessibility(&self, die: DieRef<'_>) -> Result<Accessibility>
    {
        if self.version() == 2 && !die.has(Attr::Accessibility) {
            return Ok(Accessibility::Public);
        }
        self.base.inheritance_accessibility(die)
    }

    fn default_lower_bound(&self) -> i64
    {
        1
    }
}
