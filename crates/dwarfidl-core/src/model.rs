//! # Type Model
//!
//! Namespace-organized skeleton built by the walker and completed by the
//! resolver.
//!
//! Creation is idempotent everywhere: asking a [`Namespace`] for a child
//! namespace, structure, union or enumeration by name returns the existing
//! entry when there is one. This is how the same qualified entity seen in
//! several compilation units or files converges to a single object.
//!
//! Entities created by the walker are marked *pending*; the resolver only
//! touches pending entities and clears the mark, so a later file's flat type
//! table is never applied to offsets from an earlier file.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::node::Offset;

/// Member or base-structure accessibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility
{
    Public,
    Protected,
    Private,
}

impl Accessibility
{
    /// Decode a `DW_ACCESS_*` code.
    #[must_use]
    pub fn from_code(code: u64) -> Option<Self>
    {
        match code {
            1 => Some(Accessibility::Public),
            2 => Some(Accessibility::Protected),
            3 => Some(Accessibility::Private),
            _ => None,
        }
    }
}

impl fmt::Display for Accessibility
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            Accessibility::Public => "public",
            Accessibility::Protected => "protected",
            Accessibility::Private => "private",
        };
        write!(f, "{label}")
    }
}

/// Inclusive bounds of one array dimension or scalar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds
{
    pub lower: i64,
    pub upper: i64,
}

impl Bounds
{
    #[must_use]
    pub fn new(lower: i64, upper: i64) -> Self
    {
        Self { lower, upper }
    }

    /// Number of elements, `upper - lower + 1`, never negative.
    #[must_use]
    pub fn count(&self) -> u64
    {
        let span = i128::from(self.upper) - i128::from(self.lower) + 1;
        u64::try_from(span.max(0)).unwrap_or(u64::MAX)
    }
}

/// A structure or union data member.
#[derive(Debug, Clone, PartialEq)]
pub struct Member
{
    pub name: String,
    /// Raw `DW_AT_type` offset, meaningful only within the file that produced it
    pub type_offset: Offset,
    /// Resolved display name, e.g. `"array of int"` or `"char pointer"`
    pub type_name: Option<String>,
    /// Absent for static members
    pub byte_offset: Option<u64>,
    /// Absent for bitfields
    pub byte_size: Option<u64>,
    pub bit_offset: Option<u64>,
    pub bit_size: Option<u64>,
    /// One entry per array dimension, or one for a bounded scalar range
    pub bounds: SmallVec<[Bounds; 2]>,
    pub accessibility: Accessibility,
    pub is_static: bool,
    /// Number of pointer hops between the member and its named type
    pub indirection: u32,
    pub is_reference: bool,
    pub(crate) pending: bool,
}

impl Member
{
    #[must_use]
    pub fn new(name: impl Into<String>, type_offset: Offset, accessibility: Accessibility) -> Self
    {
        Self {
            name: name.into(),
            type_offset,
            type_name: None,
            byte_offset: None,
            byte_size: None,
            bit_offset: None,
            bit_size: None,
            bounds: SmallVec::new(),
            accessibility,
            is_static: false,
            indirection: 0,
            is_reference: false,
            pending: true,
        }
    }

    #[must_use]
    pub fn is_bitfield(&self) -> bool
    {
        self.bit_size.is_some()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool
    {
        self.pending
    }
}

/// Inheritance edge from a derived structure to one of its bases.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseStructure
{
    pub type_offset: Offset,
    pub type_name: Option<String>,
    pub accessibility: Accessibility,
    /// Byte offset of the base inside the derived layout
    pub byte_offset: Option<u64>,
    pub(crate) pending: bool,
}

impl BaseStructure
{
    #[must_use]
    pub fn new(type_offset: Offset, accessibility: Accessibility, byte_offset: Option<u64>) -> Self
    {
        Self {
            type_offset,
            type_name: None,
            accessibility,
            byte_offset,
            pending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure
{
    pub name: String,
    pub byte_size: u64,
    pub members: IndexMap<String, Member>,
    pub base_structures: Vec<BaseStructure>,
}

impl Structure
{
    #[must_use]
    pub fn new(name: impl Into<String>, byte_size: u64) -> Self
    {
        Self {
            name: name.into(),
            byte_size,
            ..Self::default()
        }
    }

    /// Insert or replace a member by name. Replacement keeps the original position.
    pub fn upsert_member(&mut self, member: Member)
    {
        self.members.insert(member.name.clone(), member);
    }

    /// Fold one observation of this structure into the accumulated entry.
    ///
    /// Members are upserted. Base edges are replaced only when the observation
    /// carries any, so a bare declaration does not erase a definition's edges.
    pub fn absorb(&mut self, members: Vec<Member>, base_structures: Vec<BaseStructure>)
    {
        for member in members {
            self.upsert_member(member);
        }
        if !base_structures.is_empty() {
            self.base_structures = base_structures;
        }
    }

    /// Merge another structure with the same unqualified name into this one.
    pub fn merge(&mut self, other: Structure)
    {
        if self.byte_size == 0 {
            self.byte_size = other.byte_size;
        }
        self.absorb(other.members.into_values().collect(), other.base_structures);
    }

    pub fn static_members(&self) -> impl Iterator<Item = &Member>
    {
        self.members.values().filter(|member| member.is_static)
    }

    pub fn instance_members(&self) -> impl Iterator<Item = &Member>
    {
        self.members.values().filter(|member| !member.is_static)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Union
{
    pub name: String,
    pub byte_size: u64,
    pub members: IndexMap<String, Member>,
}

impl Union
{
    #[must_use]
    pub fn new(name: impl Into<String>, byte_size: u64) -> Self
    {
        Self {
            name: name.into(),
            byte_size,
            members: IndexMap::new(),
        }
    }

    pub fn upsert_member(&mut self, member: Member)
    {
        self.members.insert(member.name.clone(), member);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enumeration
{
    pub name: String,
    /// Raw offset of the underlying integer type
    pub type_offset: Offset,
    pub type_name: Option<String>,
    pub byte_size: u64,
    /// `DW_ATE_*` encoding code
    pub encoding: u64,
    pub values: IndexMap<String, i64>,
    pub(crate) pending: bool,
}

impl Enumeration
{
    #[must_use]
    pub fn new(name: impl Into<String>, byte_size: u64, type_offset: Offset, encoding: u64) -> Self
    {
        Self {
            name: name.into(),
            type_offset,
            type_name: None,
            byte_size,
            encoding,
            values: IndexMap::new(),
            pending: true,
        }
    }

    pub fn add_value(&mut self, name: impl Into<String>, value: i64)
    {
        self.values.insert(name.into(), value);
    }
}

/// A namespace and everything declared directly inside it. The root has an empty name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Namespace
{
    pub name: String,
    pub namespaces: IndexMap<String, Namespace>,
    pub structures: IndexMap<String, Structure>,
    pub unions: IndexMap<String, Union>,
    pub enumerations: IndexMap<String, Enumeration>,
}

impl Namespace
{
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self
    {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn root() -> Self
    {
        Self::new("")
    }

    /// Fetch or create the child namespace `name`.
    pub fn create_namespace(&mut self, name: &str) -> &mut Namespace
    {
        self.namespaces
            .entry(name.to_owned())
            .or_insert_with(|| Namespace::new(name))
    }

    /// Fetch or create the structure `name`.
    ///
    /// The size is taken from the first observation that knows it; a known
    /// size is never overwritten.
    pub fn create_structure(&mut self, name: &str, byte_size: u64) -> &mut Structure
    {
        let structure = self
            .structures
            .entry(name.to_owned())
            .or_insert_with(|| Structure::new(name, byte_size));
        if structure.byte_size == 0 {
            structure.byte_size = byte_size;
        }
        structure
    }

    /// Fetch or create the union `name`.
    pub fn create_union(&mut self, name: &str, byte_size: u64) -> &mut Union
    {
        let union = self
            .unions
            .entry(name.to_owned())
            .or_insert_with(|| Union::new(name, byte_size));
        if union.byte_size == 0 {
            union.byte_size = byte_size;
        }
        union
    }

    /// Fetch or create the enumeration `name`.
    ///
    /// Re-observing an enumeration refreshes its raw type offset, because the
    /// offset only means something inside the file being processed.
    pub fn create_enumeration(&mut self, name: &str, byte_size: u64, type_offset: Offset, encoding: u64) -> &mut Enumeration
    {
        let enumeration = self
            .enumerations
            .entry(name.to_owned())
            .or_insert_with(|| Enumeration::new(name, byte_size, type_offset, encoding));
        enumeration.type_offset = type_offset;
        enumeration.pending = true;
        enumeration
    }

    /// Insert a structure under its own name, merging with an existing entry.
    pub fn insert_structure(&mut self, structure: Structure)
    {
        match self.structures.get_mut(&structure.name) {
            Some(existing) => existing.merge(structure),
            None => {
                self.structures.insert(structure.name.clone(), structure);
            }
        }
    }

    /// Walk a path of child namespace names.
    #[must_use]
    pub fn namespace_at(&self, path: &[String]) -> Option<&Namespace>
    {
        let mut namespace = self;
        for segment in path {
            namespace = namespace.namespaces.get(segment.as_str())?;
        }
        Some(namespace)
    }

    pub fn namespace_at_mut(&mut self, path: &[String]) -> Option<&mut Namespace>
    {
        let mut namespace = self;
        for segment in path {
            namespace = namespace.namespaces.get_mut(segment.as_str())?;
        }
        Some(namespace)
    }

    /// Total number of structures in this namespace and all descendants.
    #[must_use]
    pub fn structure_count(&self) -> usize
    {
        self.structures.len() + self.namespaces.values().map(Namespace::structure_count).sum::<usize>()
    }
}
