//! # Flat Type Table
//!
//! Per-file staging map from node offset to a normalized type fragment.
//!
//! One map holds every category, so an offset names at most one kind of
//! fragment and "what is at this offset" is a single `match`. The table is
//! rebuilt for each input file and dropped once that file is resolved.

use std::collections::HashMap;
use std::fmt;

use crate::node::Offset;

/// Name used for pointers and references without a target type.
pub const VOID: &str = "void";

/// Target of a pointer or reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef
{
    Offset(Offset),
    Void,
}

impl fmt::Display for TypeRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            TypeRef::Offset(offset) => write!(f, "{offset}"),
            TypeRef::Void => write!(f, "{VOID}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseFragment
{
    pub name: String,
    pub size: u64,
    pub encoding: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSizedFragment
{
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationFragment
{
    pub name: String,
    pub size: u64,
    pub encoding: u64,
    pub inner: Offset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayFragment
{
    /// Element type
    pub inner: Offset,
    /// One subrange child per dimension, outermost first
    pub subranges: Vec<Offset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubrangeFragment
{
    pub inner: Offset,
    pub lower: i64,
    pub upper: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedefFragment
{
    pub name: String,
    pub inner: Option<Offset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndirectFragment
{
    pub size: u64,
    pub inner: TypeRef,
}

/// Normalized raw fields of one type-describing node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeFragment
{
    Base(BaseFragment),
    String(NamedSizedFragment),
    Structure(NamedSizedFragment),
    Union(NamedSizedFragment),
    Enumeration(EnumerationFragment),
    Array(ArrayFragment),
    Subrange(SubrangeFragment),
    Typedef(TypedefFragment),
    Pointer(IndirectFragment),
    Reference(IndirectFragment),
    Const(Offset),
}

impl TypeFragment
{
    /// Name carried directly by this fragment.
    #[must_use]
    pub fn name(&self) -> Option<&str>
    {
        match self {
            TypeFragment::Base(base) => Some(base.name.as_str()),
            TypeFragment::String(named) | TypeFragment::Structure(named) | TypeFragment::Union(named) => {
                Some(named.name.as_str())
            }
            TypeFragment::Enumeration(enumeration) => Some(enumeration.name.as_str()),
            TypeFragment::Typedef(typedef) => Some(typedef.name.as_str()),
            TypeFragment::Array(_)
            | TypeFragment::Subrange(_)
            | TypeFragment::Pointer(_)
            | TypeFragment::Reference(_)
            | TypeFragment::Const(_) => None,
        }
    }

    /// Size carried directly by this fragment.
    #[must_use]
    pub fn size(&self) -> Option<u64>
    {
        match self {
            TypeFragment::Base(base) => Some(base.size),
            TypeFragment::String(named) | TypeFragment::Structure(named) | TypeFragment::Union(named) => {
                Some(named.size)
            }
            TypeFragment::Enumeration(enumeration) => Some(enumeration.size),
            TypeFragment::Pointer(indirect) | TypeFragment::Reference(indirect) => Some(indirect.size),
            TypeFragment::Array(_) | TypeFragment::Subrange(_) | TypeFragment::Typedef(_) | TypeFragment::Const(_) => {
                None
            }
        }
    }

    /// Next link in the chain when this fragment lacks a name or size.
    #[must_use]
    pub fn inner(&self) -> Option<TypeRef>
    {
        match self {
            TypeFragment::Enumeration(enumeration) => Some(TypeRef::Offset(enumeration.inner)),
            TypeFragment::Array(array) => Some(TypeRef::Offset(array.inner)),
            TypeFragment::Subrange(subrange) => Some(TypeRef::Offset(subrange.inner)),
            TypeFragment::Typedef(typedef) => typedef.inner.map(TypeRef::Offset),
            TypeFragment::Pointer(indirect) | TypeFragment::Reference(indirect) => Some(indirect.inner),
            TypeFragment::Const(inner) => Some(TypeRef::Offset(*inner)),
            TypeFragment::Base(_) | TypeFragment::String(_) | TypeFragment::Structure(_) | TypeFragment::Union(_) => None,
        }
    }

    #[must_use]
    pub fn category(&self) -> &'static str
    {
        match self {
            TypeFragment::Base(_) => "base type",
            TypeFragment::String(_) => "string type",
            TypeFragment::Structure(_) => "structure",
            TypeFragment::Union(_) => "union",
            TypeFragment::Enumeration(_) => "enumeration",
            TypeFragment::Array(_) => "array type",
            TypeFragment::Subrange(_) => "subrange type",
            TypeFragment::Typedef(_) => "typedef",
            TypeFragment::Pointer(_) => "pointer type",
            TypeFragment::Reference(_) => "reference type",
            TypeFragment::Const(_) => "const type",
        }
    }
}

/// Offset-keyed fragments for one input file.
#[derive(Debug, Default)]
pub struct FlatTypeTable
{
    fragments: HashMap<Offset, TypeFragment>,
}

impl FlatTypeTable
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Record the fragment for `offset`, replacing an earlier record for the same node.
    pub fn insert(&mut self, offset: Offset, fragment: TypeFragment)
    {
        self.fragments.insert(offset, fragment);
    }

    #[must_use]
    pub fn get(&self, offset: Offset) -> Option<&TypeFragment>
    {
        self.fragments.get(&offset)
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.fragments.is_empty()
    }

    #[must_use]
    pub fn array(&self, offset: Offset) -> Option<&ArrayFragment>
    {
        match self.get(offset) {
            Some(TypeFragment::Array(array)) => Some(array),
            _ => None,
        }
    }

    #[must_use]
    pub fn subrange(&self, offset: Offset) -> Option<&SubrangeFragment>
    {
        match self.get(offset) {
            Some(TypeFragment::Subrange(subrange)) => Some(subrange),
            _ => None,
        }
    }

    #[must_use]
    pub fn typedef(&self, offset: Offset) -> Option<&TypedefFragment>
    {
        match self.get(offset) {
            Some(TypeFragment::Typedef(typedef)) => Some(typedef),
            _ => None,
        }
    }

    #[must_use]
    pub fn pointer(&self, offset: Offset) -> Option<&IndirectFragment>
    {
        match self.get(offset) {
            Some(TypeFragment::Pointer(pointer)) => Some(pointer),
            _ => None,
        }
    }

    #[must_use]
    pub fn reference(&self, offset: Offset) -> Option<&IndirectFragment>
    {
        match self.get(offset) {
            Some(TypeFragment::Reference(reference)) => Some(reference),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_offset_names_one_category()
    {
        let mut table = FlatTypeTable::new();
        table.insert(Offset(0x10), TypeFragment::Const(Offset(0x20)));
        table.insert(
            Offset(0x10),
            TypeFragment::Typedef(TypedefFragment {
                name: "u8".into(),
                inner: Some(Offset(0x20)),
            }),
        );
        assert_eq!(table.len(), 1);
        assert!(table.typedef(Offset(0x10)).is_some());
        assert!(table.pointer(Offset(0x10)).is_none());
    }

    #[test]
    fn test_fragment_accessors()
    {
        let pointer = TypeFragment::Pointer(IndirectFragment {
            size: 8,
            inner: TypeRef::Void,
        });
        assert_eq!(pointer.name(), None);
        assert_eq!(pointer.size(), Some(8));
        assert_eq!(pointer.inner(), Some(TypeRef::Void));

        let typedef = TypeFragment::Typedef(TypedefFragment {
            name: "handle_t".into(),
            inner: None,
        });
        assert_eq!(typedef.name(), Some("handle_t"));
        assert_eq!(typedef.size(), None);
        assert_eq!(typedef.inner(), None);
    }
}
