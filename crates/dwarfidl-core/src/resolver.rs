//! # Type Resolver
//!
//! Second pass: chase every pending member, base edge and enumeration from
//! its raw type offset through the [`FlatTypeTable`] to a terminal type.
//!
//! Resolution of a member fills in:
//!
//! - the display name: `"int"`, `"array of int"`, `"char pointer pointer"`,
//!   `"Widget pointer reference"`
//! - the byte size (`element size × Π(upper − lower + 1)` for arrays, absent
//!   for bitfields)
//! - the bounds of every array dimension, or of a directly referenced subrange
//! - the pointer hop count and reference flag
//!
//! A missing fragment or an endless chain only affects the entity being
//! resolved: it is logged and counted and resolution continues with its
//! siblings.

use std::ops::AddAssign;

use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::error::{DwarfIdlError, Result};
use crate::model::{BaseStructure, Bounds, Enumeration, Member, Namespace};
use crate::node::Offset;
use crate::table::{FlatTypeTable, TypeFragment, TypeRef, VOID};

/// Upper bound on links followed in one type chain.
pub const MAX_TYPE_REF_DEPTH: usize = 32;

const ARRAY_PREFIX: &str = "array of ";
const POINTER_SUFFIX: &str = " pointer";
const REFERENCE_SUFFIX: &str = " reference";

/// Outcome counters of one resolution pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionStats
{
    pub resolved: usize,
    pub unresolved: usize,
}

impl ResolutionStats
{
    fn record(&mut self, outcome: Result<()>, kind: &str, name: &str) -> Result<()>
    {
        match outcome {
            Ok(()) => self.resolved += 1,
            Err(err) if err.is_local() => {
                warn!("Can't resolve {kind} {name}: {err}");
                self.unresolved += 1;
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }
}

impl AddAssign for ResolutionStats
{
    fn add_assign(&mut self, other: Self)
    {
        self.resolved += other.resolved;
        self.unresolved += other.unresolved;
    }
}

/// Resolves raw offsets against one file's flat type table.
pub struct TypeResolver<'a>
{
    table: &'a FlatTypeTable,
}

impl<'a> TypeResolver<'a>
{
    #[must_use]
    pub fn new(table: &'a FlatTypeTable) -> Self
    {
        Self { table }
    }

    /// Peel one array, then one subrange, then any number of typedefs.
    ///
    /// The returned offset is not guaranteed to be in the table; the name and
    /// size lookups report that.
    ///
    /// ## Errors
    ///
    /// - `TypeChainTooDeep`: more than [`MAX_TYPE_REF_DEPTH`] typedefs in a row
    pub fn resolve_type_offset(&self, offset: Offset) -> Result<Offset>
    {
        let mut current = offset;
        if let Some(array) = self.table.array(current) {
            current = array.inner;
        }
        if let Some(subrange) = self.table.subrange(current) {
            current = subrange.inner;
        }
        for _ in 0..MAX_TYPE_REF_DEPTH {
            match self.table.typedef(current).and_then(|typedef| typedef.inner) {
                Some(inner) => current = inner,
                None => return Ok(current),
            }
        }
        Err(DwarfIdlError::TypeChainTooDeep(offset))
    }

    /// Name of the first fragment in the chain that carries one.
    ///
    /// A pointer or reference to nothing resolves to `"void"`.
    ///
    /// ## Errors
    ///
    /// - `TypeNotFound`: a link in the chain has no fragment
    /// - `TypeChainTooDeep`: the chain does not end
    pub fn resolve_name(&self, offset: Offset) -> Result<String>
    {
        self.follow(offset, |fragment| fragment.name().map(str::to_owned), || Some(VOID.to_owned()))
    }

    /// Size of the first fragment in the chain that carries one.
    ///
    /// ## Errors
    ///
    /// Same as [`TypeResolver::resolve_name`].
    pub fn resolve_size(&self, offset: Offset) -> Result<u64>
    {
        self.follow(offset, TypeFragment::size, || None)
    }

    fn follow<T>(
        &self,
        offset: Offset,
        pick: impl Fn(&TypeFragment) -> Option<T>,
        on_void: impl Fn() -> Option<T>,
    ) -> Result<T>
    {
        let mut current = offset;
        for _ in 0..MAX_TYPE_REF_DEPTH {
            let fragment = self.table.get(current).ok_or(DwarfIdlError::TypeNotFound(current))?;
            if let Some(found) = pick(fragment) {
                return Ok(found);
            }
            match fragment.inner() {
                Some(TypeRef::Offset(inner)) => current = inner,
                Some(TypeRef::Void) => return on_void().ok_or(DwarfIdlError::TypeNotFound(current)),
                None => return Err(DwarfIdlError::TypeNotFound(current)),
            }
        }
        Err(DwarfIdlError::TypeChainTooDeep(offset))
    }

    /// Number of pointer hops starting at `offset`, looking through const and typedef wrappers.
    ///
    /// ## Errors
    ///
    /// - `TypeChainTooDeep`: the chain does not end
    pub fn pointer_chain_count(&self, offset: Offset) -> Result<u32>
    {
        let mut current = offset;
        let mut hops = 0;
        for _ in 0..MAX_TYPE_REF_DEPTH {
            let next = match self.table.get(current) {
                Some(TypeFragment::Pointer(pointer)) => {
                    hops += 1;
                    pointer.inner
                }
                Some(TypeFragment::Const(inner)) => TypeRef::Offset(*inner),
                Some(TypeFragment::Typedef(typedef)) => match typedef.inner {
                    Some(inner) => TypeRef::Offset(inner),
                    None => return Ok(hops),
                },
                _ => return Ok(hops),
            };
            match next {
                TypeRef::Offset(inner) => current = inner,
                TypeRef::Void => return Ok(hops),
            }
        }
        Err(DwarfIdlError::TypeChainTooDeep(offset))
    }

    /// Fill in the resolved fields of one member.
    ///
    /// Nothing is written unless the whole chain resolves.
    ///
    /// ## Errors
    ///
    /// - `TypeNotFound`, `TypeChainTooDeep`: see [`TypeResolver::resolve_name`]
    pub fn resolve_member(&self, member: &mut Member) -> Result<()>
    {
        let raw = member.type_offset;
        let mut terminal = self.resolve_type_offset(raw)?;

        // A typedef of an array surfaces as the terminal; treat it like a direct array.
        let array = match self.table.array(raw) {
            Some(array) => Some(array),
            None => self.table.array(terminal),
        };
        if let Some(array) = self.table.array(terminal) {
            terminal = self.resolve_type_offset(array.inner)?;
        }

        let base_name = self.resolve_name(terminal)?;
        let (hops, is_reference) = match self.table.reference(terminal) {
            Some(reference) => match reference.inner {
                TypeRef::Offset(inner) => (self.pointer_chain_count(inner)?, true),
                TypeRef::Void => (0, true),
            },
            None => (self.pointer_chain_count(terminal)?, false),
        };

        let mut byte_size = if member.is_bitfield() && array.is_none() {
            None
        } else {
            Some(self.resolve_size(terminal)?)
        };

        let mut bounds: SmallVec<[Bounds; 2]> = SmallVec::new();
        if let Some(array) = array {
            for subrange in &array.subranges {
                match self.table.subrange(*subrange) {
                    Some(subrange) => bounds.push(Bounds::new(subrange.lower, subrange.upper)),
                    None => debug!("Array at {raw} has no usable subrange at {subrange}"),
                }
            }
            byte_size = byte_size.map(|element| {
                if bounds.is_empty() {
                    0
                } else {
                    bounds.iter().fold(element, |size, dimension| size.saturating_mul(dimension.count()))
                }
            });
        } else if let Some(subrange) = self.table.subrange(raw) {
            bounds.push(Bounds::new(subrange.lower, subrange.upper));
        }

        let mut type_name = String::new();
        if array.is_some() {
            type_name.push_str(ARRAY_PREFIX);
            member.bit_size = None;
            member.bit_offset = None;
        }
        type_name.push_str(&base_name);
        for _ in 0..hops {
            type_name.push_str(POINTER_SUFFIX);
        }
        if is_reference {
            type_name.push_str(REFERENCE_SUFFIX);
        }

        member.type_name = Some(type_name);
        member.byte_size = byte_size;
        member.bounds = bounds;
        member.indirection = hops;
        member.is_reference = is_reference;
        Ok(())
    }

    /// Resolve the display name of an inheritance edge.
    pub fn resolve_base_structure(&self, base: &mut BaseStructure) -> Result<()>
    {
        let terminal = self.resolve_type_offset(base.type_offset)?;
        base.type_name = Some(self.resolve_name(terminal)?);
        Ok(())
    }

    /// Resolve the name of an enumeration's underlying integer type.
    pub fn resolve_enumeration(&self, enumeration: &mut Enumeration) -> Result<()>
    {
        let terminal = self.resolve_type_offset(enumeration.type_offset)?;
        enumeration.type_name = Some(self.resolve_name(terminal)?);
        Ok(())
    }

    /// Resolve every pending entity in `namespace` and its descendants.
    ///
    /// Order: enumerations, structures (bases, then members), unions, child
    /// namespaces. Each entity is attempted once; its pending mark is cleared
    /// whether or not it resolves.
    ///
    /// ## Errors
    ///
    /// Only non-local errors propagate. Unresolvable types are counted in
    /// [`ResolutionStats::unresolved`].
    pub fn resolve_namespace(&self, namespace: &mut Namespace) -> Result<ResolutionStats>
    {
        let mut stats = ResolutionStats::default();

        for enumeration in namespace.enumerations.values_mut().filter(|enumeration| enumeration.pending) {
            enumeration.pending = false;
            let outcome = self.resolve_enumeration(enumeration);
            stats.record(outcome, "enumeration", &enumeration.name)?;
        }

        for structure in namespace.structures.values_mut() {
            for base in structure.base_structures.iter_mut().filter(|base| base.pending) {
                base.pending = false;
                let outcome = self.resolve_base_structure(base);
                stats.record(outcome, "base of", &structure.name)?;
            }
            for member in structure.members.values_mut().filter(|member| member.pending) {
                member.pending = false;
                let outcome = self.resolve_member(member);
                stats.record(outcome, "member", &format!("{}.{}", structure.name, member.name))?;
            }
        }

        for union in namespace.unions.values_mut() {
            for member in union.members.values_mut().filter(|member| member.pending) {
                member.pending = false;
                let outcome = self.resolve_member(member);
                stats.record(outcome, "member", &format!("{}.{}", union.name, member.name))?;
            }
        }

        for child in namespace.namespaces.values_mut() {
            stats += self.resolve_namespace(child)?;
        }
        Ok(stats)
    }
}
