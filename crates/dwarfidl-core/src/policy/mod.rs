//! # Type Policies
//!
//! Per-unit strategy bundle that decides which debug-info entries are usable
//! and what normalized data is extracted from them.
//!
//! Producers disagree on small details: Ada encodes inheritance as a hidden
//! member, Fortran arrays start at 1, DWARF 2 has no reliable per-member
//! accessibility. Instead of branching on the language inside the walker, the
//! walker asks a [`TypePolicy`] selected once per compilation unit.
//!
//! ## Question classes
//!
//! - **Validity**: `valid_*` predicates. A node failing one is skipped silently.
//! - **Extraction**: builders returning table fragments or model entities.
//!   They assume the matching `valid_*` check passed and propagate
//!   [`DwarfIdlError::MissingAttribute`] otherwise.
//! - **Cross-cutting**: accessibility defaults, inheritance detection,
//!   subrange lower bounds and namespace entry.
//!
//! ## Implementations
//!
//! - [`DefaultPolicy`]: every language without an override
//! - [`AdaPolicy`]: inheritance through the `_parent` member, runtime records excluded
//! - [`FortranPolicy`]: one-based arrays
//!
//! Use [`create_policy`] to pick one from a compilation unit root.

mod ada;
mod fortran;

pub use ada::{AdaPolicy, ADA_PARENT_MEMBER};
pub use fortran::FortranPolicy;
use tracing::{debug, info};

use crate::error::{DwarfIdlError, Result};
use crate::language::Language;
use crate::model::{Accessibility, BaseStructure, Member, Namespace};
use crate::node::{Attr, DieRef, NodeId, NodeTree, Offset};
use crate::table::{
    ArrayFragment, BaseFragment, EnumerationFragment, IndirectFragment, NamedSizedFragment, SubrangeFragment,
    TypeRef, TypedefFragment,
};

/// Name used for entities that carry neither a name nor a linkage name.
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// Separator between qualified name components.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// DWARF version whose producers omit accessibility on most members.
const LEGACY_ACCESSIBILITY_VERSION: u16 = 2;

/// Strategy bundle for one (producer language, DWARF version) pair
///
/// Only [`TypePolicy::version`] and [`TypePolicy::language`] are required;
/// every other method has the behavior used for C and C++. Overrides replace
/// individual methods and may delegate back to [`DefaultPolicy`].
pub trait TypePolicy
{
    /// DWARF version of the unit this policy was selected for.
    fn version(&self) -> u16;

    /// Producer language of the unit this policy was selected for.
    fn language(&self) -> Language;

    fn valid_base_type(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::ByteSize) && die.has(Attr::Encoding) && die.has(Attr::Name)
    }

    /// A structure needs some name and must not be compiler-synthesized.
    fn valid_structure(&self, die: DieRef<'_>) -> bool
    {
        (die.has(Attr::Name) || die.has(Attr::MipsLinkageName) || die.has(Attr::LinkageName)) && !die.is_artificial()
    }

    fn valid_union(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::ByteSize)
    }

    fn valid_typedef(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::Name)
    }

    /// Array-tag nodes without a sibling link are incidental and ignored.
    fn valid_array(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::Sibling)
    }

    fn valid_subrange(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::Type) && die.has(Attr::UpperBound)
    }

    fn valid_string_type(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::ByteSize)
    }

    fn valid_pointer(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::ByteSize)
    }

    fn valid_reference(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::ByteSize)
    }

    fn valid_const(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::Type)
    }

    fn valid_enumeration(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::Name) && die.has(Attr::ByteSize) && die.has(Attr::Type) && die.has(Attr::Encoding)
    }

    fn valid_enumerator(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::Name) && die.has(Attr::ConstValue)
    }

    /// An inheritance edge must name its base type.
    fn valid_inheritance(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::Type)
    }

    fn valid_structure_member(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::Name) && die.has(Attr::Type)
    }

    fn valid_union_member(&self, die: DieRef<'_>) -> bool
    {
        die.has(Attr::Name) && die.has(Attr::Type)
    }

    /// A valid member marked external.
    fn valid_static_structure_member(&self, die: DieRef<'_>) -> bool
    {
        self.valid_structure_member(die) && die.is_external()
    }

    /// A valid member with a byte or bit location inside the layout.
    fn valid_instance_structure_member(&self, die: DieRef<'_>) -> bool
    {
        self.valid_structure_member(die) && (die.has(Attr::DataMemberLocation) || die.has(Attr::DataBitOffset))
    }

    /// Unqualified name: `DW_AT_name`, then the MIPS linkage name, then the linkage name.
    fn type_name(&self, die: DieRef<'_>) -> Result<String>
    {
        let name = if die.has(Attr::Name) {
            die.name()?
        } else if die.has(Attr::MipsLinkageName) {
            die.mips_linkage_name()?
        } else if die.has(Attr::LinkageName) {
            die.linkage_name()?
        } else {
            UNKNOWN_NAME
        };
        Ok(name.to_owned())
    }

    /// Name prefixed with the enclosing namespace annotation, if any.
    fn qualified_name(&self, die: DieRef<'_>) -> Result<String>
    {
        let name = self.type_name(die)?;
        Ok(match die.enclosing_namespace() {
            Some(namespace) => format!("{namespace}{NAMESPACE_SEPARATOR}{name}"),
            None => name,
        })
    }

    /// Base type fragment. Compiler kind annotations such as `integer(kind=4)` are cut off.
    fn base_type(&self, die: DieRef<'_>) -> Result<BaseFragment>
    {
        let name = die.name()?;
        let name = if name.contains("(kind") { name.split('(').next().unwrap_or(name) } else { name };
        Ok(BaseFragment {
            name: name.to_owned(),
            size: die.byte_size()?,
            encoding: die.encoding()?,
        })
    }

    /// String types have no name of their own: one byte is a `char`, anything longer a `string`.
    fn string_type(&self, die: DieRef<'_>) -> Result<NamedSizedFragment>
    {
        let size = die.byte_size()?;
        let name = if size > 1 { "string" } else { "char" };
        Ok(NamedSizedFragment {
            name: name.to_owned(),
            size,
        })
    }

    /// Structure fragment; the size is 0 for declarations.
    fn structure(&self, die: DieRef<'_>) -> Result<NamedSizedFragment>
    {
        let size = if die.has(Attr::ByteSize) { die.byte_size()? } else { 0 };
        Ok(NamedSizedFragment {
            name: self.qualified_name(die)?,
            size,
        })
    }

    fn union(&self, die: DieRef<'_>) -> Result<NamedSizedFragment>
    {
        Ok(NamedSizedFragment {
            name: self.qualified_name(die)?,
            size: die.byte_size()?,
        })
    }

    fn enumeration(&self, die: DieRef<'_>) -> Result<EnumerationFragment>
    {
        Ok(EnumerationFragment {
            name: self.qualified_name(die)?,
            size: die.byte_size()?,
            encoding: die.encoding()?,
            inner: die.type_offset()?,
        })
    }

    /// Array fragment with one subrange offset per dimension.
    fn array(&self, die: DieRef<'_>) -> Result<ArrayFragment>
    {
        let subranges = die.children().filter(|child| child.is_subrange()).map(|child| child.offset()).collect();
        Ok(ArrayFragment {
            inner: die.type_offset()?,
            subranges,
        })
    }

    fn subrange(&self, die: DieRef<'_>) -> Result<SubrangeFragment>
    {
        Ok(SubrangeFragment {
            inner: die.type_offset()?,
            lower: self.lower_bound(die)?,
            upper: die.upper_bound()?,
        })
    }

    fn typedef(&self, die: DieRef<'_>) -> Result<TypedefFragment>
    {
        let inner = if die.has(Attr::Type) { Some(die.type_offset()?) } else { None };
        Ok(TypedefFragment {
            name: die.name()?.to_owned(),
            inner,
        })
    }

    /// Pointer fragment; a pointer without a target type points at `void`.
    fn pointer(&self, die: DieRef<'_>) -> Result<IndirectFragment>
    {
        indirect_fragment(die)
    }

    fn reference(&self, die: DieRef<'_>) -> Result<IndirectFragment>
    {
        indirect_fragment(die)
    }

    fn const_type(&self, die: DieRef<'_>) -> Result<Offset>
    {
        die.type_offset()
    }

    /// Skeleton member with its raw type and accessibility, before classification.
    fn member(&self, die: DieRef<'_>) -> Result<Member>
    {
        Ok(Member::new(die.name()?, die.type_offset()?, self.accessibility(die)?))
    }

    fn static_member_data(&self, _die: DieRef<'_>, member: &mut Member) -> Result<()>
    {
        member.is_static = true;
        Ok(())
    }

    /// Record the layout position of an instance member.
    ///
    /// `DW_AT_data_bit_offset` is accepted in place of a byte location: the
    /// byte offset becomes `bits / 8` and a bitfield's bit offset `bits % 8`.
    /// A bitfield without any bit offset starts at bit 0.
    fn instance_member_data(&self, die: DieRef<'_>, member: &mut Member) -> Result<()>
    {
        if die.has(Attr::DataMemberLocation) {
            member.byte_offset = Some(die.data_member_location()?);
        }
        if die.has(Attr::BitSize) {
            member.bit_size = Some(die.bit_size()?);
        }
        if die.has(Attr::BitOffset) {
            member.bit_offset = Some(die.bit_offset()?);
        }
        if die.has(Attr::DataBitOffset) {
            let bits = die.data_bit_offset()?;
            let byte_offset = *member.byte_offset.get_or_insert(bits / 8);
            if member.bit_size.is_some() && member.bit_offset.is_none() {
                member.bit_offset = Some(bits.saturating_sub(byte_offset * 8));
            }
        }
        if member.bit_size.is_some() && member.bit_offset.is_none() {
            member.bit_offset = Some(0);
        }
        Ok(())
    }

    /// Inheritance edge from an inheritance node.
    fn base_structure(&self, die: DieRef<'_>) -> Result<BaseStructure>
    {
        let byte_offset = if die.has(Attr::DataMemberLocation) {
            Some(die.data_member_location()?)
        } else {
            None
        };
        Ok(BaseStructure::new(die.type_offset()?, self.inheritance_accessibility(die)?, byte_offset))
    }

    fn enumerator(&self, die: DieRef<'_>) -> Result<(String, i64)>
    {
        Ok((die.name()?.to_owned(), die.const_value()?))
    }

    /// Explicit accessibility, or the default of the enclosing type.
    ///
    /// DWARF 2 producers rarely emit accessibility, so there every member
    /// without one is public.
    fn accessibility(&self, die: DieRef<'_>) -> Result<Accessibility>
    {
        if die.has(Attr::Accessibility) {
            return die.accessibility();
        }
        if self.version() == LEGACY_ACCESSIBILITY_VERSION {
            return Ok(Accessibility::Public);
        }
        default_accessibility(die)
    }

    /// Like [`TypePolicy::accessibility`], except that DWARF 2 edges default to private.
    fn inheritance_accessibility(&self, die: DieRef<'_>) -> Result<Accessibility>
    {
        if die.has(Attr::Accessibility) {
            return die.accessibility();
        }
        if self.version() == LEGACY_ACCESSIBILITY_VERSION {
            return Ok(Accessibility::Private);
        }
        default_accessibility(die)
    }

    fn is_inheritance(&self, die: DieRef<'_>) -> bool
    {
        die.is_inheritance()
    }

    fn lower_bound(&self, die: DieRef<'_>) -> Result<i64>
    {
        if die.has(Attr::LowerBound) {
            die.lower_bound()
        } else {
            Ok(self.default_lower_bound())
        }
    }

    fn default_lower_bound(&self) -> i64
    {
        self.language().default_lower_bound()
    }

    /// Descend into an explicit namespace node.
    ///
    /// Fetches or creates the child namespace and stamps the qualified
    /// namespace name onto every immediate child. An anonymous namespace
    /// creates nothing and its contents stay in `namespace`.
    fn enter_namespace<'ns>(
        &self,
        tree: &mut NodeTree,
        id: NodeId,
        namespace: &'ns mut Namespace,
    ) -> Result<&'ns mut Namespace>
    {
        let die = tree.get(id);
        if !die.has(Attr::Name) {
            debug!("Anonymous namespace at {}", die.offset());
            return Ok(namespace);
        }

        let name = die.name()?.to_owned();
        let qualified = match die.enclosing_namespace() {
            Some(outer) => format!("{outer}{NAMESPACE_SEPARATOR}{name}"),
            None => name.clone(),
        };
        let children = die.child_ids().to_vec();
        for child in children {
            tree.set_enclosing_namespace(child, qualified.clone());
        }
        Ok(namespace.create_namespace(&name))
    }
}

fn indirect_fragment(die: DieRef<'_>) -> Result<IndirectFragment>
{
    let inner = if die.has(Attr::Type) {
        TypeRef::Offset(die.type_offset()?)
    } else {
        TypeRef::Void
    };
    Ok(IndirectFragment {
        size: die.byte_size()?,
        inner,
    })
}

/// Accessibility implied by the kind of the enclosing type.
fn default_accessibility(die: DieRef<'_>) -> Result<Accessibility>
{
    match die.parent() {
        Some(parent) if parent.is_structure() || parent.is_union() => Ok(Accessibility::Public),
        Some(parent) if parent.is_class() => Ok(Accessibility::Private),
        _ => Err(DwarfIdlError::UnknownAccessibilityDefault(die.offset())),
    }
}

/// Policy for every language without an override (C, C++, ...).
#[derive(Debug, Clone, Copy)]
pub struct DefaultPolicy
{
    version: u16,
    language: Language,
}

impl DefaultPolicy
{
    #[must_use]
    pub fn new(version: u16, language: Language) -> Self
    {
        Self { version, language }
    }
}

impl TypePolicy for DefaultPolicy
{
    fn version(&self) -> u16
    {
        self.version
    }

    fn language(&self) -> Language
    {
        self.language
    }
}

/// Select the policy for a compilation unit.
///
/// A unit without `DW_AT_language` is treated like one with code 0.
///
/// ## Errors
///
/// - `UnknownLanguage`: the language code has no entry in the code table.
///   The caller skips the unit.
/// - `MissingVersion`: the unit header carried version 0
pub fn create_policy(version: u16, unit: DieRef<'_>) -> Result<Box<dyn TypePolicy>>
{
    if version == 0 {
        return Err(DwarfIdlError::MissingVersion(unit.offset()));
    }
    let code = if unit.has(Attr::Language) { unit.language()? } else { 0 };
    let language = Language::from_code(code).ok_or(DwarfIdlError::UnknownLanguage {
        code,
        offset: unit.offset(),
    })?;
    info!("Detected language {language} (DWARF {version}) in unit at {}", unit.offset());

    let policy: Box<dyn TypePolicy> = match language {
        Language::Ada => Box::new(AdaPolicy::new(version)),
        Language::Fortran => Box::new(FortranPolicy::new(version)),
        _ => Box::new(DefaultPolicy::new(version, language)),
    };
    Ok(policy)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::node::Tag;

    fn unit(language: u64) -> NodeTree
    {
        let mut tree = NodeTree::new(Tag::CompileUnit, 0xb);
        let root = tree.root_id();
        tree.set_attr(root, Attr::Language, language);
        tree
    }

    fn member_in(parent_tag: Tag) -> (NodeTree, NodeId)
    {
        let mut tree = unit(0x0004);
        let root = tree.root_id();
        let parent = tree.add_child(root, parent_tag, 0x20).attr(Attr::Name, "Holder").id();
        let member = tree
            .add_child(parent, Tag::Member, 0x30)
            .attr(Attr::Name, "field")
            .attr(Attr::Type, Offset(0x80))
            .id();
        (tree, member)
    }

    #[test]
    fn test_accessibility_defaults_by_parent_kind()
    {
        let policy = DefaultPolicy::new(4, Language::Cpp);

        let (tree, member) = member_in(Tag::StructureType);
        assert_eq!(policy.accessibility(tree.get(member)).unwrap(), Accessibility::Public);

        let (tree, member) = member_in(Tag::ClassType);
        assert_eq!(policy.accessibility(tree.get(member)).unwrap(), Accessibility::Private);

        let (tree, member) = member_in(Tag::UnionType);
        assert_eq!(policy.accessibility(tree.get(member)).unwrap(), Accessibility::Public);
    }

    #[test]
    fn test_accessibility_default_needs_a_known_parent()
    {
        let policy = DefaultPolicy::new(4, Language::C);
        let (tree, member) = member_in(Tag::Other(0x2e));
        assert!(matches!(
            policy.accessibility(tree.get(member)),
            Err(DwarfIdlError::UnknownAccessibilityDefault(Offset(0x30)))
        ));
    }

    #[test]
    fn test_version_two_accessibility()
    {
        let policy = DefaultPolicy::new(2, Language::Cpp);
        let (tree, member) = member_in(Tag::ClassType);
        assert_eq!(policy.accessibility(tree.get(member)).unwrap(), Accessibility::Public);
        assert_eq!(policy.inheritance_accessibility(tree.get(member)).unwrap(), Accessibility::Private);
    }

    #[test]
    fn test_explicit_accessibility_wins()
    {
        let policy = DefaultPolicy::new(2, Language::Cpp);
        let (mut tree, member) = member_in(Tag::StructureType);
        tree.set_attr(member, Attr::Accessibility, 2u64);
        assert_eq!(policy.accessibility(tree.get(member)).unwrap(), Accessibility::Protected);
        assert_eq!(policy.inheritance_accessibility(tree.get(member)).unwrap(), Accessibility::Protected);
    }

    #[test]
    fn test_base_type_kind_annotation_is_truncated()
    {
        let mut tree = unit(0x000e);
        let root = tree.root_id();
        let id = tree
            .add_child(root, Tag::BaseType, 0x40)
            .attr(Attr::Name, "integer(kind=4)")
            .attr(Attr::ByteSize, 4u64)
            .attr(Attr::Encoding, 5u64)
            .id();
        let policy = DefaultPolicy::new(4, Language::Fortran);
        assert!(policy.valid_base_type(tree.get(id)));
        assert_eq!(policy.base_type(tree.get(id)).unwrap().name, "integer");
    }

    #[test]
    fn test_string_type_names()
    {
        let mut tree = unit(0x000e);
        let root = tree.root_id();
        let single = tree.add_child(root, Tag::StringType, 0x40).attr(Attr::ByteSize, 1u64).id();
        let wide = tree.add_child(root, Tag::StringType, 0x48).attr(Attr::ByteSize, 12u64).id();
        let policy = DefaultPolicy::new(4, Language::Fortran);
        assert_eq!(policy.string_type(tree.get(single)).unwrap().name, "char");
        assert_eq!(policy.string_type(tree.get(wide)).unwrap().name, "string");
    }

    #[test]
    fn test_name_fallbacks()
    {
        let mut tree = unit(0x0004);
        let root = tree.root_id();
        let linkage = tree
            .add_child(root, Tag::StructureType, 0x40)
            .attr(Attr::LinkageName, "_ZN3foo3BarE")
            .id();
        let nameless = tree.add_child(root, Tag::StructureType, 0x48).id();
        let policy = DefaultPolicy::new(4, Language::Cpp);
        assert_eq!(policy.type_name(tree.get(linkage)).unwrap(), "_ZN3foo3BarE");
        assert_eq!(policy.type_name(tree.get(nameless)).unwrap(), UNKNOWN_NAME);
        assert!(policy.valid_structure(tree.get(linkage)));
        assert!(!policy.valid_structure(tree.get(nameless)));
    }

    #[test]
    fn test_artificial_structure_is_invalid()
    {
        let mut tree = unit(0x0004);
        let root = tree.root_id();
        let id = tree
            .add_child(root, Tag::StructureType, 0x40)
            .attr(Attr::Name, "__vtbl")
            .attr(Attr::Artificial, true)
            .id();
        assert!(!DefaultPolicy::new(4, Language::Cpp).valid_structure(tree.get(id)));
    }

    #[test]
    fn test_member_classification()
    {
        let policy = DefaultPolicy::new(4, Language::Cpp);
        let (mut tree, member) = member_in(Tag::StructureType);
        assert!(policy.valid_structure_member(tree.get(member)));
        assert!(!policy.valid_static_structure_member(tree.get(member)));
        assert!(!policy.valid_instance_structure_member(tree.get(member)));

        tree.set_attr(member, Attr::DataMemberLocation, 4u64);
        assert!(policy.valid_instance_structure_member(tree.get(member)));

        tree.set_attr(member, Attr::External, true);
        assert!(policy.valid_static_structure_member(tree.get(member)));
    }

    #[test]
    fn test_data_bit_offset_splits_into_byte_and_bit()
    {
        let policy = DefaultPolicy::new(5, Language::C);
        let (mut tree, id) = member_in(Tag::StructureType);
        tree.set_attr(id, Attr::DataBitOffset, 35u64);
        tree.set_attr(id, Attr::BitSize, 3u64);

        let mut member = policy.member(tree.get(id)).unwrap();
        policy.instance_member_data(tree.get(id), &mut member).unwrap();
        assert_eq!(member.byte_offset, Some(4));
        assert_eq!(member.bit_offset, Some(3));
        assert_eq!(member.bit_size, Some(3));
    }

    #[test]
    fn test_bitfield_without_bit_offset_starts_at_zero()
    {
        let policy = DefaultPolicy::new(4, Language::C);
        let (mut tree, id) = member_in(Tag::StructureType);
        tree.set_attr(id, Attr::DataMemberLocation, 0u64);
        tree.set_attr(id, Attr::BitSize, 1u64);

        let mut member = policy.member(tree.get(id)).unwrap();
        policy.instance_member_data(tree.get(id), &mut member).unwrap();
        assert_eq!(member.bit_offset, Some(0));
    }

    #[test]
    fn test_pointer_without_type_is_void()
    {
        let mut tree = unit(0x0001);
        let root = tree.root_id();
        let id = tree.add_child(root, Tag::PointerType, 0x40).attr(Attr::ByteSize, 8u64).id();
        let fragment = DefaultPolicy::new(4, Language::C).pointer(tree.get(id)).unwrap();
        assert_eq!(fragment.inner, TypeRef::Void);
        assert_eq!(fragment.size, 8);
    }

    #[test]
    fn test_subrange_uses_language_lower_bound()
    {
        let mut tree = unit(0x0001);
        let root = tree.root_id();
        let id = tree
            .add_child(root, Tag::SubrangeType, 0x40)
            .attr(Attr::Type, Offset(0x50))
            .attr(Attr::UpperBound, 3u64)
            .id();
        let c = DefaultPolicy::new(4, Language::C).subrange(tree.get(id)).unwrap();
        assert_eq!((c.lower, c.upper), (0, 3));
        let pascal = DefaultPolicy::new(4, Language::Pascal).subrange(tree.get(id)).unwrap();
        assert_eq!(pascal.lower, 1);
    }

    #[test]
    fn test_enter_namespace_stamps_children()
    {
        let mut tree = unit(0x0004);
        let root = tree.root_id();
        let outer = tree.add_child(root, Tag::Namespace, 0x20).attr(Attr::Name, "outer").id();
        let inner = tree.add_child(outer, Tag::Namespace, 0x28).attr(Attr::Name, "inner").id();
        let widget = tree.add_child(inner, Tag::StructureType, 0x30).attr(Attr::Name, "Widget").id();

        let policy = DefaultPolicy::new(4, Language::Cpp);
        let mut namespace = Namespace::root();
        let outer_ns = policy.enter_namespace(&mut tree, outer, &mut namespace).unwrap();
        let inner_ns = policy.enter_namespace(&mut tree, inner, outer_ns).unwrap();
        assert_eq!(inner_ns.name, "inner");

        assert_eq!(tree.get(inner).enclosing_namespace(), Some("outer"));
        assert_eq!(tree.get(widget).enclosing_namespace(), Some("outer::inner"));
        assert_eq!(policy.qualified_name(tree.get(widget)).unwrap(), "outer::inner::Widget");
        assert!(namespace.namespace_at(&["outer".to_string(), "inner".to_string()]).is_some());
    }

    #[test]
    fn test_create_policy_selects_by_language()
    {
        let tree = unit(0x000d);
        let policy = create_policy(3, tree.root()).unwrap();
        assert_eq!(policy.language(), Language::Ada);
        assert_eq!(policy.default_lower_bound(), 1);

        let tree = unit(0x0001);
        let policy = create_policy(4, tree.root()).unwrap();
        assert_eq!(policy.language(), Language::C);
        assert_eq!(policy.version(), 4);
    }

    #[test]
    fn test_create_policy_rejects_unknown_language()
    {
        let tree = unit(0x9999);
        assert!(matches!(
            create_policy(4, tree.root()),
            Err(DwarfIdlError::UnknownLanguage { code: 0x9999, .. })
        ));

        let tree = NodeTree::new(Tag::CompileUnit, 0xb);
        assert!(matches!(
            create_policy(4, tree.root()),
            Err(DwarfIdlError::UnknownLanguage { code: 0, .. })
        ));
    }

    #[test]
    fn test_create_policy_rejects_version_zero()
    {
        let tree = unit(0x0001);
        assert!(matches!(create_policy(0, tree.root()), Err(DwarfIdlError::MissingVersion(_))));
    }
}
