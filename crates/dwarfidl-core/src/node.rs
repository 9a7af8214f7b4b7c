//! # Attributed Nodes
//!
//! Owned, read-only view of a debug-info tree.
//!
//! The loader converts each compilation unit into a [`NodeTree`]: an arena of
//! nodes carrying a tag, a file-unique offset, a parent link, ordered children
//! and the attributes the pipeline cares about. Everything downstream talks to
//! nodes through [`DieRef`], which offers:
//!
//! - `has(attr)` predicates and typed getters that fail with
//!   [`DwarfIdlError::MissingAttribute`] when the attribute is absent
//! - tag predicates (`is_structure`, `is_array`, ...)
//! - the enclosing-namespace annotation stamped by namespace entry
//!
//! Tests build trees by hand with [`NodeTree::new`] and [`NodeTree::add_child`].

use std::collections::HashMap;
use std::fmt;

use gimli::{constants, DwAt, DwTag};

use crate::error::{DwarfIdlError, Result};
use crate::model::Accessibility;

/// Identity of a node inside one file's debug-info address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Offset(pub usize);

impl fmt::Display for Offset
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:x}", self.0)
    }
}

impl From<usize> for Offset
{
    fn from(value: usize) -> Self
    {
        Offset(value)
    }
}

/// Node kinds the pipeline dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag
{
    CompileUnit,
    StructureType,
    ClassType,
    UnionType,
    Member,
    BaseType,
    StringType,
    Typedef,
    ArrayType,
    SubrangeType,
    PointerType,
    ReferenceType,
    ConstType,
    EnumerationType,
    Enumerator,
    Namespace,
    Inheritance,
    TemplateTypeParameter,
    Variable,
    Other(u16),
}

impl From<DwTag> for Tag
{
    fn from(tag: DwTag) -> Self
    {
        match tag {
            constants::DW_TAG_compile_unit | constants::DW_TAG_partial_unit => Tag::CompileUnit,
            constants::DW_TAG_structure_type => Tag::StructureType,
            constants::DW_TAG_class_type => Tag::ClassType,
            constants::DW_TAG_union_type => Tag::UnionType,
            constants::DW_TAG_member => Tag::Member,
            constants::DW_TAG_base_type => Tag::BaseType,
            constants::DW_TAG_string_type => Tag::StringType,
            constants::DW_TAG_typedef => Tag::Typedef,
            constants::DW_TAG_array_type => Tag::ArrayType,
            constants::DW_TAG_subrange_type => Tag::SubrangeType,
            constants::DW_TAG_pointer_type => Tag::PointerType,
            constants::DW_TAG_reference_type => Tag::ReferenceType,
            constants::DW_TAG_const_type => Tag::ConstType,
            constants::DW_TAG_enumeration_type => Tag::EnumerationType,
            constants::DW_TAG_enumerator => Tag::Enumerator,
            constants::DW_TAG_namespace => Tag::Namespace,
            constants::DW_TAG_inheritance => Tag::Inheritance,
            constants::DW_TAG_template_type_parameter => Tag::TemplateTypeParameter,
            constants::DW_TAG_variable => Tag::Variable,
            other => Tag::Other(other.0),
        }
    }
}

/// Attributes read from debug-info entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr
{
    Name,
    LinkageName,
    MipsLinkageName,
    ByteSize,
    Encoding,
    DataMemberLocation,
    DataBitOffset,
    Type,
    BitSize,
    BitOffset,
    Sibling,
    UpperBound,
    LowerBound,
    Artificial,
    Accessibility,
    External,
    ConstValue,
    Language,
    Producer,
}

impl Attr
{
    /// Every attribute the loader copies out of a DIE.
    pub const ALL: [Attr; 19] = [
        Attr::Name,
        Attr::LinkageName,
        Attr::MipsLinkageName,
        Attr::ByteSize,
        Attr::Encoding,
        Attr::DataMemberLocation,
        Attr::DataBitOffset,
        Attr::Type,
        Attr::BitSize,
        Attr::BitOffset,
        Attr::Sibling,
        Attr::UpperBound,
        Attr::LowerBound,
        Attr::Artificial,
        Attr::Accessibility,
        Attr::External,
        Attr::ConstValue,
        Attr::Language,
        Attr::Producer,
    ];

    /// The DWARF constant this attribute is read from.
    #[must_use]
    pub fn dwarf_constant(self) -> DwAt
    {
        match self {
            Attr::Name => constants::DW_AT_name,
            Attr::LinkageName => constants::DW_AT_linkage_name,
            Attr::MipsLinkageName => constants::DW_AT_MIPS_linkage_name,
            Attr::ByteSize => constants::DW_AT_byte_size,
            Attr::Encoding => constants::DW_AT_encoding,
            Attr::DataMemberLocation => constants::DW_AT_data_member_location,
            Attr::DataBitOffset => constants::DW_AT_data_bit_offset,
            Attr::Type => constants::DW_AT_type,
            Attr::BitSize => constants::DW_AT_bit_size,
            Attr::BitOffset => constants::DW_AT_bit_offset,
            Attr::Sibling => constants::DW_AT_sibling,
            Attr::UpperBound => constants::DW_AT_upper_bound,
            Attr::LowerBound => constants::DW_AT_lower_bound,
            Attr::Artificial => constants::DW_AT_artificial,
            Attr::Accessibility => constants::DW_AT_accessibility,
            Attr::External => constants::DW_AT_external,
            Attr::ConstValue => constants::DW_AT_const_value,
            Attr::Language => constants::DW_AT_language,
            Attr::Producer => constants::DW_AT_producer,
        }
    }
}

impl fmt::Display for Attr
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.dwarf_constant().static_string() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{self:?}"),
        }
    }
}

/// Normalized attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue
{
    Unsigned(u64),
    Signed(i64),
    Flag(bool),
    String(String),
    Reference(Offset),
}

impl From<u64> for AttrValue
{
    fn from(value: u64) -> Self
    {
        AttrValue::Unsigned(value)
    }
}

impl From<i64> for AttrValue
{
    fn from(value: i64) -> Self
    {
        AttrValue::Signed(value)
    }
}

impl From<bool> for AttrValue
{
    fn from(value: bool) -> Self
    {
        AttrValue::Flag(value)
    }
}

impl From<&str> for AttrValue
{
    fn from(value: &str) -> Self
    {
        AttrValue::String(value.to_owned())
    }
}

impl From<String> for AttrValue
{
    fn from(value: String) -> Self
    {
        AttrValue::String(value)
    }
}

impl From<Offset> for AttrValue
{
    fn from(value: Offset) -> Self
    {
        AttrValue::Reference(value)
    }
}

/// Index of a node inside its [`NodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node
{
    tag: Tag,
    offset: Offset,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: HashMap<Attr, AttrValue>,
    enclosing_namespace: Option<String>,
}

/// Arena holding one compilation unit's nodes. The root is always the unit DIE.
#[derive(Debug, Clone)]
pub struct NodeTree
{
    nodes: Vec<Node>,
}

impl NodeTree
{
    /// Create a tree containing only its root node.
    #[must_use]
    pub fn new(tag: Tag, offset: impl Into<Offset>) -> Self
    {
        Self {
            nodes: vec![Node {
                tag,
                offset: offset.into(),
                parent: None,
                children: Vec::new(),
                attributes: HashMap::new(),
                enclosing_namespace: None,
            }],
        }
    }

    #[must_use]
    pub fn root_id(&self) -> NodeId
    {
        NodeId(0)
    }

    #[must_use]
    pub fn root(&self) -> DieRef<'_>
    {
        self.get(self.root_id())
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> DieRef<'_>
    {
        DieRef { tree: self, id }
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.nodes.is_empty()
    }

    /// Append a child under `parent` and return a handle for setting attributes.
    pub fn add_child(&mut self, parent: NodeId, tag: Tag, offset: impl Into<Offset>) -> NodeMut<'_>
    {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag,
            offset: offset.into(),
            parent: Some(parent),
            children: Vec::new(),
            attributes: HashMap::new(),
            enclosing_namespace: None,
        });
        self.nodes[parent.0].children.push(id);
        NodeMut { tree: self, id }
    }

    /// Handle for setting attributes on an existing node.
    pub fn node_mut(&mut self, id: NodeId) -> NodeMut<'_>
    {
        NodeMut { tree: self, id }
    }

    pub fn set_attr(&mut self, id: NodeId, attr: Attr, value: impl Into<AttrValue>)
    {
        self.nodes[id.0].attributes.insert(attr, value.into());
    }

    /// Stamp the qualified name of the namespace enclosing `id`.
    pub fn set_enclosing_namespace(&mut self, id: NodeId, qualified: impl Into<String>)
    {
        self.nodes[id.0].enclosing_namespace = Some(qualified.into());
    }
}

/// Mutable handle returned by [`NodeTree::add_child`].
pub struct NodeMut<'a>
{
    tree: &'a mut NodeTree,
    id: NodeId,
}

impl NodeMut<'_>
{
    #[must_use]
    pub fn attr(self, attr: Attr, value: impl Into<AttrValue>) -> Self
    {
        self.tree.set_attr(self.id, attr, value);
        self
    }

    #[must_use]
    pub fn id(&self) -> NodeId
    {
        self.id
    }
}

/// Borrowed view of one node.
#[derive(Clone, Copy)]
pub struct DieRef<'a>
{
    tree: &'a NodeTree,
    id: NodeId,
}

impl fmt::Debug for DieRef<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("DieRef")
            .field("tag", &self.tag())
            .field("offset", &self.offset())
            .finish()
    }
}

impl<'a> DieRef<'a>
{
    fn node(&self) -> &'a Node
    {
        &self.tree.nodes[self.id.0]
    }

    #[must_use]
    pub fn id(&self) -> NodeId
    {
        self.id
    }

    #[must_use]
    pub fn tag(&self) -> Tag
    {
        self.node().tag
    }

    #[must_use]
    pub fn offset(&self) -> Offset
    {
        self.node().offset
    }

    #[must_use]
    pub fn parent(&self) -> Option<DieRef<'a>>
    {
        self.node().parent.map(|id| self.tree.get(id))
    }

    #[must_use]
    pub fn child_ids(&self) -> &'a [NodeId]
    {
        &self.node().children
    }

    pub fn children(&self) -> impl Iterator<Item = DieRef<'a>> + 'a
    {
        let tree = self.tree;
        self.node().children.iter().map(move |id| tree.get(*id))
    }

    /// Qualified name of the enclosing namespace.
    ///
    /// The annotation is inherited: a node without its own stamp reports the
    /// nearest stamped ancestor's.
    #[must_use]
    pub fn enclosing_namespace(&self) -> Option<&'a str>
    {
        let mut current = Some(*self);
        while let Some(die) = current {
            if let Some(namespace) = die.node().enclosing_namespace.as_deref() {
                return Some(namespace);
            }
            current = die.parent();
        }
        None
    }

    #[must_use]
    pub fn has(&self, attr: Attr) -> bool
    {
        self.node().attributes.contains_key(&attr)
    }

    /// Raw value of `attr`, failing loudly when it is absent.
    pub fn value(&self, attr: Attr) -> Result<&'a AttrValue>
    {
        self.node()
            .attributes
            .get(&attr)
            .ok_or(DwarfIdlError::MissingAttribute {
                attribute: attr,
                offset: self.offset(),
            })
    }

    fn unexpected_form(&self, attr: Attr) -> DwarfIdlError
    {
        DwarfIdlError::InvalidArgument(format!(
            "attribute {attr} on node at {} has an unexpected form",
            self.offset()
        ))
    }

    fn unsigned(&self, attr: Attr) -> Result<u64>
    {
        match self.value(attr)? {
            AttrValue::Unsigned(value) => Ok(*value),
            AttrValue::Signed(value) => u64::try_from(*value).map_err(|_| self.unexpected_form(attr)),
            _ => Err(self.unexpected_form(attr)),
        }
    }

    fn signed(&self, attr: Attr) -> Result<i64>
    {
        match self.value(attr)? {
            AttrValue::Signed(value) => Ok(*value),
            // Data forms carry no signedness; reinterpret so that all-ones means -1.
            #[allow(clippy::cast_possible_wrap)]
            AttrValue::Unsigned(value) => Ok(*value as i64),
            _ => Err(self.unexpected_form(attr)),
        }
    }

    fn string(&self, attr: Attr) -> Result<&'a str>
    {
        match self.value(attr)? {
            AttrValue::String(value) => Ok(value.as_str()),
            _ => Err(self.unexpected_form(attr)),
        }
    }

    fn reference(&self, attr: Attr) -> Result<Offset>
    {
        match self.value(attr)? {
            AttrValue::Reference(offset) => Ok(*offset),
            _ => Err(self.unexpected_form(attr)),
        }
    }

    fn flag(&self, attr: Attr) -> bool
    {
        matches!(self.node().attributes.get(&attr), Some(AttrValue::Flag(true)))
    }

    pub fn name(&self) -> Result<&'a str>
    {
        self.string(Attr::Name)
    }

    pub fn linkage_name(&self) -> Result<&'a str>
    {
        self.string(Attr::LinkageName)
    }

    pub fn mips_linkage_name(&self) -> Result<&'a str>
    {
        self.string(Attr::MipsLinkageName)
    }

    pub fn producer(&self) -> Result<&'a str>
    {
        self.string(Attr::Producer)
    }

    pub fn byte_size(&self) -> Result<u64>
    {
        self.unsigned(Attr::ByteSize)
    }

    pub fn encoding(&self) -> Result<u64>
    {
        self.unsigned(Attr::Encoding)
    }

    pub fn data_member_location(&self) -> Result<u64>
    {
        self.unsigned(Attr::DataMemberLocation)
    }

    pub fn data_bit_offset(&self) -> Result<u64>
    {
        self.unsigned(Attr::DataBitOffset)
    }

    pub fn bit_size(&self) -> Result<u64>
    {
        self.unsigned(Attr::BitSize)
    }

    pub fn bit_offset(&self) -> Result<u64>
    {
        self.unsigned(Attr::BitOffset)
    }

    /// Offset of the node named by `DW_AT_type`.
    pub fn type_offset(&self) -> Result<Offset>
    {
        self.reference(Attr::Type)
    }

    pub fn sibling(&self) -> Result<Offset>
    {
        self.reference(Attr::Sibling)
    }

    pub fn upper_bound(&self) -> Result<i64>
    {
        self.signed(Attr::UpperBound)
    }

    pub fn lower_bound(&self) -> Result<i64>
    {
        self.signed(Attr::LowerBound)
    }

    pub fn const_value(&self) -> Result<i64>
    {
        self.signed(Attr::ConstValue)
    }

    pub fn accessibility(&self) -> Result<Accessibility>
    {
        let code = self.unsigned(Attr::Accessibility)?;
        Accessibility::from_code(code).ok_or_else(|| self.unexpected_form(Attr::Accessibility))
    }

    /// Raw `DW_AT_language` code.
    pub fn language(&self) -> Result<u16>
    {
        let code = self.unsigned(Attr::Language)?;
        u16::try_from(code).map_err(|_| self.unexpected_form(Attr::Language))
    }

    #[must_use]
    pub fn is_artificial(&self) -> bool
    {
        self.flag(Attr::Artificial)
    }

    #[must_use]
    pub fn is_external(&self) -> bool
    {
        self.flag(Attr::External)
    }

    #[must_use]
    pub fn is_structure(&self) -> bool
    {
        self.tag() == Tag::StructureType
    }

    #[must_use]
    pub fn is_class(&self) -> bool
    {
        self.tag() == Tag::ClassType
    }

    /// Structure or class tag.
    #[must_use]
    pub fn is_structure_like(&self) -> bool
    {
        self.is_structure() || self.is_class()
    }

    #[must_use]
    pub fn is_union(&self) -> bool
    {
        self.tag() == Tag::UnionType
    }

    #[must_use]
    pub fn is_member(&self) -> bool
    {
        self.tag() == Tag::Member
    }

    #[must_use]
    pub fn is_base_type(&self) -> bool
    {
        self.tag() == Tag::BaseType
    }

    #[must_use]
    pub fn is_string_type(&self) -> bool
    {
        self.tag() == Tag::StringType
    }

    #[must_use]
    pub fn is_typedef(&self) -> bool
    {
        self.tag() == Tag::Typedef
    }

    #[must_use]
    pub fn is_array(&self) -> bool
    {
        self.tag() == Tag::ArrayType
    }

    #[must_use]
    pub fn is_subrange(&self) -> bool
    {
        self.tag() == Tag::SubrangeType
    }

    #[must_use]
    pub fn is_pointer(&self) -> bool
    {
        self.tag() == Tag::PointerType
    }

    #[must_use]
    pub fn is_reference(&self) -> bool
    {
        self.tag() == Tag::ReferenceType
    }

    #[must_use]
    pub fn is_const(&self) -> bool
    {
        self.tag() == Tag::ConstType
    }

    #[must_use]
    pub fn is_enumeration(&self) -> bool
    {
        self.tag() == Tag::EnumerationType
    }

    #[must_use]
    pub fn is_enumerator(&self) -> bool
    {
        self.tag() == Tag::Enumerator
    }

    #[must_use]
    pub fn is_namespace(&self) -> bool
    {
        self.tag() == Tag::Namespace
    }

    #[must_use]
    pub fn is_inheritance(&self) -> bool
    {
        self.tag() == Tag::Inheritance
    }

    #[must_use]
    pub fn is_template_param(&self) -> bool
    {
        self.tag() == Tag::TemplateTypeParameter
    }
}
