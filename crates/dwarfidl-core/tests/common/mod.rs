//! In-memory debug-info fixtures shared by the integration tests

#![allow(dead_code)]

use dwarfidl_core::{jidl, Attr, CompileUnit, Namespace, NodeTree, Offset, Pipeline, PipelineOptions, Tag};
use dwarfidl_core::node::NodeId;

pub const DW_LANG_C99: u64 = 0x000c;
pub const DW_LANG_C_PLUS_PLUS: u64 = 0x0004;
pub const DW_LANG_ADA95: u64 = 0x000d;
pub const DW_LANG_FORTRAN90: u64 = 0x0008;

pub const DW_ATE_SIGNED: u64 = 0x05;
pub const DW_ATE_SIGNED_CHAR: u64 = 0x06;
pub const DW_ATE_UNSIGNED: u64 = 0x08;

pub const DW_ACCESS_PUBLIC: u64 = 1;
pub const DW_ACCESS_PROTECTED: u64 = 2;
pub const DW_ACCESS_PRIVATE: u64 = 3;

/// Offsets of the base types every fixture unit starts with.
pub const CHAR: usize = 0x10;
pub const INT: usize = 0x14;
pub const UNSIGNED_INT: usize = 0x18;
pub const LONG: usize = 0x1c;

/// Builds one compilation unit. Offsets are chosen by the test.
pub struct UnitFixture
{
    pub tree: NodeTree,
    version: u16,
}

impl UnitFixture
{
    /// Unit root at 0xb with the common base types.
    pub fn new(language: u64, version: u16) -> Self
    {
        let mut tree = NodeTree::new(Tag::CompileUnit, 0xb_usize);
        let root = tree.root_id();
        tree.set_attr(root, Attr::Language, language);
        tree.set_attr(root, Attr::Name, "fixture.c");
        let mut fixture = Self { tree, version };
        fixture.base(root, CHAR, "char", 1, DW_ATE_SIGNED_CHAR);
        fixture.base(root, INT, "int", 4, DW_ATE_SIGNED);
        fixture.base(root, UNSIGNED_INT, "unsigned int", 4, DW_ATE_UNSIGNED);
        fixture.base(root, LONG, "long", 8, DW_ATE_SIGNED);
        fixture
    }

    /// Unit without `DW_AT_language` and without base types.
    pub fn bare(version: u16) -> Self
    {
        Self {
            tree: NodeTree::new(Tag::CompileUnit, 0xb_usize),
            version,
        }
    }

    pub fn root(&self) -> NodeId
    {
        self.tree.root_id()
    }

    pub fn base(&mut self, parent: NodeId, offset: usize, name: &str, size: u64, encoding: u64) -> NodeId
    {
        self.tree
            .add_child(parent, Tag::BaseType, offset)
            .attr(Attr::Name, name)
            .attr(Attr::ByteSize, size)
            .attr(Attr::Encoding, encoding)
            .id()
    }

    pub fn structure(&mut self, parent: NodeId, offset: usize, name: &str, size: u64) -> NodeId
    {
        self.tree
            .add_child(parent, Tag::StructureType, offset)
            .attr(Attr::Name, name)
            .attr(Attr::ByteSize, size)
            .id()
    }

    pub fn class(&mut self, parent: NodeId, offset: usize, name: &str, size: u64) -> NodeId
    {
        self.tree
            .add_child(parent, Tag::ClassType, offset)
            .attr(Attr::Name, name)
            .attr(Attr::ByteSize, size)
            .id()
    }

    pub fn union(&mut self, parent: NodeId, offset: usize, name: &str, size: u64) -> NodeId
    {
        self.tree
            .add_child(parent, Tag::UnionType, offset)
            .attr(Attr::Name, name)
            .attr(Attr::ByteSize, size)
            .id()
    }

    pub fn namespace(&mut self, parent: NodeId, offset: usize, name: Option<&str>) -> NodeId
    {
        let node = self.tree.add_child(parent, Tag::Namespace, offset);
        match name {
            Some(name) => node.attr(Attr::Name, name).id(),
            None => node.id(),
        }
    }

    /// Instance member at `location`.
    pub fn member(&mut self, parent: NodeId, offset: usize, name: &str, type_offset: usize, location: u64) -> NodeId
    {
        self.tree
            .add_child(parent, Tag::Member, offset)
            .attr(Attr::Name, name)
            .attr(Attr::Type, Offset(type_offset))
            .attr(Attr::DataMemberLocation, location)
            .id()
    }

    /// Member with only name and type, as in unions.
    pub fn plain_member(&mut self, parent: NodeId, offset: usize, name: &str, type_offset: usize) -> NodeId
    {
        self.tree
            .add_child(parent, Tag::Member, offset)
            .attr(Attr::Name, name)
            .attr(Attr::Type, Offset(type_offset))
            .id()
    }

    pub fn inheritance(&mut self, parent: NodeId, offset: usize, type_offset: usize, location: u64) -> NodeId
    {
        self.tree
            .add_child(parent, Tag::Inheritance, offset)
            .attr(Attr::Type, Offset(type_offset))
            .attr(Attr::DataMemberLocation, location)
            .id()
    }

    pub fn pointer(&mut self, offset: usize, type_offset: Option<usize>) -> NodeId
    {
        let root = self.root();
        let node = self.tree.add_child(root, Tag::PointerType, offset).attr(Attr::ByteSize, 8_u64);
        match type_offset {
            Some(inner) => node.attr(Attr::Type, Offset(inner)).id(),
            None => node.id(),
        }
    }

    pub fn reference(&mut self, offset: usize, type_offset: usize) -> NodeId
    {
        let root = self.root();
        self.tree
            .add_child(root, Tag::ReferenceType, offset)
            .attr(Attr::ByteSize, 8_u64)
            .attr(Attr::Type, Offset(type_offset))
            .id()
    }

    pub fn const_type(&mut self, offset: usize, type_offset: usize) -> NodeId
    {
        let root = self.root();
        self.tree
            .add_child(root, Tag::ConstType, offset)
            .attr(Attr::Type, Offset(type_offset))
            .id()
    }

    pub fn typedef(&mut self, offset: usize, name: &str, type_offset: usize) -> NodeId
    {
        let root = self.root();
        self.tree
            .add_child(root, Tag::Typedef, offset)
            .attr(Attr::Name, name)
            .attr(Attr::Type, Offset(type_offset))
            .id()
    }

    /// Array of `element` with one subrange per `(offset, lower, upper)`.
    /// A `None` lower bound leaves the language default in effect.
    pub fn array(&mut self, offset: usize, element: usize, dimensions: &[(usize, Option<i64>, i64)]) -> NodeId
    {
        let root = self.root();
        let array = self
            .tree
            .add_child(root, Tag::ArrayType, offset)
            .attr(Attr::Type, Offset(element))
            .attr(Attr::Sibling, Offset(offset + 0x40))
            .id();
        for &(subrange_offset, lower, upper) in dimensions {
            let subrange = self
                .tree
                .add_child(array, Tag::SubrangeType, subrange_offset)
                .attr(Attr::Type, Offset(LONG))
                .attr(Attr::UpperBound, upper)
                .id();
            if let Some(lower) = lower {
                self.tree.set_attr(subrange, Attr::LowerBound, lower);
            }
        }
        array
    }

    pub fn set(&mut self, id: NodeId, attr: Attr, value: impl Into<dwarfidl_core::AttrValue>)
    {
        self.tree.set_attr(id, attr, value);
    }

    pub fn finish(self) -> CompileUnit
    {
        CompileUnit {
            offset: self.tree.root().offset(),
            version: self.version,
            tree: self.tree,
        }
    }
}

/// Run one file's units through a fresh pipeline.
pub fn run(units: Vec<CompileUnit>) -> Pipeline
{
    let mut pipeline = Pipeline::new(PipelineOptions::default());
    pipeline.process_units(units).expect("pipeline run");
    pipeline
}

pub fn to_value(namespace: &Namespace) -> serde_json::Value
{
    serde_json::from_str(&jidl::to_string(namespace).expect("serialize")).expect("reparse")
}

/// `struct StructA { char a; int b; };`
pub fn struct_a_unit() -> CompileUnit
{
    let mut unit = UnitFixture::new(DW_LANG_C99, 4);
    let root = unit.root();
    let structure = unit.structure(root, 0x40, "StructA", 8);
    unit.member(structure, 0x48, "a", CHAR, 0);
    unit.member(structure, 0x50, "b", INT, 4);
    unit.finish()
}
