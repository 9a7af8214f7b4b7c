//! # Skeleton Builder
//!
//! First pass over a compilation unit.
//!
//! The builder descends depth-first through every node. Type-describing
//! nodes are normalized into the [`FlatTypeTable`]; structures, unions and
//! enumerations are additionally created (or fetched) in the current
//! [`Namespace`] together with their members, inheritance edges and values.
//!
//! Namespace nodes switch the context for their own subtree through
//! [`TypePolicy::enter_namespace`]. Every other node, including structures,
//! is descended into with the current context, so nested types land in the
//! namespace enclosing their parent.
//!
//! Nodes that fail a validity predicate are skipped without error. Only
//! contract violations inside a policy (a getter called for an attribute the
//! predicate did not check) abort the unit.

use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::model::{BaseStructure, Member, Namespace};
use crate::node::{DieRef, NodeId, NodeTree, Tag};
use crate::policy::TypePolicy;
use crate::table::{FlatTypeTable, TypeFragment};

/// Walks one compilation unit into a namespace skeleton and a flat type table.
pub struct SkeletonBuilder<'a>
{
    policy: &'a dyn TypePolicy,
    table: &'a mut FlatTypeTable,
}

impl<'a> SkeletonBuilder<'a>
{
    pub fn new(policy: &'a dyn TypePolicy, table: &'a mut FlatTypeTable) -> Self
    {
        Self { policy, table }
    }

    /// Build everything below the unit root into `namespace`.
    ///
    /// The tree is mutable only for the enclosing-namespace annotations
    /// stamped on namespace entry.
    ///
    /// ## Errors
    ///
    /// - `MissingAttribute`: a policy extractor read an unchecked attribute
    /// - `UnknownAccessibilityDefault`: a member without accessibility sits in
    ///   a parent that is neither structure, class nor union
    pub fn build_unit(&mut self, tree: &mut NodeTree, namespace: &mut Namespace) -> Result<()>
    {
        let before = self.table.len();
        let root = tree.root_id();
        self.walk(tree, root, namespace)?;
        debug!(
            "Unit at {} added {} type fragments",
            tree.root().offset(),
            self.table.len() - before
        );
        Ok(())
    }

    fn walk(&mut self, tree: &mut NodeTree, id: NodeId, namespace: &mut Namespace) -> Result<()>
    {
        let children = tree.get(id).child_ids().to_vec();
        for child in children {
            if tree.get(child).is_namespace() {
                let inner = self.policy.enter_namespace(tree, child, namespace)?;
                self.walk(tree, child, inner)?;
                continue;
            }
            self.build(tree.get(child), namespace)?;
            self.walk(tree, child, namespace)?;
        }
        Ok(())
    }

    fn build(&mut self, die: DieRef<'_>, namespace: &mut Namespace) -> Result<()>
    {
        match die.tag() {
            Tag::StructureType | Tag::ClassType => self.build_structure(die, namespace),
            Tag::UnionType => self.build_union(die, namespace),
            Tag::EnumerationType => self.build_enumeration(die, namespace),
            Tag::BaseType => self.build_base_type(die),
            Tag::StringType => self.build_string_type(die),
            Tag::Typedef => self.build_typedef(die),
            Tag::ArrayType => self.build_array(die),
            Tag::SubrangeType => self.build_subrange(die),
            Tag::PointerType => self.build_pointer(die),
            Tag::ReferenceType => self.build_reference(die),
            Tag::ConstType => self.build_const(die),
            _ => Ok(()),
        }
    }

    fn skip(die: DieRef<'_>)
    {
        trace!("Skipping {:?} at {}", die.tag(), die.offset());
    }

    fn build_structure(&mut self, die: DieRef<'_>, namespace: &mut Namespace) -> Result<()>
    {
        if !self.policy.valid_structure(die) {
            Self::skip(die);
            return Ok(());
        }

        let name = self.policy.type_name(die)?;
        let fragment = self.policy.structure(die)?;
        let byte_size = fragment.size;
        self.table.insert(die.offset(), TypeFragment::Structure(fragment));

        let mut members = Vec::new();
        let mut base_structures: Vec<BaseStructure> = Vec::new();
        for child in die.children() {
            // no template support
            if child.is_template_param() {
                continue;
            }
            if self.policy.is_inheritance(child) {
                if self.policy.valid_inheritance(child) {
                    base_structures.push(self.policy.base_structure(child)?);
                } else {
                    warn!("Skipping inheritance edge without a base type at {} in {name}", child.offset());
                }
            } else if child.is_member() {
                if let Some(member) = self.structure_member(child)? {
                    members.push(member);
                }
            }
        }

        debug!(
            "Structure {name} at {}: {} members, {} bases",
            die.offset(),
            members.len(),
            base_structures.len()
        );
        namespace
            .create_structure(&name, byte_size)
            .absorb(members, base_structures);
        Ok(())
    }

    fn structure_member(&self, die: DieRef<'_>) -> Result<Option<Member>>
    {
        if !self.policy.valid_structure_member(die) {
            Self::skip(die);
            return Ok(None);
        }

        let mut member = self.policy.member(die)?;
        if self.policy.valid_static_structure_member(die) {
            self.policy.static_member_data(die, &mut member)?;
        } else if self.policy.valid_instance_structure_member(die) {
            self.policy.instance_member_data(die, &mut member)?;
        }
        Ok(Some(member))
    }

    fn build_union(&mut self, die: DieRef<'_>, namespace: &mut Namespace) -> Result<()>
    {
        if !self.policy.valid_union(die) {
            Self::skip(die);
            return Ok(());
        }

        // Anonymous unions are all named UNKNOWN, so their members merge into one entry.
        let name = self.policy.type_name(die)?;
        let fragment = self.policy.union(die)?;
        let byte_size = fragment.size;
        self.table.insert(die.offset(), TypeFragment::Union(fragment));

        let mut members = Vec::new();
        for child in die.children() {
            if child.is_member() && self.policy.valid_union_member(child) {
                members.push(self.policy.member(child)?);
            }
        }

        let union = namespace.create_union(&name, byte_size);
        for member in members {
            union.upsert_member(member);
        }
        Ok(())
    }

    fn build_enumeration(&mut self, die: DieRef<'_>, namespace: &mut Namespace) -> Result<()>
    {
        if !self.policy.valid_enumeration(die) {
            Self::skip(die);
            return Ok(());
        }

        let name = self.policy.type_name(die)?;
        let fragment = self.policy.enumeration(die)?;
        let enumeration = namespace.create_enumeration(&name, fragment.size, fragment.inner, fragment.encoding);
        for child in die.children() {
            if child.is_enumerator() && self.policy.valid_enumerator(child) {
                let (value_name, value) = self.policy.enumerator(child)?;
                enumeration.add_value(value_name, value);
            }
        }
        self.table.insert(die.offset(), TypeFragment::Enumeration(fragment));
        Ok(())
    }

    fn build_base_type(&mut self, die: DieRef<'_>) -> Result<()>
    {
        if !self.policy.valid_base_type(die) {
            Self::skip(die);
            return Ok(());
        }
        let fragment = self.policy.base_type(die)?;
        self.table.insert(die.offset(), TypeFragment::Base(fragment));
        Ok(())
    }

    fn build_string_type(&mut self, die: DieRef<'_>) -> Result<()>
    {
        if !self.policy.valid_string_type(die) {
            Self::skip(die);
            return Ok(());
        }
        let fragment = self.policy.string_type(die)?;
        self.table.insert(die.offset(), TypeFragment::String(fragment));
        Ok(())
    }

    fn build_typedef(&mut self, die: DieRef<'_>) -> Result<()>
    {
        if !self.policy.valid_typedef(die) {
            Self::skip(die);
            return Ok(());
        }
        let fragment = self.policy.typedef(die)?;
        self.table.insert(die.offset(), TypeFragment::Typedef(fragment));
        Ok(())
    }

    fn build_array(&mut self, die: DieRef<'_>) -> Result<()>
    {
        if !self.policy.valid_array(die) {
            Self::skip(die);
            return Ok(());
        }
        let fragment = self.policy.array(die)?;
        self.table.insert(die.offset(), TypeFragment::Array(fragment));
        Ok(())
    }

    fn build_subrange(&mut self, die: DieRef<'_>) -> Result<()>
    {
        if !self.policy.valid_subrange(die) {
            Self::skip(die);
            return Ok(());
        }
        let fragment = self.policy.subrange(die)?;
        self.table.insert(die.offset(), TypeFragment::Subrange(fragment));
        Ok(())
    }

    fn build_pointer(&mut self, die: DieRef<'_>) -> Result<()>
    {
        if !self.policy.valid_pointer(die) {
            Self::skip(die);
            return Ok(());
        }
        let fragment = self.policy.pointer(die)?;
        self.table.insert(die.offset(), TypeFragment::Pointer(fragment));
        Ok(())
    }

    fn build_reference(&mut self, die: DieRef<'_>) -> Result<()>
    {
        if !self.policy.valid_reference(die) {
            Self::skip(die);
            return Ok(());
        }
        let fragment = self.policy.reference(die)?;
        self.table.insert(die.offset(), TypeFragment::Reference(fragment));
        Ok(())
    }

    fn build_const(&mut self, die: DieRef<'_>) -> Result<()>
    {
        if !self.policy.valid_const(die) {
            Self::skip(die);
            return Ok(());
        }
        let inner = self.policy.const_type(die)?;
        self.table.insert(die.offset(), TypeFragment::Const(inner));
        Ok(())
    }
}
