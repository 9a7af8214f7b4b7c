//! # JIDL
//!
//! The serialized form of a resolved namespace tree, consumed by code
//! generators.
//!
//! ```text
//! namespace   {namespaces?, structures?, unions?, enumerations?}
//! structure   {byteSize, members?, staticMembers?, baseStructures?}
//! member      {byteOffset?, bitOffset?, bitSize?, byteSize?, type?, upperBound?, lowerBound?, bounds?}
//! union       {byteSize, members?}
//! enumeration {byteSize, encoding, type?, values}
//! ```
//!
//! Empty maps and absent values are omitted. `bounds` lists every dimension
//! and is only written for arrays with more than one; `lowerBound` and
//! `upperBound` always describe the outermost one. Parsing accepts exactly
//! what serialization produces, so the model survives a round trip.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Accessibility, Enumeration, Member, Namespace, Structure, Union};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JidlNamespace
{
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub namespaces: IndexMap<String, JidlNamespace>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub structures: IndexMap<String, JidlStructure>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub unions: IndexMap<String, JidlUnion>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub enumerations: IndexMap<String, JidlEnumeration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JidlStructure
{
    pub byte_size: u64,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub members: IndexMap<String, JidlMember>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub static_members: IndexMap<String, JidlMember>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub base_structures: IndexMap<String, JidlBaseStructure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JidlMember
{
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<i64>,
    #[serde(default, skip_serializing_if = "is_single_dimension")]
    pub bounds: Vec<[i64; 2]>,
}

fn is_single_dimension(bounds: &[[i64; 2]]) -> bool
{
    bounds.len() < 2
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JidlBaseStructure
{
    pub accessibility: Accessibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JidlUnion
{
    pub byte_size: u64,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub members: IndexMap<String, JidlMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JidlEnumeration
{
    pub byte_size: u64,
    pub encoding: u64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub values: IndexMap<String, i64>,
}

impl From<&Member> for JidlMember
{
    fn from(member: &Member) -> Self
    {
        let outermost = member.bounds.first();
        let bounds = if member.bounds.len() > 1 {
            member.bounds.iter().map(|dimension| [dimension.lower, dimension.upper]).collect()
        } else {
            Vec::new()
        };
        Self {
            byte_offset: if member.is_static { None } else { member.byte_offset },
            bit_offset: member.bit_offset,
            bit_size: member.bit_size,
            byte_size: member.byte_size,
            type_name: member.type_name.clone(),
            upper_bound: outermost.map(|dimension| dimension.upper),
            lower_bound: outermost.map(|dimension| dimension.lower),
            bounds,
        }
    }
}

impl From<&Structure> for JidlStructure
{
    fn from(structure: &Structure) -> Self
    {
        let members = structure
            .instance_members()
            .map(|member| (member.name.clone(), JidlMember::from(member)))
            .collect();
        let static_members = structure
            .static_members()
            .map(|member| (member.name.clone(), JidlMember::from(member)))
            .collect();
        // Edges whose type never resolved have no name to key them by.
        let base_structures = structure
            .base_structures
            .iter()
            .filter_map(|base| {
                base.type_name.clone().map(|name| {
                    let edge = JidlBaseStructure {
                        accessibility: base.accessibility,
                        byte_offset: base.byte_offset,
                    };
                    (name, edge)
                })
            })
            .collect();
        Self {
            byte_size: structure.byte_size,
            members,
            static_members,
            base_structures,
        }
    }
}

impl From<&Union> for JidlUnion
{
    fn from(union: &Union) -> Self
    {
        Self {
            byte_size: union.byte_size,
            members: union
                .members
                .values()
                .map(|member| (member.name.clone(), JidlMember::from(member)))
                .collect(),
        }
    }
}

impl From<&Enumeration> for JidlEnumeration
{
    fn from(enumeration: &Enumeration) -> Self
    {
        Self {
            byte_size: enumeration.byte_size,
            encoding: enumeration.encoding,
            type_name: enumeration.type_name.clone(),
            values: enumeration.values.clone(),
        }
    }
}

impl From<&Namespace> for JidlNamespace
{
    fn from(namespace: &Namespace) -> Self
    {
        Self {
            namespaces: namespace
                .namespaces
                .iter()
                .map(|(name, child)| (name.clone(), JidlNamespace::from(child)))
                .collect(),
            structures: namespace
                .structures
                .iter()
                .map(|(name, structure)| (name.clone(), JidlStructure::from(structure)))
                .collect(),
            unions: namespace
                .unions
                .iter()
                .map(|(name, union)| (name.clone(), JidlUnion::from(union)))
                .collect(),
            enumerations: namespace
                .enumerations
                .iter()
                .map(|(name, enumeration)| (name.clone(), JidlEnumeration::from(enumeration)))
                .collect(),
        }
    }
}

/// Serialize a resolved namespace tree as indented JIDL.
pub fn to_string_pretty(namespace: &Namespace) -> Result<String>
{
    Ok(serde_json::to_string_pretty(&JidlNamespace::from(namespace))?)
}

/// Serialize a resolved namespace tree as compact JIDL.
pub fn to_string(namespace: &Namespace) -> Result<String>
{
    Ok(serde_json::to_string(&JidlNamespace::from(namespace))?)
}

/// Parse JIDL text.
pub fn from_str(text: &str) -> Result<JidlNamespace>
{
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests
{
    use serde_json::json;

    use super::*;
    use crate::model::{BaseStructure, Bounds};
    use crate::node::Offset;

    fn resolved_member(name: &str, type_name: &str, byte_offset: u64, byte_size: u64) -> Member
    {
        let mut member = Member::new(name, Offset(0), Accessibility::Public);
        member.type_name = Some(type_name.to_owned());
        member.byte_offset = Some(byte_offset);
        member.byte_size = Some(byte_size);
        member
    }

    #[test]
    fn test_structure_shape()
    {
        let mut root = Namespace::root();
        let structure = root.create_structure("StructA", 8);
        structure.upsert_member(resolved_member("a", "char", 0, 1));
        structure.upsert_member(resolved_member("b", "int", 4, 4));

        let value = serde_json::to_value(JidlNamespace::from(&root)).unwrap();
        assert_eq!(
            value,
            json!({
                "structures": {
                    "StructA": {
                        "byteSize": 8,
                        "members": {
                            "a": {"byteOffset": 0, "byteSize": 1, "type": "char"},
                            "b": {"byteOffset": 4, "byteSize": 4, "type": "int"}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_static_members_and_bases()
    {
        let mut structure = Structure::new("Counter", 4);
        let mut count = Member::new("count", Offset(0), Accessibility::Private);
        count.type_name = Some("int".into());
        count.byte_size = Some(4);
        count.is_static = true;
        structure.upsert_member(count);

        let mut base = BaseStructure::new(Offset(0x40), Accessibility::Public, Some(0));
        base.type_name = Some("Base".into());
        structure.base_structures.push(base);
        structure
            .base_structures
            .push(BaseStructure::new(Offset(0x99), Accessibility::Public, Some(8)));

        let value = serde_json::to_value(JidlStructure::from(&structure)).unwrap();
        assert_eq!(
            value,
            json!({
                "byteSize": 4,
                "staticMembers": {"count": {"byteSize": 4, "type": "int"}},
                "baseStructures": {"Base": {"accessibility": "public", "byteOffset": 0}}
            })
        );
    }

    #[test]
    fn test_member_bounds()
    {
        let mut member = resolved_member("grid", "array of int", 0, 60);
        member.bounds.push(Bounds::new(0, 2));
        let value = serde_json::to_value(JidlMember::from(&member)).unwrap();
        assert_eq!(value["lowerBound"], 0);
        assert_eq!(value["upperBound"], 2);
        assert!(value.get("bounds").is_none());

        member.bounds.push(Bounds::new(1, 5));
        let value = serde_json::to_value(JidlMember::from(&member)).unwrap();
        assert_eq!(value["bounds"], json!([[0, 2], [1, 5]]));
    }

    #[test]
    fn test_bitfield_omits_byte_size()
    {
        let mut member = Member::new("flag", Offset(0), Accessibility::Public);
        member.type_name = Some("unsigned int".into());
        member.byte_offset = Some(0);
        member.bit_offset = Some(3);
        member.bit_size = Some(1);
        let value = serde_json::to_value(JidlMember::from(&member)).unwrap();
        assert_eq!(value, json!({"byteOffset": 0, "bitOffset": 3, "bitSize": 1, "type": "unsigned int"}));
    }

    #[test]
    fn test_round_trip()
    {
        let mut root = Namespace::root();
        let inner = root.create_namespace("outer").create_namespace("inner");
        inner
            .create_structure("Widget", 8)
            .upsert_member(resolved_member("id", "long", 0, 8));
        let colour = inner.create_enumeration("Colour", 4, Offset(0x60), 7);
        colour.type_name = Some("unsigned int".into());
        colour.add_value("Red", 0);
        colour.add_value("Blue", 2);
        root.create_union("Any", 8)
            .upsert_member(resolved_member("bits", "long", 0, 8));

        let text = to_string_pretty(&root).unwrap();
        let parsed = from_str(&text).unwrap();
        assert_eq!(parsed, JidlNamespace::from(&root));
        assert_eq!(serde_json::to_string_pretty(&parsed).unwrap(), text);
        assert_eq!(from_str(&to_string(&root).unwrap()).unwrap(), parsed);
    }

    #[test]
    fn test_empty_namespace_is_empty_object()
    {
        assert_eq!(to_string(&Namespace::root()).unwrap(), "{}");
    }
}
