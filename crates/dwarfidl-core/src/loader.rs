//! # Debug-Info Loader
//!
//! Reads an object file with `object`, loads its DWARF sections and converts
//! every compilation unit into an owned [`NodeTree`].
//!
//! ## Offsets
//!
//! Node offsets and reference-class attributes (`DW_AT_type`,
//! `DW_AT_sibling`) are normalized to `.debug_info` section offsets, so all
//! units of one file share a single offset space. Offsets of different files
//! are unrelated.
//!
//! ## Attribute forms
//!
//! Only the attributes listed in [`Attr::ALL`] are copied. Values are reduced
//! to [`AttrValue`]: typed gimli values (`DW_ATE_*`, `DW_ACCESS_*`,
//! `DW_LANG_*`) become unsigned codes, strings are resolved through
//! `.debug_str`, and a `DW_AT_data_member_location` written as a
//! `DW_OP_plus_uconst` expression (DWARF 2 style) becomes its constant.
//! Values in any other form are dropped, which makes the attribute absent.
//!
//! ## Relocations
//!
//! Relocatable objects (`.o`) leave string and section offsets in
//! `.debug_info` unresolved until the linker runs. Every section is read
//! through a [`gimli::RelocateReader`] that applies the section's relocations
//! from `object` on the fly, so `-c` outputs and linked binaries read alike.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gimli::{
    AttributeValue, DebuggingInformationEntry, Dwarf, EndianArcSlice, EntriesTreeNode, Operation, Reader, ReaderOffset,
    RelocateReader, RunTimeEndian, SectionId, Unit, UnitOffset, UnitSectionOffset,
};
use object::{Object, ObjectSection};
use tracing::{debug, info, warn};

use crate::error::{map_dwarf_error, DwarfIdlError, Result};
use crate::node::{Attr, AttrValue, NodeId, NodeTree, Offset, Tag};

type OwnedReader = RelocateReader<EndianArcSlice<RunTimeEndian>, SectionRelocations>;
type OwnedDwarf = Dwarf<OwnedReader>;

/// Relocations of one section, shared by every reader cloned from it.
#[derive(Debug, Clone, Default)]
struct SectionRelocations(Arc<object::read::RelocationMap>);

impl gimli::read::Relocate for SectionRelocations
{
    fn relocate_address(&self, offset: usize, value: u64) -> gimli::Result<u64>
    {
        Ok(self.0.relocate(offset as u64, value))
    }

    fn relocate_offset(&self, offset: usize, value: usize) -> gimli::Result<usize>
    {
        <usize as ReaderOffset>::from_u64(self.0.relocate(offset as u64, value as u64))
    }
}

/// Uncompressed bytes of one DWARF section and the relocations that apply to them.
#[derive(Debug, Clone)]
struct LoadedSection
{
    data: Arc<[u8]>,
    relocations: SectionRelocations,
}

impl Default for LoadedSection
{
    fn default() -> Self
    {
        Self {
            data: Arc::from(Vec::new()),
            relocations: SectionRelocations::default(),
        }
    }
}

const DWARF_SECTIONS: &[(&str, &[&str])] = &[
    (".debug_abbrev", &[".debug_abbrev", "__debug_abbrev"]),
    (".debug_addr", &[".debug_addr", "__debug_addr"]),
    (".debug_info", &[".debug_info", "__debug_info"]),
    (".debug_line", &[".debug_line", "__debug_line"]),
    (".debug_line_str", &[".debug_line_str", "__debug_line_str"]),
    (".debug_ranges", &[".debug_ranges", "__debug_ranges"]),
    (".debug_rnglists", &[".debug_rnglists", "__debug_rnglists"]),
    (".debug_str", &[".debug_str", "__debug_str"]),
    (".debug_str_offsets", &[".debug_str_offsets", "__debug_str_offsets"]),
    (".debug_loc", &[".debug_loc", "__debug_loc"]),
    (".debug_loclists", &[".debug_loclists", "__debug_loclists"]),
];

/// One compilation unit converted to an owned node tree.
#[derive(Debug, Clone)]
pub struct CompileUnit
{
    /// Section offset of the unit root node
    pub offset: Offset,
    /// DWARF version from the unit header
    pub version: u16,
    pub tree: NodeTree,
}

/// All compilation units of one object file.
#[derive(Debug)]
pub struct DebugInfoFile
{
    path: PathBuf,
    units: Vec<CompileUnit>,
}

impl DebugInfoFile
{
    /// Read and convert the file at `path`.
    ///
    /// ## Errors
    ///
    /// - `Io`: the file cannot be read
    /// - `Object`: the container format is not recognized
    /// - `Dwarf`: the debug sections are malformed
    pub fn open(path: impl AsRef<Path>) -> Result<Self>
    {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Self::parse(path, &bytes)
    }

    /// Convert an in-memory object file. `path` is only used for messages.
    ///
    /// A file without `.debug_info` yields no units.
    pub fn parse(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self>
    {
        let path = path.into();
        let file = object::File::parse(bytes)
            .map_err(|err| DwarfIdlError::Object(format!("failed to parse {}: {err}", path.display())))?;

        let endian = if file.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };

        let mut sections = HashMap::new();
        for (canonical, aliases) in DWARF_SECTIONS {
            sections.insert(*canonical, load_section_bytes(&file, aliases)?);
        }

        if !sections.get(".debug_info").is_some_and(|section| !section.data.is_empty()) {
            warn!("{} has no debug information, compile with '-g'", path.display());
            return Ok(Self {
                path,
                units: Vec::new(),
            });
        }

        let dwarf = Dwarf::load(|section| Ok::<_, gimli::Error>(section_reader(&sections, endian, section)))
            .map_err(|err| map_dwarf_error("loading DWARF sections", err))?;

        let mut units = Vec::new();
        let mut headers = dwarf.units();
        while let Some(header) = headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_info unit header", err))?
        {
            let unit = dwarf
                .unit(header)
                .map_err(|err| map_dwarf_error("parsing compilation unit", err))?;
            units.push(convert_unit(&dwarf, &unit)?);
        }

        info!("Loaded {} compilation units from {}", units.len(), path.display());
        Ok(Self { path, units })
    }

    #[must_use]
    pub fn path(&self) -> &Path
    {
        &self.path
    }

    #[must_use]
    pub fn units(&self) -> &[CompileUnit]
    {
        &self.units
    }

    #[must_use]
    pub fn into_units(self) -> Vec<CompileUnit>
    {
        self.units
    }
}

fn load_section_bytes(file: &object::File<'_>, names: &[&str]) -> Result<LoadedSection>
{
    for name in names {
        if let Some(section) = file.section_by_name(name) {
            let data = section
                .uncompressed_data()
                .map_err(|err| DwarfIdlError::Object(format!("failed to read {name}: {err}")))?;
            let data = match data {
                Cow::Borrowed(bytes) => Arc::<[u8]>::from(bytes.to_vec()),
                Cow::Owned(vec) => vec.into(),
            };
            let relocations = section.relocation_map().unwrap_or_else(|err| {
                warn!("Ignoring relocations of {name}: {err}");
                object::read::RelocationMap::default()
            });
            return Ok(LoadedSection {
                data,
                relocations: SectionRelocations(Arc::new(relocations)),
            });
        }
    }

    Ok(LoadedSection::default())
}

fn section_reader(sections: &HashMap<&'static str, LoadedSection>, endian: RunTimeEndian, id: SectionId) -> OwnedReader
{
    let key = match id {
        SectionId::DebugAbbrev => ".debug_abbrev",
        SectionId::DebugAddr => ".debug_addr",
        SectionId::DebugInfo => ".debug_info",
        SectionId::DebugLine => ".debug_line",
        SectionId::DebugLineStr => ".debug_line_str",
        SectionId::DebugRanges => ".debug_ranges",
        SectionId::DebugRngLists => ".debug_rnglists",
        SectionId::DebugStr => ".debug_str",
        SectionId::DebugStrOffsets => ".debug_str_offsets",
        SectionId::DebugLoc => ".debug_loc",
        SectionId::DebugLocLists => ".debug_loclists",
        _ => "",
    };

    let section = sections.get(key).cloned().unwrap_or_default();
    RelocateReader::new(EndianArcSlice::new(section.data, endian), section.relocations)
}

fn section_offset(unit: &Unit<OwnedReader>, offset: UnitOffset) -> Offset
{
    match offset.to_unit_section_offset(unit) {
        UnitSectionOffset::DebugInfoOffset(offset) => Offset(offset.0),
        UnitSectionOffset::DebugTypesOffset(offset) => Offset(offset.0),
    }
}

fn convert_unit(dwarf: &OwnedDwarf, unit: &Unit<OwnedReader>) -> Result<CompileUnit>
{
    let mut entries = unit
        .entries_tree(None)
        .map_err(|err| map_dwarf_error("reading unit entries", err))?;
    let root = entries
        .root()
        .map_err(|err| map_dwarf_error("reading unit root", err))?;

    let entry = root.entry();
    let offset = section_offset(unit, entry.offset());
    let mut tree = NodeTree::new(Tag::from(entry.tag()), offset);
    let root_id = tree.root_id();
    copy_attributes(dwarf, unit, entry, &mut tree, root_id)?;
    convert_children(dwarf, unit, root, &mut tree, root_id)?;

    let version = unit.header.version();
    debug!("Converted unit at {offset} (DWARF {version}, {} nodes)", tree.len());
    Ok(CompileUnit { offset, version, tree })
}

fn convert_children(
    dwarf: &OwnedDwarf,
    unit: &Unit<OwnedReader>,
    node: EntriesTreeNode<'_, '_, '_, OwnedReader>,
    tree: &mut NodeTree,
    parent: NodeId,
) -> Result<()>
{
    let mut children = node.children();
    while let Some(child) = children
        .next()
        .map_err(|err| map_dwarf_error("traversing DIE tree", err))?
    {
        let entry = child.entry();
        let id = tree
            .add_child(parent, Tag::from(entry.tag()), section_offset(unit, entry.offset()))
            .id();
        copy_attributes(dwarf, unit, entry, tree, id)?;
        convert_children(dwarf, unit, child, tree, id)?;
    }
    Ok(())
}

fn copy_attributes(
    dwarf: &OwnedDwarf,
    unit: &Unit<OwnedReader>,
    entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
    tree: &mut NodeTree,
    id: NodeId,
) -> Result<()>
{
    let mut attrs = entry.attrs();
    while let Some(attribute) = attrs
        .next()
        .map_err(|err| map_dwarf_error("reading attributes", err))?
    {
        let Some(attr) = Attr::ALL.into_iter().find(|attr| attr.dwarf_constant() == attribute.name()) else {
            continue;
        };
        if let Some(value) = convert_value(dwarf, unit, attr, attribute.value())? {
            tree.set_attr(id, attr, value);
        }
    }
    Ok(())
}

fn convert_value(
    dwarf: &OwnedDwarf,
    unit: &Unit<OwnedReader>,
    attr: Attr,
    value: AttributeValue<OwnedReader>,
) -> Result<Option<AttrValue>>
{
    let converted = match attr {
        Attr::Name | Attr::LinkageName | Attr::MipsLinkageName | Attr::Producer => {
            Some(AttrValue::String(attr_to_string(dwarf, unit, value)?))
        }
        Attr::Type | Attr::Sibling => match value {
            AttributeValue::UnitRef(offset) => Some(AttrValue::Reference(section_offset(unit, offset))),
            AttributeValue::DebugInfoRef(offset) => Some(AttrValue::Reference(Offset(offset.0))),
            _ => None,
        },
        Attr::Artificial | Attr::External => match value {
            AttributeValue::Flag(flag) => Some(AttrValue::Flag(flag)),
            _ => None,
        },
        Attr::Accessibility => match value {
            AttributeValue::Accessibility(access) => Some(AttrValue::Unsigned(u64::from(access.0))),
            other => other.udata_value().map(AttrValue::Unsigned),
        },
        Attr::Encoding => match value {
            AttributeValue::Encoding(encoding) => Some(AttrValue::Unsigned(u64::from(encoding.0))),
            other => other.udata_value().map(AttrValue::Unsigned),
        },
        Attr::Language => match value {
            AttributeValue::Language(language) => Some(AttrValue::Unsigned(u64::from(language.0))),
            other => other.udata_value().map(AttrValue::Unsigned),
        },
        Attr::UpperBound | Attr::LowerBound | Attr::ConstValue => match value {
            AttributeValue::Sdata(signed) => Some(AttrValue::Signed(signed)),
            other => other.udata_value().map(AttrValue::Unsigned),
        },
        Attr::DataMemberLocation => member_location(unit, value)?.map(AttrValue::Unsigned),
        Attr::ByteSize | Attr::BitSize | Attr::BitOffset | Attr::DataBitOffset => {
            value.udata_value().map(AttrValue::Unsigned)
        }
    };
    Ok(converted)
}

fn attr_to_string(dwarf: &OwnedDwarf, unit: &Unit<OwnedReader>, value: AttributeValue<OwnedReader>) -> Result<String>
{
    let reader = dwarf
        .attr_string(unit, value)
        .map_err(|err| map_dwarf_error("resolving DWARF string", err))?;
    let owned = match reader.to_string() {
        Ok(cow) => cow.into_owned(),
        Err(_) => reader
            .to_string_lossy()
            .map_err(|err| map_dwarf_error("decoding DWARF string", err))?
            .into_owned(),
    };
    Ok(owned)
}

/// Constant byte offset of a member, from a data form or a one-operation expression.
fn member_location(unit: &Unit<OwnedReader>, value: AttributeValue<OwnedReader>) -> Result<Option<u64>>
{
    if let Some(constant) = value.udata_value() {
        return Ok(Some(constant));
    }
    let AttributeValue::Exprloc(expression) = value else {
        return Ok(None);
    };

    let mut operations = expression.operations(unit.encoding());
    let first = operations
        .next()
        .map_err(|err| map_dwarf_error("decoding DW_AT_data_member_location", err))?;
    let second = operations
        .next()
        .map_err(|err| map_dwarf_error("decoding DW_AT_data_member_location", err))?;
    Ok(match (first, second) {
        (Some(Operation::PlusConstant { value } | Operation::UnsignedConstant { value }), None) => Some(value),
        (first, _) => {
            debug!("Unsupported DW_AT_data_member_location expression starting with {first:?}");
            None
        }
    })
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::node::DieRef;

    #[test]
    fn test_garbage_is_an_object_error()
    {
        let err = DebugInfoFile::parse("garbage.o", b"definitely not an object file").unwrap_err();
        assert!(matches!(err, DwarfIdlError::Object(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error()
    {
        let err = DebugInfoFile::open("/nonexistent/dwarfidl/input.o").unwrap_err();
        assert!(matches!(err, DwarfIdlError::Io(_)));
    }

    const SHAPES_OBJECT: &[u8] = include_bytes!("../tests/data/shapes.o");
    const RECORDS_OBJECT: &[u8] = include_bytes!("../tests/data/records.o");

    fn named_nodes<'a>(die: DieRef<'a>, tag: Tag, found: &mut Vec<(Offset, &'a str)>)
    {
        for child in die.children() {
            if child.tag() == tag {
                if let Ok(name) = child.name() {
                    found.push((child.offset(), name));
                }
            }
            named_nodes(child, tag, found);
        }
    }

    #[test]
    fn test_relocatable_object_resolves_strings()
    {
        let file = DebugInfoFile::parse("shapes.o", SHAPES_OBJECT).unwrap();
        assert_eq!(file.units().len(), 1);

        let unit = &file.units()[0];
        assert_eq!(unit.version, 5);
        assert_eq!(unit.offset, Offset(0xc));
        let root = unit.tree.root();
        assert_eq!(root.name().unwrap(), "shapes.cpp");
        assert_eq!(root.language().unwrap(), 0x21);

        let mut structures = Vec::new();
        named_nodes(root, Tag::StructureType, &mut structures);
        assert_eq!(
            structures,
            vec![
                (Offset(0x2a), "Point"),
                (Offset(0xab), "Widget"),
                (Offset(0xe1), "Flex"),
                (Offset(0x100), "Body"),
            ]
        );

        let mut namespaces = Vec::new();
        named_nodes(root, Tag::Namespace, &mut namespaces);
        assert_eq!(namespaces, vec![(Offset(0x1e), "geo")]);
    }

    #[test]
    fn test_relocatable_object_keeps_references_and_locations()
    {
        let file = DebugInfoFile::parse("shapes.o", SHAPES_OBJECT).unwrap();
        let root = file.units()[0].tree.root();

        let widget = root.children().find(|die| die.name().ok() == Some("Widget")).unwrap();
        let edge = widget.children().find(DieRef::is_inheritance).unwrap();
        assert_eq!(edge.type_offset().unwrap(), Offset(0x2a));
        assert_eq!(edge.data_member_location().unwrap(), 0);

        let point = root
            .children()
            .find(DieRef::is_namespace)
            .and_then(|geo| geo.children().find(DieRef::is_structure))
            .unwrap();
        let flag = point.children().find(|die| die.name().ok() == Some("flag")).unwrap();
        assert_eq!(flag.bit_size().unwrap(), 3);
        assert_eq!(flag.data_bit_offset().unwrap(), 40);
        assert_eq!(flag.type_offset().unwrap(), Offset(0x82));
    }

    #[test]
    fn test_dwarf4_object()
    {
        let file = DebugInfoFile::parse("records.o", RECORDS_OBJECT).unwrap();
        let unit = &file.units()[0];
        assert_eq!(unit.version, 4);
        assert_eq!(unit.tree.root().language().unwrap(), 0x0c);

        let record = unit
            .tree
            .root()
            .children()
            .find(|die| die.name().ok() == Some("Record"))
            .unwrap();
        let locations: Vec<_> = record
            .children()
            .map(|member| (member.name().unwrap(), member.data_member_location().unwrap()))
            .collect();
        assert_eq!(locations, vec![("header", 0), ("payload", 4), ("value", 0x14), ("next", 0x18)]);
    }

    #[test]
    fn test_absent_section_reads_empty()
    {
        let sections = HashMap::new();
        let reader = section_reader(&sections, RunTimeEndian::Little, SectionId::DebugInfo);
        assert!(Reader::is_empty(&reader));
    }
}
