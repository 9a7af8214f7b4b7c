//! Ada namespace inference.
//!
//! GNAT emits no namespace nodes. Every record sits in the unit root under
//! an expanded name such as `outer__inner__Widget`, where each `__`-separated
//! segment but the last is an enclosing package. Dispersal moves those
//! records into the nested namespaces their names describe, so Ada output has
//! the same shape as C++ output.

use tracing::{debug, warn};

use crate::model::Namespace;

/// Separator GNAT places between package and record names.
pub const ADA_SEPARATOR: &str = "__";

struct Move
{
    key: String,
    path: Vec<String>,
    name: String,
}

/// Split an expanded name into its package path and unqualified name.
///
/// Names without a separator, or with an empty segment (`__init`,
/// `a____b`), are not package-qualified.
fn split_expanded_name(key: &str) -> Option<(Vec<String>, String)>
{
    let segments: Vec<&str> = key.split(ADA_SEPARATOR).collect();
    if segments.len() < 2 || segments.iter().any(|segment| segment.is_empty()) {
        return None;
    }
    let (name, path) = segments.split_last()?;
    Some((path.iter().map(|segment| (*segment).to_owned()).collect(), (*name).to_owned()))
}

/// Move package-qualified records from the root of `namespace` into nested namespaces.
///
/// Moves are planned before any structure is touched. A record whose target
/// namespace cannot be found is left in place with a warning. Moving into a
/// namespace that already has a record of the same name merges the two.
///
/// Returns the number of records moved.
pub fn disperse_ada_structures(namespace: &mut Namespace) -> usize
{
    let moves: Vec<Move> = namespace
        .structures
        .keys()
        .filter_map(|key| {
            split_expanded_name(key).map(|(path, name)| Move {
                key: key.clone(),
                path,
                name,
            })
        })
        .collect();

    for planned in &moves {
        let mut target = &mut *namespace;
        for segment in &planned.path {
            target = target.create_namespace(segment);
        }
    }

    let mut moved = 0;
    for planned in moves {
        if namespace.namespace_at(&planned.path).is_none() {
            warn!(
                "Skipping record {} because namespace {} wasn't resolved",
                planned.key,
                planned.path.join("::")
            );
            continue;
        }
        let Some(mut structure) = namespace.structures.shift_remove(&planned.key) else {
            continue;
        };
        structure.name = planned.name;
        if let Some(target) = namespace.namespace_at_mut(&planned.path) {
            debug!("Moved record {} to {}", planned.key, planned.path.join("::"));
            target.insert_structure(structure);
            moved += 1;
        }
    }
    moved
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::model::{Accessibility, Member};
    use crate::node::Offset;

    #[test]
    fn test_single_package()
    {
        let mut root = Namespace::root();
        root.create_structure("records__record_a", 8);
        assert_eq!(disperse_ada_structures(&mut root), 1);
        assert!(root.structures.is_empty());
        let record = &root.namespaces["records"].structures["record_a"];
        assert_eq!(record.name, "record_a");
        assert_eq!(record.byte_size, 8);
    }

    #[test]
    fn test_nested_packages()
    {
        let mut root = Namespace::root();
        root.create_structure("outer__inner__Widget", 4);
        disperse_ada_structures(&mut root);
        assert!(!root.structures.contains_key("outer__inner__Widget"));
        assert!(root.namespaces["outer"].structures.is_empty());
        assert!(root.namespaces["outer"].namespaces["inner"].structures.contains_key("Widget"));
    }

    #[test]
    fn test_unqualified_names_stay()
    {
        let mut root = Namespace::root();
        root.create_structure("plain", 4);
        root.create_structure("__leading", 4);
        assert_eq!(disperse_ada_structures(&mut root), 0);
        assert_eq!(root.structures.len(), 2);
        assert!(root.namespaces.is_empty());
    }

    #[test]
    fn test_merges_into_existing_record()
    {
        let mut root = Namespace::root();
        root.create_namespace("pkg")
            .create_structure("rec", 8)
            .upsert_member(Member::new("a", Offset(0x10), Accessibility::Public));
        root.create_structure("pkg__rec", 8)
            .upsert_member(Member::new("b", Offset(0x20), Accessibility::Public));

        disperse_ada_structures(&mut root);
        let record = &root.namespaces["pkg"].structures["rec"];
        assert_eq!(record.members.len(), 2);
    }

    #[test]
    fn test_split_expanded_name()
    {
        assert_eq!(
            split_expanded_name("a__b__C"),
            Some((vec!["a".to_string(), "b".to_string()], "C".to_string()))
        );
        assert_eq!(split_expanded_name("single"), None);
        assert_eq!(split_expanded_name("a____b"), None);
    }
}
