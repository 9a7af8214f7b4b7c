//! Tests running the whole pipeline over compiler-produced relocatable objects
//!
//! The objects and their sources live in `tests/data`.

mod common;

use std::path::PathBuf;

use common::to_value;
use dwarfidl_core::{Pipeline, PipelineOptions};
use serde_json::json;

fn fixture(name: &str) -> PathBuf
{
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data").join(name)
}

fn run_files(names: &[&str]) -> Pipeline
{
    let mut pipeline = Pipeline::new(PipelineOptions::default());
    for name in names {
        pipeline.process_file(fixture(name)).expect("process fixture");
    }
    pipeline
}

#[test]
fn test_cpp_object_end_to_end()
{
    let pipeline = run_files(&["shapes.o"]);
    assert_eq!(
        to_value(pipeline.namespace()),
        json!({
            "namespaces": {
                "geo": {
                    "structures": {
                        "Point": {
                            "byteSize": 40,
                            "members": {
                                "x": {"byteOffset": 0, "byteSize": 4, "type": "int"},
                                "c": {"byteOffset": 4, "byteSize": 1, "type": "char"},
                                "flag": {"byteOffset": 5, "bitOffset": 0, "bitSize": 3, "type": "unsigned int"},
                                "arr": {
                                    "byteOffset": 8,
                                    "byteSize": 24,
                                    "type": "array of int",
                                    "lowerBound": 0,
                                    "upperBound": 1,
                                    "bounds": [[0, 1], [0, 2]]
                                },
                                "name": {"byteOffset": 32, "byteSize": 8, "type": "char pointer"}
                            }
                        }
                    }
                }
            },
            "structures": {
                "Widget": {
                    "byteSize": 56,
                    "members": {
                        "id": {"byteOffset": 40, "byteSize": 8, "type": "long int"},
                        "ref": {"byteOffset": 48, "byteSize": 8, "type": "geo::Point reference"}
                    },
                    "baseStructures": {"geo::Point": {"accessibility": "public", "byteOffset": 0}}
                },
                "Flex": {
                    "byteSize": 8,
                    "members": {"ratio": {"byteOffset": 0, "byteSize": 8, "type": "double"}}
                },
                "Body": {
                    "byteSize": 16,
                    "members": {
                        "flex": {"byteOffset": 0, "byteSize": 8, "type": "Flex"},
                        "owner": {"byteOffset": 8, "byteSize": 8, "type": "Widget pointer"}
                    }
                }
            },
            "enumerations": {
                "Mode": {"byteSize": 1, "encoding": 8, "type": "unsigned char", "values": {"Off": 0, "On": 7}}
            }
        })
    );

    let stats = pipeline.stats();
    assert_eq!(stats.files, 1);
    assert_eq!(stats.units, 1);
    assert_eq!(stats.unresolved, 0);
}

#[test]
fn test_c_object_end_to_end()
{
    let pipeline = run_files(&["records.o"]);
    let value = to_value(pipeline.namespace());

    assert_eq!(
        value["structures"]["Record"],
        json!({
            "byteSize": 32,
            "members": {
                "header": {"byteOffset": 0, "byteSize": 4, "type": "Header"},
                "payload": {
                    "byteOffset": 4,
                    "byteSize": 16,
                    "type": "array of unsigned char",
                    "lowerBound": 0,
                    "upperBound": 15
                },
                "value": {"byteOffset": 20, "byteSize": 4, "type": "UNKNOWN"},
                "next": {"byteOffset": 24, "byteSize": 8, "type": "Record pointer"}
            }
        })
    );
    assert_eq!(
        value["structures"]["Header"]["members"]["length"],
        json!({"byteOffset": 2, "byteSize": 2, "type": "short unsigned int"})
    );
    assert_eq!(
        value["unions"]["UNKNOWN"],
        json!({
            "byteSize": 4,
            "members": {
                "as_int": {"byteSize": 4, "type": "int"},
                "as_float": {"byteSize": 4, "type": "float"}
            }
        })
    );
}

#[test]
fn test_objects_accumulate_into_one_model()
{
    let pipeline = run_files(&["shapes.o", "records.o"]);
    let namespace = pipeline.namespace();
    assert_eq!(pipeline.stats().files, 2);
    assert!(namespace.namespaces["geo"].structures.contains_key("Point"));
    assert!(namespace.structures.contains_key("Widget"));
    assert!(namespace.structures.contains_key("Record"));
    assert_eq!(namespace.structure_count(), 6);
}
