use serde::{Deserialize, Serialize};

pub mod aggregation;
pub mod class_registry;

pub use aggregation::{AggregationNode, AggregationTree};
pub use class_registry::ClassRegistry;

/// Server-registered metadata describing a heap object type.  The name is a
/// dotted hierarchical identifier like `java.lang.String`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ClassDefinition {
    pub id: u64,
    pub name: String,
}

impl ClassDefinition {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// One (class id, object count, total byte size) measurement from a histogram
/// query.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Sample {
    #[serde(rename = "id")]
    pub class_id: u64,
    pub count: u64,
    #[serde(rename = "nbytes")]
    pub byte_size: u64,
}

#[test]
fn test_sample_wire_names() {
    let sample: Sample =
        serde_json::from_str(r#"{"id": 3, "count": 5, "nbytes": 50}"#).unwrap();
    assert_eq!(
        sample,
        Sample {
            class_id: 3,
            count: 5,
            byte_size: 50
        }
    );
}
