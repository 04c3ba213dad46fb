//! Parsed field-selection input.
//!
//! This is the shape a GraphQL layer hands over after parsing resolve info:
//! each field has a name, its arguments and its own sub-selections. Leaf
//! fields may be written as bare strings:
//!
//! ```json
//! { "entity": "Author",
//!   "selection": {
//!     "name": "authors",
//!     "args": { "where": { "name": { "eq": "A" } }, "limit": 10 },
//!     "selections": ["id", "name", { "name": "books", "selections": ["title"] }] } }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default, deserialize_with = "deserialize_selections")]
    pub selections: Vec<FieldSelection>,
}

impl FieldSelection {
    pub fn leaf(name: impl Into<String>) -> Self {
        FieldSelection {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_selections(name: impl Into<String>, selections: Vec<FieldSelection>) -> Self {
        FieldSelection {
            name: name.into(),
            args: Map::new(),
            selections,
        }
    }

    pub fn with_args(mut self, args: Map<String, Value>) -> Self {
        self.args = args;
        self
    }
}

/// A read request: the root entity plus the caller's field selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadRequest {
    pub entity: String,
    pub selection: FieldSelection,
}

fn deserialize_selections<'de, D>(deserializer: D) -> Result<Vec<FieldSelection>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Name(String),
        Field(FieldSelection),
    }

    let entries = Vec::<Entry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            Entry::Name(name) => FieldSelection::leaf(name),
            Entry::Field(field) => field,
        })
        .collect())
}
