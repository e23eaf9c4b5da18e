//! Few-shot extraction examples
//!
//! Examples describe the extraction classes and attributes a prompt expects,
//! and are the input for deriving a structured-output schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single labelled span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub extraction_class: String,
    pub extraction_text: String,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
}

impl Extraction {
    pub fn new(class: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            extraction_class: class.into(),
            extraction_text: text.into(),
            attributes: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }
}

/// Source text together with its expected extractions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleData {
    pub text: String,
    #[serde(default)]
    pub extractions: Vec<Extraction>,
}
