//! Structured output schema for llama.cpp
//!
//! llama.cpp turns a JSON schema into a sampling grammar, so output produced
//! under this schema is guaranteed to parse.

use crate::core::constants::defaults;
use crate::core::provider::InferenceError;
use crate::models::extraction::ExampleData;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};

/// Provider settings that enable a schema
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaConfig {
    pub response_schema: Value,
    pub structured_output: bool,
}

/// JSON schema derived from extraction examples
#[derive(Debug, Clone, PartialEq)]
pub struct LlamaCppSchema {
    schema: Value,
    classes: BTreeSet<String>,
}

impl LlamaCppSchema {
    /// Wrap a hand-written schema; it names no extraction classes
    pub fn new(schema: Value) -> Self {
        Self {
            schema,
            classes: BTreeSet::new(),
        }
    }

    /// Build a schema from few-shot examples
    ///
    /// Each extraction class becomes a string property. Classes that carry
    /// attributes also get a `<class><attribute_suffix>` object property.
    ///
    /// # Errors
    ///
    /// Returns `InferenceError::Config` when a class name equals another
    /// class's attribute property name, since both would share one key.
    pub fn from_examples(
        examples: &[ExampleData],
        attribute_suffix: Option<&str>,
    ) -> Result<Self, InferenceError> {
        let suffix = attribute_suffix.unwrap_or(defaults::ATTRIBUTE_SUFFIX);

        // class -> attribute -> seen as list
        let mut classes: BTreeMap<&str, BTreeMap<&str, bool>> = BTreeMap::new();
        for example in examples {
            for extraction in &example.extractions {
                let attrs = classes
                    .entry(extraction.extraction_class.as_str())
                    .or_default();
                if let Some(ref attributes) = extraction.attributes {
                    for (key, value) in attributes {
                        let is_list = attrs.entry(key.as_str()).or_insert(false);
                        *is_list |= value.is_array();
                    }
                }
            }
        }

        for (class, attrs) in &classes {
            let attr_key = format!("{}{}", class, suffix);
            if !attrs.is_empty() && classes.contains_key(attr_key.as_str()) {
                return Err(InferenceError::Config(format!(
                    "Extraction class {:?} collides with the attributes of class {:?}",
                    attr_key, class
                )));
            }
        }

        let mut properties = Map::new();
        for (class, attrs) in &classes {
            properties.insert(class.to_string(), json!({ "type": "string" }));
            if attrs.is_empty() {
                continue;
            }
            let mut attr_properties = Map::new();
            for (attr, is_list) in attrs {
                let attr_schema = if *is_list {
                    json!({ "type": "array", "items": { "type": "string" } })
                } else {
                    json!({ "type": "string" })
                };
                attr_properties.insert(attr.to_string(), attr_schema);
            }
            properties.insert(
                format!("{}{}", class, suffix),
                json!({ "type": "object", "properties": attr_properties }),
            );
        }

        let schema = json!({
            "type": "object",
            "properties": {
                "extractions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": properties,
                    }
                }
            },
            "required": ["extractions"],
        });

        Ok(Self {
            schema,
            classes: classes.keys().map(|c| c.to_string()).collect(),
        })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Extraction classes the schema was built from
    pub fn classes(&self) -> &BTreeSet<String> {
        &self.classes
    }

    /// Provider settings that enable this schema
    pub fn to_provider_config(&self) -> SchemaConfig {
        SchemaConfig {
            response_schema: self.schema.clone(),
            structured_output: self.supports_strict_mode(),
        }
    }

    /// Grammar-constrained sampling enforces the schema exactly
    pub fn supports_strict_mode(&self) -> bool {
        true
    }
}
