//! Knowledge base — concept name → entry, loaded once at startup and read-only after.
//!
//! Iteration order is the order of the source document (serde_json is built with
//! `preserve_order`), and position `i` here is position `i` in the similarity index.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{LoadError, LoadResult};

/// Fields a structured entry may carry, in rendering order.
pub const LEVEL: &str = "level";
pub const DEFINITION: &str = "definition";
pub const EXPLANATION: &str = "explanation";
pub const EXAMPLE: &str = "example";
pub const KEY_POINTS: &str = "key_points";
pub const INTERVIEW_TIP: &str = "interview_tip";

/// A concept entry: a structured record (JSON object) or any other freeform value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConceptEntry {
    Structured(ConceptRecord),
    Freeform(Value),
}

impl From<Value> for ConceptEntry {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => ConceptEntry::Structured(ConceptRecord { fields }),
            other => ConceptEntry::Freeform(other),
        }
    }
}

/// Structured record. Every field is optional; an absent field is never rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConceptRecord {
    fields: Map<String, Value>,
}

impl ConceptRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// A field set to `null` counts as absent.
    fn present(&self, field: &str) -> Option<&Value> {
        self.get(field).filter(|v| !v.is_null())
    }

    pub fn level(&self) -> Option<String> {
        self.present(LEVEL).map(value_text)
    }

    pub fn definition(&self) -> Option<String> {
        self.present(DEFINITION).map(value_text)
    }

    pub fn explanation(&self) -> Option<String> {
        self.present(EXPLANATION).map(value_text)
    }

    pub fn example(&self) -> Option<String> {
        self.present(EXAMPLE).map(value_text)
    }

    /// Key points as an ordered list. A scalar is treated as a single point.
    pub fn key_points(&self) -> Option<Vec<String>> {
        self.present(KEY_POINTS).map(|v| match v {
            Value::Array(items) => items.iter().map(value_text).collect(),
            other => vec![value_text(other)],
        })
    }

    pub fn interview_tip(&self) -> Option<String> {
        self.present(INTERVIEW_TIP).map(value_text)
    }

    /// All field values in the record's natural order (for document synthesis).
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }
}

/// Immutable concept store.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    concepts: Vec<(String, ConceptEntry)>,
    by_name: HashMap<String, usize>,
}

impl KnowledgeBase {
    /// Build from a JSON object. Anything but an object is rejected by the caller.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut concepts = Vec::with_capacity(map.len());
        let mut by_name = HashMap::with_capacity(map.len());
        for (name, value) in map {
            by_name.insert(name.clone(), concepts.len());
            concepts.push((name, ConceptEntry::from(value)));
        }
        Self { concepts, by_name }
    }

    /// Load the knowledge document (`{ concept_name: entry, ... }`).
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let doc: Value = crate::read_json(path)?;
        match doc {
            Value::Object(map) => {
                let kb = Self::from_map(map);
                tracing::info!(
                    "[CONCEPTBOT] Knowledge base loaded: {} concepts from {}",
                    kb.len(),
                    path.display()
                );
                Ok(kb)
            }
            _ => Err(LoadError::artifact(
                path,
                "knowledge base must be a JSON object of concept name -> entry",
            )),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ConceptEntry> {
        self.by_name.get(name).map(|&i| &self.concepts[i].1)
    }

    /// Concept at index-position `i` (matches the similarity index row).
    pub fn entry_at(&self, i: usize) -> Option<(&str, &ConceptEntry)> {
        self.concepts.get(i).map(|(n, e)| (n.as_str(), e))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.concepts.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConceptEntry)> {
        self.concepts.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Matching document for every concept, in iteration order.
    pub fn documents(&self) -> Vec<String> {
        self.iter().map(|(n, e)| concept_document(n, e)).collect()
    }
}

/// Synthesized text used to vectorize a concept: its display name followed by every
/// field value flattened to text.
pub fn concept_document(name: &str, entry: &ConceptEntry) -> String {
    let mut parts = vec![display_name(name)];
    match entry {
        ConceptEntry::Structured(record) => {
            parts.extend(record.values().map(flatten_text).filter(|s| !s.is_empty()));
        }
        ConceptEntry::Freeform(value) => {
            let text = flatten_text(value);
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }
    parts.join(" ")
}

/// Concept name with `_` / `-` separators replaced by spaces.
pub fn display_name(name: &str) -> String {
    name.replace(&['_', '-'][..], " ")
}

/// Scalar text: strings verbatim (no JSON quotes), everything else in JSON form.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Like [`value_text`], but sequences are flattened and joined with single spaces.
pub fn flatten_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(flatten_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        other => value_text(other),
    }
}

/// Title-case: the first letter of each run of letters is uppercased, the rest lowercased.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_letter = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(c);
            prev_letter = false;
        }
    }
    out
}
