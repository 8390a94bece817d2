//! Canned responses keyed by intent label.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{LoadError, LoadResult};

#[derive(Debug, Deserialize)]
struct IntentDoc {
    tag: String,
    #[serde(default)]
    responses: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Responses {
    One(String),
    Many(Vec<String>),
}

/// Accepted layouts of the intents file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IntentsFile {
    Training {
        intents: Vec<IntentDoc>,
        #[serde(flatten)]
        extra: HashMap<String, Value>,
    },
    Flat(HashMap<String, Responses>),
}

/// Intent label → first canned response. Immutable after load.
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
    responses: HashMap<String, String>,
}

impl FallbackTable {
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let file: IntentsFile = crate::read_json(path)?;
        let table = Self::from_file(file).map_err(|reason| LoadError::artifact(path, reason))?;
        tracing::info!(
            "[CONCEPTBOT] Fallback responses loaded: {} labels from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Mixing the two layouts is rejected rather than dropping the flat keys.
    fn from_file(file: IntentsFile) -> Result<Self, String> {
        let mut table = Self::default();
        match file {
            IntentsFile::Training { intents, extra } => {
                if !extra.is_empty() {
                    let mut keys: Vec<&str> = extra.keys().map(String::as_str).collect();
                    keys.sort_unstable();
                    return Err(format!(
                        "unexpected keys next to \"intents\": {}",
                        keys.join(", ")
                    ));
                }
                for intent in intents {
                    if let Some(first) = intent.responses.into_iter().next() {
                        table.insert_first(intent.tag, first);
                    }
                }
            }
            IntentsFile::Flat(map) => {
                for (label, responses) in map {
                    let first = match responses {
                        Responses::One(s) => Some(s),
                        Responses::Many(v) => v.into_iter().next(),
                    };
                    if let Some(first) = first {
                        table.insert_first(label, first);
                    }
                }
            }
        }
        Ok(table)
    }

    /// Build from `(label, response)` pairs; the first response per label wins.
    pub fn from_pairs<I, L, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        let mut table = Self::default();
        for (label, response) in pairs {
            table.insert_first(label.into(), response.into());
        }
        table
    }

    fn insert_first(&mut self, label: String, response: String) {
        self.responses.entry(label).or_insert(response);
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.responses.get(label).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.responses.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}
