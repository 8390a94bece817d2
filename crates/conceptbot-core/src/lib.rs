//! Conceptbot — core library.
//! Knowledge base, similarity index, intent fallback and answer selection for the
//! concept-explainer chatbot. Everything here is loaded once and read-only afterwards.

pub mod classifier;
pub mod config;
pub mod error;
pub mod fallback;
pub mod formatter;
pub mod index;
pub mod knowledge;
pub mod selector;
pub mod vectorizer;

pub use classifier::{IntentClassifier, IntentPrediction, LabelEncoder, LinearIntentClassifier};
pub use config::ChatbotConfig;
pub use error::{ChatError, LoadError, LoadResult};
pub use fallback::FallbackTable;
pub use formatter::format_concept;
pub use index::{cosine_similarity, ConceptMatch, SimilarityIndex};
pub use knowledge::{ConceptEntry, ConceptRecord, KnowledgeBase};
pub use selector::{AnswerSelector, AnswerSource, ChatContext, SelectionPolicy, SelectionResult};
pub use vectorizer::{TextVectorizer, TfidfVectorizer};

use serde::de::DeserializeOwned;
use std::path::Path;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Read and parse a JSON document, tagging failures with the path.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> LoadResult<T> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
