//! Text vectorizer shared by intent classification and concept similarity.
//!
//! `TfidfVectorizer` is loaded from a JSON export of a fitted TF-IDF model:
//!
//! ```json
//! { "vocabulary": {"binary": 0, "search": 1}, "idf": [1.4, 1.2],
//!   "lowercase": true, "token_pattern": "(?u)\\b\\w\\w+\\b",
//!   "ngram_range": [1, 1], "sublinear_tf": false, "norm": "l2" }
//! ```

use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{LoadError, LoadResult};

/// `text → fixed-dimension vector`. Pure; safe to call from concurrent requests.
pub trait TextVectorizer: Send + Sync {
    fn dimension(&self) -> usize;

    fn transform(&self, text: &str) -> Vec<f32>;

    fn transform_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.transform(t)).collect()
    }
}

const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    None,
}

/// On-disk form of the vectorizer.
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfArtifact {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f32>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default)]
    pub norm: Norm,
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    lowercase: bool,
    token_re: Regex,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Norm,
}

impl TfidfVectorizer {
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let artifact: TfidfArtifact = crate::read_json(path)?;
        let v = Self::from_artifact(artifact).map_err(|reason| LoadError::artifact(path, reason))?;
        tracing::info!(
            "[CONCEPTBOT] Vectorizer loaded: {} terms, dimension {}",
            v.vocabulary.len(),
            v.idf.len()
        );
        Ok(v)
    }

    /// Validate and compile an artifact. The error string names the inconsistency.
    pub fn from_artifact(a: TfidfArtifact) -> Result<Self, String> {
        let dim = a.idf.len();
        if let Some((term, col)) = a.vocabulary.iter().find(|&(_, &c)| c >= dim) {
            return Err(format!(
                "vocabulary term '{}' maps to column {} but idf has {} entries",
                term, col, dim
            ));
        }
        let (lo, hi) = a.ngram_range;
        if lo == 0 || lo > hi {
            return Err(format!("invalid ngram_range ({}, {})", lo, hi));
        }
        let token_re = Regex::new(&a.token_pattern)
            .map_err(|e| format!("bad token_pattern: {}", e))?;
        Ok(Self {
            vocabulary: a.vocabulary,
            idf: a.idf,
            lowercase: a.lowercase,
            token_re,
            ngram_range: a.ngram_range,
            sublinear_tf: a.sublinear_tf,
            norm: a.norm,
        })
    }

    fn terms(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = self.token_re.find_iter(&text).map(|m| m.as_str()).collect();
        let (lo, hi) = self.ngram_range;
        let mut terms = Vec::new();
        for n in lo..=hi {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }
}

impl TextVectorizer for TfidfVectorizer {
    fn dimension(&self) -> usize {
        self.idf.len()
    }

    fn transform(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.idf.len()];
        for term in self.terms(text) {
            if let Some(&col) = self.vocabulary.get(&term) {
                v[col] += 1.0;
            }
        }
        for (col, x) in v.iter_mut().enumerate() {
            if *x > 0.0 {
                let tf = if self.sublinear_tf { 1.0 + x.ln() } else { *x };
                *x = tf * self.idf[col];
            }
        }
        if self.norm == Norm::L2 {
            l2_normalize(&mut v);
        }
        v
    }
}

/// In-place L2 normalization; the zero vector is left as is.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
