//! Similarity index: one vector per concept, built once after the knowledge base loads.

use crate::classifier::argmax;
use crate::knowledge::KnowledgeBase;
use crate::vectorizer::TextVectorizer;

/// Best concept row and its cosine score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConceptMatch {
    pub index: usize,
    pub score: f32,
}

/// Row `i` is the vector of the `i`-th concept of the knowledge base.
#[derive(Debug, Clone, Default)]
pub struct SimilarityIndex {
    vectors: Vec<Vec<f32>>,
}

impl SimilarityIndex {
    /// Vectorize every concept's synthesized document in one batch.
    pub fn build(knowledge: &KnowledgeBase, vectorizer: &dyn TextVectorizer) -> Self {
        let docs = knowledge.documents();
        let vectors = vectorizer.transform_batch(&docs);
        debug_assert_eq!(vectors.len(), knowledge.len());
        tracing::info!("[CONCEPTBOT] Similarity index built: {} concept vectors", vectors.len());
        Self { vectors }
    }

    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Self {
        Self { vectors }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Cosine score of `query` against every row, in row order.
    pub fn scores(&self, query: &[f32]) -> Vec<f32> {
        self.vectors.iter().map(|v| cosine_similarity(query, v)).collect()
    }

    /// Highest-scoring row; ties go to the lowest index. `None` for an empty index.
    pub fn best_match(&self, query: &[f32]) -> Option<ConceptMatch> {
        argmax(&self.scores(query)).map(|(index, score)| ConceptMatch { index, score })
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut na = 0f32;
    let mut nb = 0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}
