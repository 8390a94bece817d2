//! Answer selection: semantic concept lookup blended with intent-classifier fallback.
//!
//! Priority, first match wins:
//! 1. a concept scored at or above the threshold, and the predicted label has no
//!    canned response → the formatted concept;
//! 2. the predicted label has a canned response → that response;
//! 3. otherwise → the miss message.
//!
//! Confidence is always the classifier's top probability, rounded to 3 decimals.

use serde::Serialize;
use std::sync::Arc;

use crate::classifier::{IntentClassifier, IntentPrediction, LinearIntentClassifier};
use crate::config::{ChatbotConfig, DEFAULT_MISS_MESSAGE, DEFAULT_SIMILARITY_THRESHOLD};
use crate::error::{ChatError, LoadResult};
use crate::fallback::FallbackTable;
use crate::formatter::format_concept;
use crate::index::{ConceptMatch, SimilarityIndex};
use crate::knowledge::KnowledgeBase;
use crate::vectorizer::{TextVectorizer, TfidfVectorizer};

/// Immutable, shareable bundle of everything loaded at startup.
#[derive(Clone)]
pub struct ChatContext {
    pub knowledge: Arc<KnowledgeBase>,
    pub index: Arc<SimilarityIndex>,
    pub vectorizer: Arc<dyn TextVectorizer>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub fallback: Arc<FallbackTable>,
}

impl ChatContext {
    /// Assemble a context; the similarity index is built here, once.
    pub fn new(
        knowledge: KnowledgeBase,
        vectorizer: Arc<dyn TextVectorizer>,
        classifier: Arc<dyn IntentClassifier>,
        fallback: FallbackTable,
    ) -> Self {
        let index = SimilarityIndex::build(&knowledge, vectorizer.as_ref());
        Self {
            knowledge: Arc::new(knowledge),
            index: Arc::new(index),
            vectorizer,
            classifier,
            fallback: Arc::new(fallback),
        }
    }

    /// Load every artifact named by the config. Any failure aborts startup.
    pub fn load(config: &ChatbotConfig) -> LoadResult<Self> {
        let vectorizer = TfidfVectorizer::load(&config.vectorizer_path)?;
        let classifier = LinearIntentClassifier::load(
            &config.classifier_path,
            &config.label_encoder_path,
            vectorizer.dimension(),
        )?;
        let knowledge = KnowledgeBase::load(&config.knowledge_path)?;
        let fallback = FallbackTable::load(&config.intents_path)?;

        let unanswered: Vec<&str> = classifier
            .labels()
            .iter()
            .map(String::as_str)
            .filter(|l| !fallback.contains(l))
            .collect();
        if !unanswered.is_empty() {
            tracing::info!(
                "[CONCEPTBOT] Labels without canned responses (defer to knowledge base): {}",
                unanswered.join(", ")
            );
        }

        Ok(Self::new(knowledge, Arc::new(vectorizer), Arc::new(classifier), fallback))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPolicy {
    pub similarity_threshold: f32,
    pub miss_message: String,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            miss_message: DEFAULT_MISS_MESSAGE.to_string(),
        }
    }
}

impl From<&ChatbotConfig> for SelectionPolicy {
    fn from(config: &ChatbotConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            miss_message: config.miss_message.clone(),
        }
    }
}

/// Where the answer came from.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerSource {
    Concept { name: String, score: f32 },
    Fallback { label: String },
    Miss,
}

/// Wire shape is `{"response": ..., "confidence": ...}`; the source is for logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    pub response: String,
    pub confidence: f64,
    #[serde(skip)]
    pub source: AnswerSource,
}

pub struct AnswerSelector {
    context: ChatContext,
    policy: SelectionPolicy,
}

impl AnswerSelector {
    pub fn new(context: ChatContext, policy: SelectionPolicy) -> Self {
        Self { context, policy }
    }

    pub fn context(&self) -> &ChatContext {
        &self.context
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Best concept for an already-vectorized utterance, or `None` below the threshold.
    pub fn find_best_concept(&self, query: &[f32]) -> Option<ConceptMatch> {
        self.context
            .index
            .best_match(query)
            .filter(|m| m.score >= self.policy.similarity_threshold)
    }

    pub fn select(&self, utterance: &str) -> Result<SelectionResult, ChatError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(ChatError::InvalidInput("message must not be empty".to_string()));
        }

        let query = self.context.vectorizer.transform(utterance);
        let best = self.find_best_concept(&query);
        let IntentPrediction { label, confidence } = self.context.classifier.predict(&query);

        let (response, source) = match (best, self.context.fallback.get(&label)) {
            (Some(m), None) => match self.context.knowledge.entry_at(m.index) {
                Some((name, entry)) => (
                    format_concept(name, entry),
                    AnswerSource::Concept {
                        name: name.to_string(),
                        score: m.score,
                    },
                ),
                None => (self.policy.miss_message.clone(), AnswerSource::Miss),
            },
            (_, Some(canned)) => (canned.to_string(), AnswerSource::Fallback { label: label.clone() }),
            (None, None) => (self.policy.miss_message.clone(), AnswerSource::Miss),
        };

        tracing::debug!(
            best_score = best.map(|m| m.score),
            label = %label,
            confidence,
            source = ?source,
            "answer selected"
        );

        Ok(SelectionResult {
            response,
            confidence: round_confidence(confidence),
            source,
        })
    }
}

/// Clamp to [0, 1] and round to 3 decimal places.
pub fn round_confidence(p: f32) -> f64 {
    let p = if p.is_nan() { 0.0 } else { f64::from(p).clamp(0.0, 1.0) };
    (p * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_rounds_to_three_places() {
        assert_eq!(round_confidence(0.87654), 0.877);
        assert_eq!(round_confidence(1.0), 1.0);
        assert_eq!(round_confidence(0.0004), 0.0);
        assert_eq!(round_confidence(1.2), 1.0);
        assert_eq!(round_confidence(f32::NAN), 0.0);
    }
}
