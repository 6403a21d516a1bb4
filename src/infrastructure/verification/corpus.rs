//! Corpus uniqueness verification
//!
//! Synthetic "should not be answerable" test questions are only useful
//! when the tenant's corpus really cannot answer them. The verifier
//! expands a candidate question into jargon-synonym variants, searches
//! the corpus per variant and rejects the question when any variant gets
//! close to indexed content.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{DomainError, EmbeddingProvider, VectorStore};
use crate::infrastructure::embedding::EmbeddingBatcher;

/// Hits requested per variant search.
const TOP_K: usize = 8;

/// Similarity floor passed to the store; weaker hits are noise.
const SIMILARITY_FLOOR: f32 = 0.25;

/// A question is rejected once any variant scores at or above this.
const UNIQUENESS_THRESHOLD: f32 = 0.60;

/// Variants checked per question, the original included.
const MAX_VARIANTS: usize = 3;

/// Candidate questions tried before giving up on a slot.
pub const MAX_GENERATION_ATTEMPTS: usize = 3;

/// Domain jargon substitutions used to widen the search.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("verlof", &["vakantie", "vrije dagen"]),
    ("vakantie", &["verlof"]),
    ("salaris", &["loon", "bezoldiging"]),
    ("loon", &["salaris"]),
    ("ziekte", &["arbeidsongeschiktheid", "ziekteverzuim"]),
    ("opzegtermijn", &["opzegging"]),
    ("werkgever", &["bedrijf", "organisatie"]),
    ("werknemer", &["medewerker", "personeelslid"]),
    ("pensioen", &["oudedagsvoorziening"]),
    ("reiskosten", &["reiskostenvergoeding", "kilometervergoeding"]),
    ("thuiswerken", &["hybride werken"]),
    ("contract", &["arbeidsovereenkomst"]),
];

/// Outcome of a corpus uniqueness check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// True when no variant came close to indexed content
    pub is_unique: bool,
    /// Highest similarity seen across all variants, in [0, 1]
    pub similarity: f32,
    /// Content of the closest match, when any hit was returned
    pub matched_content: Option<String>,
    pub cost: f64,
}

/// Result of the bounded retry loop over candidate questions.
#[derive(Debug, Clone)]
pub struct UniqueQuestionOutcome {
    /// The first candidate that verified as unique, if any
    pub question: Option<String>,
    pub attempts: usize,
    pub total_cost: f64,
}

/// Verifier over a tenant corpus.
#[derive(Debug)]
pub struct CorpusVerifier<E, S>
where
    E: EmbeddingProvider,
    S: VectorStore,
{
    batcher: EmbeddingBatcher<E>,
    store: Arc<S>,
}

impl<E, S> CorpusVerifier<E, S>
where
    E: EmbeddingProvider,
    S: VectorStore,
{
    pub fn new(batcher: EmbeddingBatcher<E>, store: Arc<S>) -> Self {
        Self { batcher, store }
    }

    /// Confirm that `question` is not answerable from the tenant corpus.
    ///
    /// Stops early as soon as one variant crosses the rejection
    /// threshold; remaining variants cannot change the verdict.
    pub async fn verify_not_in_corpus(
        &self,
        tenant_id: &str,
        question: &str,
    ) -> Result<VerificationResult, DomainError> {
        let variants = expand_variants(question);
        let mut max_similarity = 0.0f32;
        let mut matched_content = None;
        let mut cost = 0.0f64;

        for variant in &variants {
            let embedded = self.batcher.embed_one(variant).await?;
            cost += embedded.cost;

            let hits = self
                .store
                .similarity_search(
                    tenant_id,
                    &embedded.embedding,
                    variant,
                    TOP_K,
                    SIMILARITY_FLOOR,
                )
                .await?;

            if let Some(best) = hits.first() {
                debug!(variant = %variant, score = best.score, "variant search hit");
                if best.score > max_similarity {
                    max_similarity = best.score;
                    matched_content = Some(best.content.clone());
                }
            }

            if max_similarity >= UNIQUENESS_THRESHOLD {
                break;
            }
        }

        let is_unique = max_similarity < UNIQUENESS_THRESHOLD;
        info!(
            tenant_id,
            is_unique, max_similarity, "corpus uniqueness check complete"
        );

        Ok(VerificationResult {
            is_unique,
            similarity: max_similarity,
            matched_content,
            cost,
        })
    }

    /// Walk candidate questions until one verifies as unique.
    ///
    /// A bounded loop with an attempt counter and accumulated cost; at
    /// most [`MAX_GENERATION_ATTEMPTS`] candidates are checked.
    pub async fn first_unique_question(
        &self,
        tenant_id: &str,
        candidates: &[String],
    ) -> Result<UniqueQuestionOutcome, DomainError> {
        let mut attempts = 0usize;
        let mut total_cost = 0.0f64;

        for candidate in candidates.iter().take(MAX_GENERATION_ATTEMPTS) {
            attempts += 1;
            let verification = self.verify_not_in_corpus(tenant_id, candidate).await?;
            total_cost += verification.cost;

            if verification.is_unique {
                return Ok(UniqueQuestionOutcome {
                    question: Some(candidate.clone()),
                    attempts,
                    total_cost,
                });
            }
        }

        Ok(UniqueQuestionOutcome {
            question: None,
            attempts,
            total_cost,
        })
    }
}

/// 1-3 search variants for a question: the original plus jargon-synonym
/// substitutions for triggers present in it.
fn expand_variants(question: &str) -> Vec<String> {
    let lower = question.to_lowercase();
    let mut variants = vec![question.to_string()];

    for (trigger, synonyms) in SYNONYMS {
        if variants.len() >= MAX_VARIANTS {
            break;
        }

        if contains_word(&lower, trigger) {
            if let Some(synonym) = synonyms.first() {
                let variant = replace_word_case_insensitive(question, trigger, synonym);
                if !variants.contains(&variant) {
                    variants.push(variant);
                }
            }
        }
    }

    variants
}

fn contains_word(haystack_lower: &str, word: &str) -> bool {
    haystack_lower.split(|c: char| !c.is_alphanumeric()).any(|w| w == word)
}

fn replace_word_case_insensitive(text: &str, from: &str, to: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let lower = text.to_lowercase();
    let mut cursor = 0usize;

    while let Some(found) = lower[cursor..].find(from) {
        let start = cursor + found;
        let end = start + from.len();

        let boundary_before = start == 0
            || !text[..start]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric);
        let boundary_after =
            !text[end..].chars().next().is_some_and(char::is_alphanumeric);

        if boundary_before && boundary_after {
            out.push_str(&text[cursor..start]);
            out.push_str(to);
        } else {
            out.push_str(&text[cursor..end]);
        }
        cursor = end;
    }

    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::retrieval::mock::MockVectorStore;
    use crate::domain::SearchResult;

    fn verifier(store: MockVectorStore) -> CorpusVerifier<MockEmbeddingProvider, MockVectorStore> {
        let batcher =
            EmbeddingBatcher::new(Arc::new(MockEmbeddingProvider::new("mock", 8)), "mock-model")
                .unwrap();
        CorpusVerifier::new(batcher, Arc::new(store))
    }

    #[test]
    fn test_variants_include_original() {
        let variants = expand_variants("Wat is de regeling voor verlof?");

        assert_eq!(variants[0], "Wat is de regeling voor verlof?");
        assert!(variants.contains(&"Wat is de regeling voor vakantie?".to_string()));
        assert!(variants.len() <= 3);
    }

    #[test]
    fn test_variants_capped_at_three() {
        let variants = expand_variants("verlof salaris ziekte pensioen contract");
        assert_eq!(variants.len(), 3);
    }

    #[test]
    fn test_no_trigger_single_variant() {
        let variants = expand_variants("Hoeveel parkeerplaatsen heeft het kantoor?");
        assert_eq!(variants.len(), 1);
    }

    #[test]
    fn test_replace_respects_word_boundaries() {
        let replaced = replace_word_case_insensitive("verlofdagen en verlof", "verlof", "vakantie");
        assert_eq!(replaced, "verlofdagen en vakantie");
    }

    #[tokio::test]
    async fn test_unique_when_corpus_is_silent() {
        let store = MockVectorStore::new();
        let verifier = verifier(store);

        let result = verifier
            .verify_not_in_corpus("tenant-1", "Wat is het beleid rond bedrijfsauto's op Mars?")
            .await
            .unwrap();

        assert!(result.is_unique);
        assert_eq!(result.similarity, 0.0);
        assert!(result.matched_content.is_none());
    }

    #[tokio::test]
    async fn test_rejected_when_variant_matches() {
        // The synonym variant ("vakantie") hits an indexed chunk at 0.72.
        let store = MockVectorStore::new().with_results_for(
            "vakantie",
            vec![SearchResult::new("Artikel 1 Vakantie: 25 dagen per jaar", 0.72)],
        );
        let verifier = verifier(store);

        let result = verifier
            .verify_not_in_corpus("tenant-1", "Hoeveel verlof krijgt een stagiair?")
            .await
            .unwrap();

        assert!(!result.is_unique);
        assert!((result.similarity - 0.72).abs() < 1e-6);
        assert!(result
            .matched_content
            .unwrap()
            .contains("Artikel 1 Vakantie"));
    }

    #[tokio::test]
    async fn test_early_stop_on_strong_match() {
        // Original question already matches at 0.9; synonym variants
        // must not be searched afterwards.
        let store = MockVectorStore::new()
            .with_search_results(vec![SearchResult::new("match", 0.9)]);
        let verifier = verifier(store);

        let result = verifier
            .verify_not_in_corpus("tenant-1", "Wat is de regeling voor verlof?")
            .await
            .unwrap();

        assert!(!result.is_unique);
        assert!((result.similarity - 0.9).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_weak_hits_stay_unique() {
        let store = MockVectorStore::new()
            .with_search_results(vec![SearchResult::new("vaag verwant", 0.4)]);
        let verifier = verifier(store);

        let result = verifier
            .verify_not_in_corpus("tenant-1", "Bestaat er een regeling voor zeilboten?")
            .await
            .unwrap();

        assert!(result.is_unique);
        assert!((result.similarity - 0.4).abs() < 1e-6);
        assert!(result.matched_content.is_some());
    }

    #[tokio::test]
    async fn test_retry_loop_picks_first_unique() {
        let store = MockVectorStore::new().with_results_for(
            "verlof",
            vec![SearchResult::new("verlofregeling", 0.8)],
        );
        let verifier = verifier(store);

        let candidates = vec![
            "Wat is het verlof voor piloten?".to_string(),
            "Wat is het beleid voor ruimtereizen?".to_string(),
            "Nog een kandidaat".to_string(),
        ];

        let outcome = verifier
            .first_unique_question("tenant-1", &candidates)
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 2);
        assert_eq!(
            outcome.question,
            Some("Wat is het beleid voor ruimtereizen?".to_string())
        );
    }

    #[tokio::test]
    async fn test_retry_loop_bounded() {
        let store =
            MockVectorStore::new().with_search_results(vec![SearchResult::new("alles", 0.95)]);
        let verifier = verifier(store);

        let candidates: Vec<String> =
            (0..10).map(|i| format!("kandidaat nummer {}", i)).collect();

        let outcome = verifier
            .first_unique_question("tenant-1", &candidates)
            .await
            .unwrap();

        assert_eq!(outcome.attempts, MAX_GENERATION_ATTEMPTS);
        assert!(outcome.question.is_none());
    }
}
