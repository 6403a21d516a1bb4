//! Conversation-aware query expansion
//!
//! Short or pronoun-laden follow-up queries ("hun e-mail?") retrieve
//! poorly on their own. The expander detects them and asks the model to
//! rewrite the query into a standalone one against the recent
//! conversation. Expansion must never block retrieval: every failure
//! degrades to the original query.

use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::llm::pricing;
use crate::domain::{LlmProvider, LlmRequest, Message, MessageRole};

/// Queries shorter than this are treated as follow-ups outright.
const SHORT_QUERY_LEN: usize = 10;

/// Pronoun scanning only applies below this length; longer queries are
/// almost always self-contained even when they contain a pronoun.
const PRONOUN_SCAN_LEN: usize = 40;

/// Messages included from the conversation tail.
pub const DEFAULT_MAX_HISTORY: usize = 4;

/// Per-message truncation in the transcript.
const HISTORY_SNIPPET_LEN: usize = 300;

static FOLLOW_UP_STARTERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Dutch continuations
        r"(?i)^(en|maar|ook|dus|verder|daarnaast)\b",
        r"(?i)^(wat|hoe) (is|zijn|was|waren) (hun|zijn|haar|die|deze|dat|dit)\b",
        r"(?i)^(wie|waar|wanneer|waarom|hoe) (is|zijn|was|waren) (die|dat|deze|dit|hij|zij|ze)\b",
        r"(?i)^hoe zit het\b",
        // English continuations
        r"(?i)^(and|but|also|what about|how about)\b",
        r"(?i)^(what|who|where|when|why|how) (is|are|was|were) (their|his|her|its|this|that|these|those|it|they)\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static CONTEXT_PRONOUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(their|they|them|it|this|that|these|those|his|her|its|hun|hen|hem|haar|zij|ze|die|dat|deze|dit|daarvan|daarover|hierover|ervan)\b",
    )
    .unwrap()
});

/// Outcome of a query expansion attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryExpansionResult {
    pub expanded_query: String,
    pub was_expanded: bool,
    pub cost: f64,
    pub latency_ms: u64,
}

impl QueryExpansionResult {
    /// The no-op result: query passed through unchanged.
    pub fn unchanged(query: impl Into<String>) -> Self {
        Self {
            expanded_query: query.into(),
            was_expanded: false,
            cost: 0.0,
            latency_ms: 0,
        }
    }
}

/// Flag a query as needing conversation context.
pub fn detect_follow_up(query: &str) -> bool {
    let trimmed = query.trim();
    let char_len = trimmed.chars().count();

    if char_len < SHORT_QUERY_LEN {
        return true;
    }

    if FOLLOW_UP_STARTERS.iter().any(|re| re.is_match(trimmed)) {
        return true;
    }

    char_len < PRONOUN_SCAN_LEN && CONTEXT_PRONOUN.is_match(trimmed)
}

/// Query rewriter backed by an optional LLM provider.
///
/// A missing provider (no API key configured) turns every expansion into
/// a no-op rather than an error.
#[derive(Debug)]
pub struct QueryExpander<P: LlmProvider> {
    provider: Option<Arc<P>>,
    model: String,
}

impl<P: LlmProvider> QueryExpander<P> {
    pub fn new(provider: Arc<P>, model: impl Into<String>) -> Self {
        Self {
            provider: Some(provider),
            model: model.into(),
        }
    }

    /// An expander without a provider; always a no-op.
    pub fn disabled(model: impl Into<String>) -> Self {
        Self {
            provider: None,
            model: model.into(),
        }
    }

    /// Rewrite `query` into a standalone query using the conversation tail.
    pub async fn expand(&self, query: &str, history: &[Message]) -> QueryExpansionResult {
        self.expand_with_max_history(query, history, DEFAULT_MAX_HISTORY)
            .await
    }

    pub async fn expand_with_max_history(
        &self,
        query: &str,
        history: &[Message],
        max_history: usize,
    ) -> QueryExpansionResult {
        let Some(provider) = self.provider.as_ref() else {
            return QueryExpansionResult::unchanged(query);
        };

        if history.is_empty() {
            return QueryExpansionResult::unchanged(query);
        }

        let transcript = build_transcript(history, max_history);
        let started = Instant::now();

        let request = LlmRequest::builder()
            .system(
                "You rewrite follow-up questions into standalone search queries. \
                 Resolve pronouns and references using the conversation. Reply with only \
                 the rewritten query, at most 10 words, in the language of the question.",
            )
            .user(format!(
                "Conversation:\n{}\n\nFollow-up question: {}",
                transcript, query
            ))
            .temperature(0.1)
            .max_tokens(60)
            .build();

        match provider.chat(&self.model, request).await {
            Ok(response) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let cost = response
                    .usage
                    .map(|usage| pricing::chat_cost(&self.model, &usage))
                    .unwrap_or(0.0);

                let rewritten = response.content().trim().trim_matches('"').to_string();
                if rewritten.is_empty() {
                    return QueryExpansionResult::unchanged(query);
                }

                debug!(original = query, expanded = %rewritten, "query expanded");

                QueryExpansionResult {
                    was_expanded: rewritten != query,
                    expanded_query: rewritten,
                    cost,
                    latency_ms,
                }
            }
            Err(e) => {
                warn!(error = %e, "query expansion failed, using original query");
                QueryExpansionResult::unchanged(query)
            }
        }
    }
}

/// Compact transcript of the last `max_history` messages, newest last,
/// each truncated to a snippet.
fn build_transcript(history: &[Message], max_history: usize) -> String {
    let tail_start = history.len().saturating_sub(max_history);

    history[tail_start..]
        .iter()
        .map(|message| {
            let role = match message.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::System => "system",
            };
            format!("{}: {}", role, truncate_chars(&message.content, HISTORY_SNIPPET_LEN))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
