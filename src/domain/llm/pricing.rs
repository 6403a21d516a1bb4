//! Per-model pricing for cost accounting
//!
//! Prices are USD per 1M tokens. This is bookkeeping only; it never
//! gates a request.

use super::Usage;

/// (model, input $/1M, output $/1M)
const CHAT_PRICING: &[(&str, f64, f64)] = &[
    ("gpt-4o-mini", 0.15, 0.60),
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4.1-mini", 0.40, 1.60),
];

/// (model, $/1M tokens)
const EMBEDDING_PRICING: &[(&str, f64)] = &[
    ("text-embedding-3-small", 0.02),
    ("text-embedding-3-large", 0.13),
    ("text-embedding-ada-002", 0.10),
];

/// Fallback rates for models missing from the tables, matching the
/// cheapest known tier so cost is never silently zero.
const DEFAULT_CHAT_PRICING: (f64, f64) = (0.15, 0.60);
const DEFAULT_EMBEDDING_PRICING: f64 = 0.02;

/// Dollar cost of a chat completion.
pub fn chat_cost(model: &str, usage: &Usage) -> f64 {
    let (input_rate, output_rate) = CHAT_PRICING
        .iter()
        .find(|(name, _, _)| *name == model)
        .map(|(_, i, o)| (*i, *o))
        .unwrap_or(DEFAULT_CHAT_PRICING);

    (usage.prompt_tokens as f64 / 1e6) * input_rate
        + (usage.completion_tokens as f64 / 1e6) * output_rate
}

/// Dollar cost of an embedding request.
pub fn embedding_cost(model: &str, total_tokens: u32) -> f64 {
    let rate = EMBEDDING_PRICING
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, rate)| *rate)
        .unwrap_or(DEFAULT_EMBEDDING_PRICING);

    (total_tokens as f64 / 1e6) * rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_cost_known_model() {
        let usage = Usage::new(1_000_000, 1_000_000);
        let cost = chat_cost("gpt-4o-mini", &usage);
        assert!((cost - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_chat_cost_unknown_model_uses_default() {
        let usage = Usage::new(1_000_000, 0);
        let cost = chat_cost("some-new-model", &usage);
        assert!((cost - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_embedding_cost() {
        let cost = embedding_cost("text-embedding-3-small", 500_000);
        assert!((cost - 0.01).abs() < 1e-9);
    }
}
