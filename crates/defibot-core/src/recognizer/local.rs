//! Local recognizer — example table plus keyword rules.
//!
//! Instantaneous and costs zero LLM tokens. Canonical example phrases
//! are checked first and return their paired entities verbatim; keyword
//! rules come next and pull entities out with [`crate::extract`].

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::info;

use super::IntentRecognizer;
use crate::extract::extract;
use crate::intent::{Entities, Intent, Recognition};

/// A canonical phrase and the recognition it stands for.
pub struct Example {
    pub phrase: &'static str,
    pub intent: Intent,
    pub entities: &'static [(&'static str, &'static str)],
}

pub const EXAMPLES: &[Example] = &[
    Example {
        phrase: "Create a liquidity pool with APT and USDC at 7% APY",
        intent: Intent::CreatePool,
        entities: &[("token1", "APT"), ("token2", "USDC"), ("apy", "7")],
    },
    Example {
        phrase: "Launch a new token named CryptoGold with a supply of 1000000",
        intent: Intent::CreateToken,
        entities: &[("token_name", "CryptoGold"), ("supply", "1000000")],
    },
    Example {
        phrase: "Join pool 12345",
        intent: Intent::JoinPool,
        entities: &[("pool_id", "12345")],
    },
    Example {
        phrase: "What is the status of token CryptoGold?",
        intent: Intent::QueryInfo,
        entities: &[("entity_type", "token"), ("entity_id", "CryptoGold")],
    },
    Example {
        phrase: "Help me with DeFi basics",
        intent: Intent::GeneralHelp,
        entities: &[],
    },
];

/// Every group must have at least one hit for the rule to fire.
/// Single words match whole words; phrases with spaces match as substrings.
struct KeywordRule {
    intent: Intent,
    groups: &'static [&'static [&'static str]],
}

/// First match wins. Questions about an existing pool or token are checked
/// before the create rules, which would otherwise claim "new pool".
const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        intent: Intent::JoinPool,
        groups: &[&["join", "enter"], &["pool"]],
    },
    KeywordRule {
        intent: Intent::QueryInfo,
        groups: &[
            &["status", "info", "information", "details", "price", "balance"],
            &["token", "pool"],
        ],
    },
    KeywordRule {
        intent: Intent::CreatePool,
        groups: &[&["liquidity pool"]],
    },
    KeywordRule {
        intent: Intent::CreatePool,
        groups: &[&["create", "new", "open", "start", "launch"], &["pool"]],
    },
    KeywordRule {
        intent: Intent::CreateToken,
        groups: &[&["create", "launch", "mint", "issue", "new", "make"], &["token", "coin"]],
    },
    KeywordRule {
        intent: Intent::GeneralHelp,
        groups: &[&["help"]],
    },
];

/// Lowercased text and its word set. `%` stays part of a word so
/// "7%" survives normalization.
struct Normalized {
    text: String,
    words: HashSet<String>,
}

impl Normalized {
    fn new(raw: &str) -> Self {
        let text: String = raw
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '%' { c } else { ' ' })
            .collect();
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let words = text.split(' ').map(str::to_string).collect();
        Self { text, words }
    }

    fn hits(&self, keyword: &str) -> bool {
        if keyword.contains(' ') {
            self.text.contains(keyword)
        } else {
            self.words.contains(keyword)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRecognizer;

impl LocalRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Classify synchronously.
    pub fn classify(text: &str) -> Recognition {
        let input = Normalized::new(text);

        if let Some(example) = EXAMPLES.iter().find(|ex| Self::matches_example(&input, text, ex)) {
            info!(intent = %example.intent, "Matched example phrase");
            let entities = example
                .entities
                .iter()
                .fold(Entities::new(), |acc, (k, v)| acc.with(k, v));
            return Recognition::new(example.intent, entities);
        }

        if let Some(rule) = KEYWORD_RULES
            .iter()
            .find(|rule| rule.groups.iter().all(|g| g.iter().any(|kw| input.hits(kw))))
        {
            info!(intent = %rule.intent, "Matched keyword rule");
            return Recognition::new(rule.intent, extract(text, rule.intent));
        }

        info!("No intent recognized");
        Recognition::none()
    }

    fn matches_example(input: &Normalized, raw: &str, example: &Example) -> bool {
        if raw.to_lowercase().contains(&example.phrase.to_lowercase()) {
            return true;
        }
        let phrase = Normalized::new(example.phrase);
        phrase.words.iter().all(|w| input.words.contains(w))
    }
}

#[async_trait]
impl IntentRecognizer for LocalRecognizer {
    async fn recognize(&self, text: &str) -> Recognition {
        Self::classify(text)
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_examples_return_paired_recognition() {
        for example in EXAMPLES {
            let rec = LocalRecognizer::classify(example.phrase);
            assert_eq!(rec.intent, Some(example.intent), "phrase: {}", example.phrase);
            assert_eq!(rec.entities.len(), example.entities.len());
            for (field, value) in example.entities {
                assert_eq!(rec.entities.get(field), Some(*value));
            }
        }
    }

    #[test]
    fn test_example_contained_in_longer_input() {
        let rec = LocalRecognizer::classify("hey, join pool 12345 please");
        assert_eq!(rec.intent, Some(Intent::JoinPool));
        assert_eq!(rec.entities.get("pool_id"), Some("12345"));
    }

    #[test]
    fn test_example_words_in_any_order() {
        let rec = LocalRecognizer::classify("DeFi basics: help me with them");
        assert_eq!(rec.intent, Some(Intent::GeneralHelp));
    }

    #[test]
    fn test_keyword_token_without_supply() {
        let rec = LocalRecognizer::classify("Launch a new token named CryptoGold");
        assert_eq!(rec.intent, Some(Intent::CreateToken));
        assert_eq!(rec.entities.get("token_name"), Some("CryptoGold"));
        assert_eq!(rec.entities.get("supply"), None);
    }

    #[test]
    fn test_keyword_pool_extracts() {
        let rec = LocalRecognizer::classify("I want a liquidity pool for BTC and ETH at 3% APY");
        assert_eq!(rec.intent, Some(Intent::CreatePool));
        assert_eq!(rec.entities.get("token1"), Some("BTC"));
        assert_eq!(rec.entities.get("token2"), Some("ETH"));
        assert_eq!(rec.entities.get("apy"), Some("3"));
    }

    #[test]
    fn test_keyword_join_pool() {
        let rec = LocalRecognizer::classify("can I join pool 77?");
        assert_eq!(rec.intent, Some(Intent::JoinPool));
        assert_eq!(rec.entities.get("pool_id"), Some("77"));
    }

    #[test]
    fn test_join_wins_over_create() {
        let rec = LocalRecognizer::classify("join the new pool 5");
        assert_eq!(rec.intent, Some(Intent::JoinPool));
        assert_eq!(rec.entities.get("pool_id"), Some("5"));
    }

    #[test]
    fn test_questions_are_not_creation_requests() {
        let rec = LocalRecognizer::classify("What is the status of liquidity pool 7?");
        assert_eq!(rec.intent, Some(Intent::QueryInfo));
        assert_eq!(rec.entities.get("entity_type"), Some("pool"));
        assert_eq!(rec.entities.get("entity_id"), Some("7"));

        let rec = LocalRecognizer::classify("What is the price of the new token CryptoGold?");
        assert_eq!(rec.intent, Some(Intent::QueryInfo));
        assert_eq!(rec.entities.get("entity_type"), Some("token"));
        assert_eq!(rec.entities.get("entity_id"), Some("CryptoGold"));

        let rec = LocalRecognizer::classify("details about my new pool 3");
        assert_eq!(rec.intent, Some(Intent::QueryInfo));
        assert_eq!(rec.entities.get("entity_id"), Some("3"));
    }

    #[test]
    fn test_keyword_query() {
        let rec = LocalRecognizer::classify("details on pool 9");
        assert_eq!(rec.intent, Some(Intent::QueryInfo));
        assert_eq!(rec.entities.get("entity_type"), Some("pool"));
        assert_eq!(rec.entities.get("entity_id"), Some("9"));
    }

    #[test]
    fn test_whole_word_matching() {
        // "renew" must not count as "new", "helpful" not as "help".
        assert_eq!(LocalRecognizer::classify("renew my tokens").intent, None);
        assert_eq!(LocalRecognizer::classify("that was helpful").intent, None);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(LocalRecognizer::classify("what's the weather like?"), Recognition::none());
        assert_eq!(LocalRecognizer::classify(""), Recognition::none());
    }
}
