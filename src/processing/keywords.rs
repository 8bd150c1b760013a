//! Local keyword frequency counter
//!
//! A non-AI fallback for keyword extraction: lowercase, split into word
//! tokens, drop stop-words and short tokens, count. Ties keep the order in
//! which words were first seen, so the output is fully deterministic.

use crate::config::KeywordConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

pub struct KeywordCounter {
    stop_words: HashSet<String>,
    min_length: usize,
    limit: usize,
    token_regex: Regex,
}

impl Default for KeywordCounter {
    fn default() -> Self {
        Self::from_config(&KeywordConfig::default())
    }
}

impl KeywordCounter {
    pub fn from_config(config: &KeywordConfig) -> Self {
        let stop_words = DEFAULT_STOP_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(config.extra_stop_words.iter().map(|w| w.to_lowercase()))
            .collect();

        Self {
            stop_words,
            min_length: config.min_length,
            limit: config.limit,
            token_regex: Regex::new(r"\b\w+\b").expect("Invalid token regex"),
        }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Most frequent tokens, highest count first
    pub fn count(&self, text: &str) -> Vec<KeywordCount> {
        let lowered = text.to_lowercase();
        // word -> (count, first position)
        let mut frequencies: HashMap<&str, (usize, usize)> = HashMap::new();

        let tokens = self
            .token_regex
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|token| token.chars().count() >= self.min_length && !self.stop_words.contains(*token));

        for (position, token) in tokens.enumerate() {
            frequencies.entry(token).or_insert((0, position)).0 += 1;
        }

        let mut ranked: Vec<(&str, usize, usize)> = frequencies
            .into_iter()
            .map(|(word, (count, first))| (word, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        ranked
            .into_iter()
            .take(self.limit)
            .map(|(word, count, _)| KeywordCount {
                word: word.to_string(),
                count,
            })
            .collect()
    }
}
