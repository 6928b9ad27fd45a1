//! Bag-of-tokens feature encoding.
//!
//! `FeatureEncoder::fit` assigns one dimension to each distinct token in the
//! training corpus, in ascending lexicographic order. `encode` counts token
//! occurrences over those dimensions; tokens outside the fitted vocabulary are
//! ignored, so every encoded vector has the fitted dimension.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use crate::vocabulary::split_symptoms;

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("word pattern is valid"));

/// Rule used to turn a symptom text into tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenizer {
    /// Comma separated symptoms, trimmed. Same rule as the symptom catalog.
    #[default]
    Symptoms,
    /// Lowercased words of two or more word characters; multi-word symptoms
    /// contribute one token per word.
    Words,
}

impl Tokenizer {
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        match self {
            Tokenizer::Symptoms => split_symptoms(text).map(str::to_string).collect(),
            Tokenizer::Words => WORD_PATTERN
                .find_iter(&text.to_lowercase())
                .map(|m| m.as_str().to_string())
                .collect(),
        }
    }
}

/// Per-token occurrence counts over a fitted vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVector {
    counts: Vec<u32>,
}

impl FeatureVector {
    pub fn new(counts: Vec<u32>) -> Self {
        Self { counts }
    }

    pub fn dimension(&self) -> usize {
        self.counts.len()
    }

    pub fn get(&self, index: usize) -> u32 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }

    pub fn is_zero(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }
}

/// Fitted token space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEncoder {
    tokenizer: Tokenizer,
    index: BTreeMap<String, usize>,
}

impl FeatureEncoder {
    pub fn fit<'a>(corpus: impl IntoIterator<Item = &'a str>, tokenizer: Tokenizer) -> Self {
        let tokens: BTreeSet<String> = corpus
            .into_iter()
            .flat_map(|text| tokenizer.tokenize(text))
            .collect();
        let index = tokens
            .into_iter()
            .enumerate()
            .map(|(i, token)| (token, i))
            .collect();

        Self { tokenizer, index }
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    pub fn dimension(&self) -> usize {
        self.index.len()
    }

    /// Fitted tokens in dimension order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn encode(&self, text: &str) -> FeatureVector {
        let mut counts = vec![0u32; self.dimension()];
        for token in self.tokenizer.tokenize(text) {
            if let Some(&i) = self.index.get(&token) {
                counts[i] += 1;
            }
        }
        FeatureVector::new(counts)
    }

    /// Tokens of `text` that have no dimension in the fitted vocabulary
    pub fn unknown_tokens(&self, text: &str) -> Vec<String> {
        let mut unknown: Vec<String> = Vec::new();
        for token in self.tokenizer.tokenize(text) {
            if !self.index.contains_key(&token) && !unknown.contains(&token) {
                unknown.push(token);
            }
        }
        unknown
    }
}
