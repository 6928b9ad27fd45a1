use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::records::DiagnosisRecord;

/// Split a comma separated symptom cell into trimmed, non-empty tokens.
///
/// This is the single tokenization rule for symptom lists; the feature
/// encoder's default tokenizer uses it too.
pub fn split_symptoms(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|token| !token.is_empty())
}

/// Distinct symptom tokens across all records, sorted ascending
pub fn unique_symptoms(records: &[DiagnosisRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| split_symptoms(&record.symptom_text))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Catalog of selectable symptoms presented to the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymptomVocabulary {
    symptoms: Vec<String>,
}

impl SymptomVocabulary {
    pub fn from_records(records: &[DiagnosisRecord]) -> Self {
        Self {
            symptoms: unique_symptoms(records),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.symptoms
    }

    pub fn contains(&self, symptom: &str) -> bool {
        self.symptoms
            .binary_search_by(|s| s.as_str().cmp(symptom))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }
}
