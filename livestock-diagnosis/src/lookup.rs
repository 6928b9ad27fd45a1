use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::records::RecordStore;

pub const DEFAULT_RISK_PLACEHOLDER: &str = "Tidak tersedia";

/// Treatment and risk attached to a disease label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub disease: String,
    pub treatment: String,
    pub risk: String,
}

/// Maps a predicted disease label back to its first record in the store
#[derive(Debug, Clone, Copy)]
pub struct OutcomeLookup<'a> {
    store: &'a RecordStore,
    risk_placeholder: &'a str,
}

impl<'a> OutcomeLookup<'a> {
    pub fn new(store: &'a RecordStore, risk_placeholder: &'a str) -> Self {
        Self {
            store,
            risk_placeholder,
        }
    }

    /// Fails with `NotFound` when the label has no record, which means the
    /// model and store disagree. A missing risk becomes the placeholder.
    pub fn find(&self, label: &str) -> Result<Outcome> {
        let record = self.store.find_by_disease(label)?;
        Ok(Outcome {
            disease: record.disease.clone(),
            treatment: record.treatment.clone(),
            risk: record
                .risk
                .clone()
                .unwrap_or_else(|| self.risk_placeholder.to_string()),
        })
    }
}
