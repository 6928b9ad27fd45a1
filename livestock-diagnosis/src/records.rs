//! Historical symptom/disease/treatment records and the sources they load from.
//!
//! The dataset is a table with the columns `Gejala` (comma separated
//! symptoms), `Penyakit` (disease label), `Penanganan` (treatment) and an
//! optional `Risiko` (risk). Rows missing any of the first three are dropped
//! while loading and never reach training or lookup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

use crate::error::{DiagnosisError, Result};
use crate::vocabulary::split_symptoms;

pub const SYMPTOMS_COLUMN: &str = "Gejala";
pub const DISEASE_COLUMN: &str = "Penyakit";
pub const TREATMENT_COLUMN: &str = "Penanganan";
pub const RISK_COLUMN: &str = "Risiko";

/// One cleaned row of the historical dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    /// Trimmed symptom tokens in their original order
    pub symptoms: Vec<String>,
    /// The symptom cell as it appeared in the dataset
    pub symptom_text: String,
    pub disease: String,
    pub treatment: String,
    pub risk: Option<String>,
}

impl DiagnosisRecord {
    /// Clean a raw row. Returns `None` when the row has no usable symptoms,
    /// disease or treatment.
    pub fn from_fields(
        symptom_text: &str,
        disease: &str,
        treatment: &str,
        risk: Option<&str>,
    ) -> Option<Self> {
        let symptoms: Vec<String> = split_symptoms(symptom_text).map(str::to_string).collect();
        let disease = disease.trim();
        let treatment = treatment.trim();

        if symptoms.is_empty() || disease.is_empty() || treatment.is_empty() {
            return None;
        }

        let risk = risk
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Some(Self {
            symptoms,
            symptom_text: symptom_text.trim().to_string(),
            disease: disease.to_string(),
            treatment: treatment.to_string(),
            risk,
        })
    }
}

/// A row before cleaning, with every cell possibly absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub symptoms: Option<String>,
    pub disease: Option<String>,
    pub treatment: Option<String>,
    pub risk: Option<String>,
}

impl RawRecord {
    pub fn new(symptoms: &str, disease: &str, treatment: &str, risk: Option<&str>) -> Self {
        Self {
            symptoms: Some(symptoms.to_string()),
            disease: Some(disease.to_string()),
            treatment: Some(treatment.to_string()),
            risk: risk.map(str::to_string),
        }
    }

    fn clean(&self) -> Option<DiagnosisRecord> {
        DiagnosisRecord::from_fields(
            self.symptoms.as_deref()?,
            self.disease.as_deref()?,
            self.treatment.as_deref()?,
            self.risk.as_deref(),
        )
    }
}

/// Identity of a source's content, compared to detect changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// Trait for anything the record store can be loaded from
pub trait RecordSource: Send + Sync {
    /// Read and clean every row
    fn load(&self) -> Result<Vec<DiagnosisRecord>>;

    /// Fingerprint of the current content, `None` if the source never changes
    fn fingerprint(&self) -> Option<SourceFingerprint>;

    /// Human readable name used in logs and errors
    fn describe(&self) -> String;
}

/// CSV file on disk
#[derive(Debug, Clone)]
pub struct CsvRecordSource {
    path: PathBuf,
}

impl CsvRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for CsvRecordSource {
    fn load(&self) -> Result<Vec<DiagnosisRecord>> {
        let label = self.describe();
        let file = fs::File::open(&self.path).map_err(|e| DiagnosisError::data_load(&label, e))?;
        read_csv(file, &label)
    }

    fn fingerprint(&self) -> Option<SourceFingerprint> {
        let metadata = fs::metadata(&self.path).ok()?;
        Some(SourceFingerprint {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Rows held in memory; never changes once built
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    rows: Vec<RawRecord>,
}

impl InMemoryRecordSource {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self { rows }
    }
}

impl RecordSource for InMemoryRecordSource {
    fn load(&self) -> Result<Vec<DiagnosisRecord>> {
        let records: Vec<DiagnosisRecord> = self.rows.iter().filter_map(RawRecord::clean).collect();
        log_dropped(&self.describe(), self.rows.len(), records.len());
        Ok(records)
    }

    fn fingerprint(&self) -> Option<SourceFingerprint> {
        None
    }

    fn describe(&self) -> String {
        format!("in-memory ({} rows)", self.rows.len())
    }
}

/// Read a CSV table from any reader. `label` names the source in errors.
pub fn read_csv<R: io::Read>(reader: R, label: &str) -> Result<Vec<DiagnosisRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DiagnosisError::data_load(label, e))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let (symptoms_idx, disease_idx, treatment_idx) = match (
        column(SYMPTOMS_COLUMN),
        column(DISEASE_COLUMN),
        column(TREATMENT_COLUMN),
    ) {
        (Some(s), Some(d), Some(t)) => (s, d, t),
        _ => {
            let columns = [SYMPTOMS_COLUMN, DISEASE_COLUMN, TREATMENT_COLUMN]
                .iter()
                .filter(|name| column(**name).is_none())
                .map(|name| name.to_string())
                .collect();
            return Err(DiagnosisError::MissingColumns {
                path: label.to_string(),
                columns,
            });
        }
    };
    let risk_idx = column(RISK_COLUMN);
    if risk_idx.is_none() {
        warn!("Dataset {} has no {} column, all risks are unavailable", label, RISK_COLUMN);
    }

    let mut total = 0usize;
    let mut records = Vec::new();
    for row in reader.records() {
        total += 1;
        let row = match row {
            Ok(row) => row,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(DiagnosisError::data_load(label, e));
            }
            Err(_) => continue,
        };

        let raw = RawRecord {
            symptoms: row.get(symptoms_idx).map(str::to_string),
            disease: row.get(disease_idx).map(str::to_string),
            treatment: row.get(treatment_idx).map(str::to_string),
            risk: risk_idx.and_then(|i| row.get(i)).map(str::to_string),
        };
        if let Some(record) = raw.clean() {
            records.push(record);
        }
    }

    log_dropped(label, total, records.len());
    Ok(records)
}

fn log_dropped(label: &str, total: usize, kept: usize) {
    if kept < total {
        warn!("Dropped {} incomplete rows from {}", total - kept, label);
    }
    info!("Loaded {} records from {}", kept, label);
}

/// Immutable collection of cleaned records
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<DiagnosisRecord>,
}

impl RecordStore {
    pub fn new(records: Vec<DiagnosisRecord>) -> Self {
        Self { records }
    }

    pub fn load(source: &dyn RecordSource) -> Result<Self> {
        Ok(Self::new(source.load()?))
    }

    pub fn records(&self) -> &[DiagnosisRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record whose disease equals `label`. Later rows for the same
    /// label are never consulted.
    pub fn find_by_disease(&self, label: &str) -> Result<&DiagnosisRecord> {
        self.records
            .iter()
            .find(|r| r.disease == label)
            .ok_or_else(|| DiagnosisError::NotFound(label.to_string()))
    }

    /// Distinct disease labels in first-seen order
    pub fn diseases(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.disease.as_str()) {
                seen.push(record.disease.as_str());
            }
        }
        seen
    }

    pub fn symptom_texts(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.symptom_text.as_str())
    }
}
