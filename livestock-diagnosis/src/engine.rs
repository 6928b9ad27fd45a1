use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DiagnosisConfig;
use crate::encoder::{FeatureEncoder, FeatureVector};
use crate::error::{DiagnosisError, Result};
use crate::forest::RandomForest;
use crate::lookup::OutcomeLookup;
use crate::records::{RecordSource, RecordStore};
use crate::vocabulary::SymptomVocabulary;

/// Separator used when a symptom selection is turned back into text
pub const SYMPTOM_SEPARATOR: &str = ", ";

/// Answer to a single diagnose request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub disease: String,
    pub treatment: String,
    pub risk: String,
    /// Share of trees that voted for `disease`
    pub confidence: f64,
    /// Query tokens the encoder was never trained on; they did not
    /// contribute to the prediction. Whole symptoms with the default
    /// tokenizer, single words with `Tokenizer::Words`
    pub unknown_symptoms: Vec<String>,
}

/// Everything needed to answer queries, built once from the full dataset.
///
/// Nothing here changes after construction, so one engine can be shared by
/// reference (or `Arc`) across any number of requests.
#[derive(Debug)]
pub struct DiagnosisEngine {
    store: RecordStore,
    vocabulary: SymptomVocabulary,
    encoder: FeatureEncoder,
    model: RandomForest,
    risk_placeholder: String,
}

impl DiagnosisEngine {
    pub fn build(store: RecordStore, config: &DiagnosisConfig) -> Result<Self> {
        config.validate()?;
        if store.is_empty() {
            return Err(DiagnosisError::EmptyTrainingSet);
        }

        let vocabulary = SymptomVocabulary::from_records(store.records());
        let encoder = FeatureEncoder::fit(store.symptom_texts(), config.tokenizer);
        let features: Vec<FeatureVector> =
            store.symptom_texts().map(|text| encoder.encode(text)).collect();
        let labels: Vec<&str> = store.records().iter().map(|r| r.disease.as_str()).collect();
        let model = RandomForest::train(&features, &labels, &config.forest)?;

        info!(
            "Diagnosis engine ready: {} records, {} symptoms, {} encoder dimensions, {} diseases",
            store.len(),
            vocabulary.len(),
            encoder.dimension(),
            model.classes().len()
        );

        Ok(Self {
            store,
            vocabulary,
            encoder,
            model,
            risk_placeholder: config.risk_placeholder.clone(),
        })
    }

    pub fn from_source(source: &dyn RecordSource, config: &DiagnosisConfig) -> Result<Self> {
        Self::build(RecordStore::load(source)?, config)
    }

    /// Selectable symptoms, sorted
    pub fn list_symptoms(&self) -> &[String] {
        self.vocabulary.as_slice()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn model(&self) -> &RandomForest {
        &self.model
    }

    pub fn diagnose<S: AsRef<str>>(&self, selected: &[S]) -> Result<Diagnosis> {
        if selected.is_empty() {
            return Err(DiagnosisError::EmptySelection);
        }

        let text = selected
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(SYMPTOM_SEPARATOR);

        let unknown_symptoms = self.encoder.unknown_tokens(&text);
        if !unknown_symptoms.is_empty() {
            warn!("Ignoring symptoms unseen in training: {:?}", unknown_symptoms);
        }

        let vector = self.encoder.encode(&text);
        let (disease, confidence) = self.model.predict_with_share(&vector)?;
        debug!("Diagnosed '{}' as {} ({:.2})", text, disease, confidence);

        let outcome = OutcomeLookup::new(&self.store, &self.risk_placeholder).find(disease)?;
        Ok(Diagnosis {
            disease: outcome.disease,
            treatment: outcome.treatment,
            risk: outcome.risk,
            confidence,
            unknown_symptoms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{InMemoryRecordSource, RawRecord};

    fn flu_only(risk: Option<&str>) -> DiagnosisEngine {
        let source = InMemoryRecordSource::new(vec![RawRecord::new(
            "demam, lesu",
            "Flu Sapi",
            "Istirahat dan vitamin",
            risk,
        )]);
        DiagnosisEngine::from_source(&source, &DiagnosisConfig::default()).unwrap()
    }

    fn herd() -> DiagnosisEngine {
        let source = InMemoryRecordSource::new(vec![
            RawRecord::new("demam, lesu, nafsu makan turun", "Flu Sapi", "Istirahat dan vitamin", Some("Rendah")),
            RawRecord::new("demam, lesu", "Flu Sapi", "Istirahat dan vitamin", Some("Rendah")),
            RawRecord::new("diare, dehidrasi", "Enteritis", "Cairan elektrolit", Some("Sedang")),
            RawRecord::new("diare, dehidrasi, lesu", "Enteritis", "Cairan elektrolit", Some("Sedang")),
            RawRecord::new("kembung, perut membesar", "Bloat", "Trokarisasi", Some("Tinggi")),
            RawRecord::new("kembung, sesak napas, perut membesar", "Bloat", "Trokarisasi", Some("Tinggi")),
            RawRecord::new("lepuh mulut, air liur berlebih, pincang", "PMK", "Isolasi dan antiseptik", None),
            RawRecord::new("lepuh mulut, pincang", "PMK", "Isolasi dan antiseptik", None),
        ]);
        DiagnosisEngine::from_source(&source, &DiagnosisConfig::default()).unwrap()
    }

    #[test]
    fn test_single_row_dataset() {
        let engine = flu_only(Some("Rendah"));
        let diagnosis = engine.diagnose(&["demam", "lesu"]).unwrap();
        assert_eq!(diagnosis.disease, "Flu Sapi");
        assert_eq!(diagnosis.treatment, "Istirahat dan vitamin");
        assert_eq!(diagnosis.risk, "Rendah");
        assert_eq!(diagnosis.confidence, 1.0);
    }

    #[test]
    fn test_blank_risk_uses_placeholder() {
        let engine = flu_only(Some(""));
        let diagnosis = engine.diagnose(&["demam", "lesu"]).unwrap();
        assert_eq!(diagnosis.risk, "Tidak tersedia");
    }

    #[test]
    fn test_empty_selection_rejected() {
        let engine = flu_only(None);
        let none: [&str; 0] = [];
        let err = engine.diagnose(&none).unwrap_err();
        assert!(matches!(err, DiagnosisError::EmptySelection));
        assert_eq!(err.to_string(), "Pilih minimal satu gejala untuk memulai prediksi.");
    }

    #[test]
    fn test_order_of_symptoms_does_not_matter() {
        let engine = herd();
        let forward = engine.diagnose(&["diare", "lesu", "dehidrasi"]).unwrap();
        let backward = engine.diagnose(&["dehidrasi", "lesu", "diare"]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_training_rows_round_trip() {
        let engine = herd();
        for record in engine.store().records() {
            let diagnosis = engine.diagnose(&record.symptoms).unwrap();
            assert_eq!(diagnosis.disease, record.disease, "{:?}", record.symptoms);
        }
    }

    #[test]
    fn test_unknown_symptom_is_ignored() {
        let engine = herd();
        let diagnosis = engine
            .diagnose(&["kembung", "perut membesar", "bulu rontok"])
            .unwrap();
        assert_eq!(diagnosis.disease, "Bloat");
        assert_eq!(diagnosis.unknown_symptoms, vec!["bulu rontok"]);

        let vector = engine.encoder().encode("kembung, bulu rontok");
        assert_eq!(vector.dimension(), engine.model().dimension());
    }

    #[test]
    fn test_missing_risk_on_prediction() {
        let engine = herd();
        let diagnosis = engine.diagnose(&["lepuh mulut", "pincang"]).unwrap();
        assert_eq!(diagnosis.disease, "PMK");
        assert_eq!(diagnosis.risk, "Tidak tersedia");
    }

    #[test]
    fn test_symptom_catalog() {
        let engine = herd();
        let symptoms = engine.list_symptoms();
        assert_eq!(symptoms.first().map(String::as_str), Some("air liur berlebih"));
        assert!(symptoms.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(symptoms.len(), 11);
    }

    #[test]
    fn test_empty_store_cannot_build() {
        let err = DiagnosisEngine::build(RecordStore::default(), &DiagnosisConfig::default())
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::EmptyTrainingSet));
    }
}
