pub mod cache;
pub mod config;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod forest;
pub mod lookup;
pub mod records;
pub mod rng;
pub mod tree;
pub mod vocabulary;

// Re-export commonly used types
pub use cache::EngineCache;
pub use config::DiagnosisConfig;
pub use encoder::{FeatureEncoder, FeatureVector, Tokenizer};
pub use engine::{Diagnosis, DiagnosisEngine};
pub use error::{DiagnosisError, ErrorKind, Result};
pub use forest::{FeatureRule, ForestConfig, MaxFeatures, RandomForest};
pub use lookup::{Outcome, OutcomeLookup};
pub use records::{
    CsvRecordSource, DiagnosisRecord, InMemoryRecordSource, RawRecord, RecordSource, RecordStore,
};
pub use vocabulary::{SymptomVocabulary, unique_symptoms};
