use thiserror::Error;

/// Errors produced while loading data, training or answering a query
#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("Failed to load dataset {path}: {reason}")]
    DataLoad { path: String, reason: String },

    #[error("Dataset {path} is missing required columns: {}", columns.join(", "))]
    MissingColumns { path: String, columns: Vec<String> },

    #[error("Pilih minimal satu gejala untuk memulai prediksi.")]
    EmptySelection,

    #[error("No outcome record for predicted disease: {0}")]
    NotFound(String),

    #[error("Feature vector has {found} dimensions, model expects {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Cannot train on an empty dataset")]
    EmptyTrainingSet,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification used by callers that render errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DataLoad,
    EmptySelection,
    NotFound,
    DimensionMismatch,
    Config,
}

impl DiagnosisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiagnosisError::DataLoad { .. }
            | DiagnosisError::MissingColumns { .. }
            | DiagnosisError::EmptyTrainingSet => ErrorKind::DataLoad,
            DiagnosisError::EmptySelection => ErrorKind::EmptySelection,
            DiagnosisError::NotFound(_) => ErrorKind::NotFound,
            DiagnosisError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            DiagnosisError::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn data_load(path: impl Into<String>, reason: impl ToString) -> Self {
        DiagnosisError::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DiagnosisError>;
