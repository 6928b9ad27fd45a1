use livestock_diagnosis::Diagnosis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct DiagnoseRequest {
    #[serde(default)]
    pub symptoms: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiagnoseResponse {
    pub request_id: String,
    pub disease: String,
    pub treatment: String,
    pub risk: String,
    pub confidence: f64,
    pub unknown_symptoms: Vec<String>,
}

impl DiagnoseResponse {
    pub fn new(request_id: String, diagnosis: Diagnosis) -> Self {
        Self {
            request_id,
            disease: diagnosis.disease,
            treatment: diagnosis.treatment,
            risk: diagnosis.risk,
            confidence: diagnosis.confidence,
            unknown_symptoms: diagnosis.unknown_symptoms,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SymptomListResponse {
    pub count: usize,
    pub symptoms: Vec<String>,
}
