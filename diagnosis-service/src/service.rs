use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use livestock_diagnosis::{
    CsvRecordSource, DiagnosisConfig, DiagnosisEngine, DiagnosisError, EngineCache, ErrorKind,
    RecordSource,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{DiagnoseRequest, DiagnoseResponse, SymptomListResponse};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn unavailable_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn diagnosis_error(e: &DiagnosisError) -> ApiError {
    let details = e.to_string();
    match e.kind() {
        ErrorKind::EmptySelection => bad_request_error(&details),
        ErrorKind::DataLoad => unavailable_error("Dataset could not be loaded", &details),
        ErrorKind::NotFound => {
            internal_error("Prediction has no matching outcome record", &details)
        }
        ErrorKind::DimensionMismatch => internal_error("Encoder and model disagree", &details),
        ErrorKind::Config => internal_error("Invalid service configuration", &details),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<EngineCache>,
}

impl AppState {
    fn engine(&self) -> Result<Arc<DiagnosisEngine>, ApiError> {
        self.cache.get().map_err(|e| {
            error!("Failed to prepare diagnosis engine: {}", e);
            diagnosis_error(&e)
        })
    }
}

/// Build the router over the configured CSV dataset. The engine is built
/// before returning so a broken dataset stops the service at startup.
pub fn create_app(config: DiagnosisConfig) -> Result<Router, DiagnosisError> {
    let source = CsvRecordSource::new(config.dataset_path.clone());
    create_app_with_source(Box::new(source), config)
}

pub fn create_app_with_source(
    source: Box<dyn RecordSource>,
    config: DiagnosisConfig,
) -> Result<Router, DiagnosisError> {
    let cache = Arc::new(EngineCache::new(source, config));
    cache.get()?;
    Ok(build_router(AppState { cache }))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/symptoms", get(list_symptoms))
        .route("/diagnose", post(diagnose))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Livestock Disease Diagnosis Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Predicts a livestock disease from observed symptoms, with treatment and risk",
        "endpoints": {
            "GET /symptoms": "List selectable symptoms",
            "POST /diagnose": "Diagnose a set of symptoms",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "engine_built_at": state.cache.built_at().map(|t| t.to_rfc3339()),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_symptoms(State(state): State<AppState>) -> ApiResult<SymptomListResponse> {
    let engine = state.engine()?;
    let symptoms = engine.list_symptoms().to_vec();

    Ok(Json(SymptomListResponse {
        count: symptoms.len(),
        symptoms,
    }))
}

async fn diagnose(
    State(state): State<AppState>,
    Json(request): Json<DiagnoseRequest>,
) -> ApiResult<DiagnoseResponse> {
    let request_id = Uuid::new_v4().to_string();
    info!(
        "Diagnose request {} with {} symptoms",
        request_id,
        request.symptoms.len()
    );

    let engine = state.engine()?;
    match engine.diagnose(&request.symptoms) {
        Ok(diagnosis) => {
            info!(
                "Request {} diagnosed as {} ({:.2})",
                request_id, diagnosis.disease, diagnosis.confidence
            );
            Ok(Json(DiagnoseResponse::new(request_id, diagnosis)))
        }
        Err(e) => {
            if e.kind() == ErrorKind::EmptySelection {
                warn!("Request {} rejected: {}", request_id, e);
            } else {
                error!("Request {} failed: {}", request_id, e);
            }
            Err(diagnosis_error(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use livestock_diagnosis::{InMemoryRecordSource, RawRecord};
    use std::io::Write;
    use tower::ServiceExt;

    fn app() -> Router {
        let source = InMemoryRecordSource::new(vec![
            RawRecord::new("demam, lesu", "Flu Sapi", "Istirahat dan vitamin", Some("Rendah")),
            RawRecord::new("diare, dehidrasi", "Enteritis", "Cairan elektrolit", None),
        ]);
        create_app_with_source(Box::new(source), DiagnosisConfig::default()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn diagnose_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/diagnose")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_symptoms() {
        let response = app()
            .oneshot(Request::get("/symptoms").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["count"], 4);
        assert_eq!(json["symptoms"], json!(["dehidrasi", "demam", "diare", "lesu"]));
    }

    #[tokio::test]
    async fn test_diagnose() {
        let response = app()
            .oneshot(diagnose_request(json!({ "symptoms": ["lesu", "demam"] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["disease"], "Flu Sapi");
        assert_eq!(json["treatment"], "Istirahat dan vitamin");
        assert_eq!(json["risk"], "Rendah");
    }

    #[tokio::test]
    async fn test_diagnose_missing_risk() {
        let response = app()
            .oneshot(diagnose_request(json!({ "symptoms": ["diare", "dehidrasi"] })))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["disease"], "Enteritis");
        assert_eq!(json["risk"], "Tidak tersedia");
    }

    #[tokio::test]
    async fn test_empty_selection_is_bad_request() {
        let response = app()
            .oneshot(diagnose_request(json!({ "symptoms": [] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Pilih minimal satu gejala untuk memulai prediksi.");
    }

    #[tokio::test]
    async fn test_unknown_symptom_reported() {
        let response = app()
            .oneshot(diagnose_request(json!({ "symptoms": ["demam", "lesu", "batuk"] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["disease"], "Flu Sapi");
        assert_eq!(json["unknown_symptoms"], json!(["batuk"]));
    }

    #[test]
    fn test_missing_dataset_fails_at_startup() {
        let config = DiagnosisConfig {
            dataset_path: "/nonexistent/Diagnosa.csv".into(),
            ..DiagnosisConfig::default()
        };
        let err = create_app(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoad);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            diagnosis_error(&DiagnosisError::NotFound("Antraks".to_string())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            diagnosis_error(&DiagnosisError::EmptyTrainingSet).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            diagnosis_error(&DiagnosisError::EmptySelection).0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            diagnosis_error(&DiagnosisError::DimensionMismatch {
                expected: 5,
                found: 3
            })
            .0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            diagnosis_error(&DiagnosisError::InvalidConfig("n_trees must be positive".to_string()))
                .0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_serves_dataset_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Gejala,Penyakit,Penanganan,Risiko").unwrap();
        writeln!(file, "\"demam, lesu\",Flu Sapi,Istirahat dan vitamin,Rendah").unwrap();

        let config = DiagnosisConfig {
            dataset_path: file.path().to_path_buf(),
            ..DiagnosisConfig::default()
        };
        let app = create_app(config).unwrap();

        let response = app
            .oneshot(diagnose_request(json!({ "symptoms": ["demam", "lesu"] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["disease"], "Flu Sapi");
        assert_eq!(json["treatment"], "Istirahat dan vitamin");
        assert_eq!(json["risk"], "Rendah");
        assert_eq!(json["confidence"], 1.0);
    }
}
