use diagnosis_service::create_app;
use livestock_diagnosis::DiagnosisConfig;
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn load_config() -> anyhow::Result<DiagnosisConfig> {
    let mut config = match std::env::var("CONFIG_PATH") {
        Ok(path) => DiagnosisConfig::from_yaml_file(&path)?,
        Err(_) => DiagnosisConfig::default(),
    };

    if let Ok(dataset_path) = std::env::var("DATASET_PATH") {
        config.dataset_path = dataset_path.into();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config()?;
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    info!("Loading dataset from {}", config.dataset_path.display());
    let app = create_app(config)?;
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let addr = listener.local_addr()?;

    info!("Livestock Diagnosis Service starting on {}", addr);
    info!("Symptom catalog: GET http://{}/symptoms", addr);
    info!("Diagnosis endpoint: POST http://{}/diagnose", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
