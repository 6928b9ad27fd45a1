use clap::{Parser, Subcommand};
use livestock_diagnosis::{CsvRecordSource, DiagnosisConfig, DiagnosisEngine, ErrorKind};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "diagnose-cli")]
#[command(about = "Predict a livestock disease from observed symptoms", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Dataset CSV, overrides the configured path
    #[arg(short, long, value_name = "DATASET")]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the selectable symptoms, one per line
    Symptoms,
    /// Diagnose a set of symptoms
    Diagnose {
        /// Observed symptom, repeat for several
        #[arg(short, long = "symptom", value_name = "SYMPTOM")]
        symptoms: Vec<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => DiagnosisConfig::from_yaml_file(path)?,
        None => DiagnosisConfig::default(),
    };
    if let Some(dataset) = cli.dataset {
        config.dataset_path = dataset;
    }

    let source = CsvRecordSource::new(config.dataset_path.clone());
    let engine = DiagnosisEngine::from_source(&source, &config)?;
    info!("Engine built from {}", config.dataset_path.display());

    match cli.command {
        Commands::Symptoms => {
            for symptom in engine.list_symptoms() {
                println!("{symptom}");
            }
        }
        Commands::Diagnose { symptoms, json } => match engine.diagnose(&symptoms) {
            Ok(diagnosis) if json => {
                println!("{}", serde_json::to_string_pretty(&diagnosis)?);
            }
            Ok(diagnosis) => {
                println!("Hasil Prediksi Penyakit: {}", diagnosis.disease);
                println!("Penanganan yang Disarankan: {}", diagnosis.treatment);
                println!("Risiko: {}", diagnosis.risk);
                println!("Keyakinan: {:.0}%", diagnosis.confidence * 100.0);
                if !diagnosis.unknown_symptoms.is_empty() {
                    println!("Gejala tidak dikenal: {}", diagnosis.unknown_symptoms.join(", "));
                }
            }
            Err(e) if e.kind() == ErrorKind::EmptySelection => {
                eprintln!("{e}");
                std::process::exit(2);
            }
            Err(e) => {
                error!("Diagnosis failed: {}", e);
                return Err(e.into());
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diagnose_with_repeated_symptoms() {
        let cli = Cli::try_parse_from([
            "diagnose-cli",
            "--dataset",
            "data/Diagnosa.csv",
            "diagnose",
            "-s",
            "demam",
            "--symptom",
            "lesu",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.dataset, Some(PathBuf::from("data/Diagnosa.csv")));
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Diagnose { symptoms, json } => {
                assert_eq!(symptoms, vec!["demam", "lesu"]);
                assert!(json);
            }
            Commands::Symptoms => panic!("expected diagnose subcommand"),
        }
    }

    #[test]
    fn test_parse_symptoms_with_config() {
        let cli = Cli::try_parse_from(["diagnose-cli", "-c", "diagnosis.yaml", "symptoms"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("diagnosis.yaml")));
        assert!(matches!(cli.command, Commands::Symptoms));
    }
}
