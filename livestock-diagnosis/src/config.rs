use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::encoder::Tokenizer;
use crate::error::{DiagnosisError, Result};
use crate::forest::ForestConfig;
use crate::lookup::DEFAULT_RISK_PLACEHOLDER;

/// Settings for building a diagnosis engine. Every field has a default, so an
/// empty YAML document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosisConfig {
    pub dataset_path: PathBuf,
    pub forest: ForestConfig,
    pub tokenizer: Tokenizer,
    pub risk_placeholder: String,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("Diagnosa.csv"),
            forest: ForestConfig::default(),
            tokenizer: Tokenizer::default(),
            risk_placeholder: DEFAULT_RISK_PLACEHOLDER.to_string(),
        }
    }
}

impl DiagnosisConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| DiagnosisError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|e| {
            DiagnosisError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        self.forest.validate()?;
        if self.risk_placeholder.trim().is_empty() {
            return Err(DiagnosisError::InvalidConfig(
                "risk_placeholder must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::{FeatureRule, MaxFeatures};

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = DiagnosisConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, DiagnosisConfig::default());
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.risk_placeholder, "Tidak tersedia");
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r#"
dataset_path: data/ternak.csv
tokenizer: words
risk_placeholder: unavailable
forest:
  n_trees: 10
  seed: 7
  max_depth: 4
  max_features: all
"#;
        let config = DiagnosisConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("data/ternak.csv"));
        assert_eq!(config.tokenizer, Tokenizer::Words);
        assert_eq!(config.forest.n_trees, 10);
        assert_eq!(config.forest.max_depth, Some(4));
        assert_eq!(config.forest.min_samples_split, 2);
        assert_eq!(config.forest.max_features, MaxFeatures::Rule(FeatureRule::All));

        let counted = DiagnosisConfig::from_yaml_str("forest:\n  max_features: 3\n").unwrap();
        assert_eq!(counted.forest.max_features, MaxFeatures::Count(3));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for yaml in [
            "forest:\n  n_trees: 0\n",
            "forest:\n  min_samples_split: 1\n",
            "forest:\n  max_features: 0\n",
            "risk_placeholder: '  '\n",
            "tokenizer: letters\n",
        ] {
            let err = DiagnosisConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, DiagnosisError::InvalidConfig(_)), "{yaml}");
        }
    }
}
