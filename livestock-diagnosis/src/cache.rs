use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::config::DiagnosisConfig;
use crate::engine::DiagnosisEngine;
use crate::error::Result;
use crate::records::{RecordSource, SourceFingerprint};

struct CachedEngine {
    engine: Arc<DiagnosisEngine>,
    fingerprint: Option<SourceFingerprint>,
    built_at: DateTime<Utc>,
}

/// Builds the engine on first use and hands out the same instance until the
/// source's fingerprint changes.
///
/// A source that stops reporting a fingerprint (for example a file that was
/// removed) keeps the last engine. A failed rebuild returns the error and
/// leaves the previous engine in place for the next call.
pub struct EngineCache {
    source: Box<dyn RecordSource>,
    config: DiagnosisConfig,
    state: RwLock<Option<CachedEngine>>,
}

impl EngineCache {
    pub fn new(source: Box<dyn RecordSource>, config: DiagnosisConfig) -> Self {
        Self {
            source,
            config,
            state: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &DiagnosisConfig {
        &self.config
    }

    fn is_current(cached: &CachedEngine, fingerprint: &Option<SourceFingerprint>) -> bool {
        fingerprint.is_none() || *fingerprint == cached.fingerprint
    }

    pub fn get(&self) -> Result<Arc<DiagnosisEngine>> {
        let fingerprint = self.source.fingerprint();

        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = state.as_ref() {
                if Self::is_current(cached, &fingerprint) {
                    if fingerprint.is_none() && cached.fingerprint.is_some() {
                        warn!(
                            "Dataset {} is no longer readable, serving the engine built at {}",
                            self.source.describe(),
                            cached.built_at
                        );
                    }
                    return Ok(cached.engine.clone());
                }
            }
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = state.as_ref() {
            if Self::is_current(cached, &fingerprint) {
                return Ok(cached.engine.clone());
            }
            info!("Dataset {} changed, rebuilding engine", self.source.describe());
        }

        let engine = Arc::new(DiagnosisEngine::from_source(self.source.as_ref(), &self.config)?);
        *state = Some(CachedEngine {
            engine: engine.clone(),
            fingerprint,
            built_at: Utc::now(),
        });
        Ok(engine)
    }

    /// When the engine currently served was built, if it has been
    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|cached| cached.built_at)
    }

    /// Drop the cached engine; the next `get` rebuilds
    pub fn invalidate(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
