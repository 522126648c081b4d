//! Shared application state

use metrics_exporter_prometheus::PrometheusHandle;
use provenant_detectors::DetectionEngine;
use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Detection engine with its capabilities resolved at startup
    pub engine: Arc<DetectionEngine>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Probe capabilities and load the text model once
    pub async fn new(config: ServerConfig, metrics_handle: PrometheusHandle) -> anyhow::Result<Self> {
        info!("Initializing detection engine");
        let engine = DetectionEngine::from_config(&config.detectors).await?;
        info!(models_loaded = engine.model_loaded(), "Detection engine ready");

        Ok(Self::with_engine(config, engine, metrics_handle))
    }

    /// Wrap an already-built engine
    pub fn with_engine(
        config: ServerConfig,
        engine: DetectionEngine,
        metrics_handle: PrometheusHandle,
    ) -> Self {
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            metrics_handle,
        }
    }
}
