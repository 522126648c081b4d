//! Pretrained text classifier collaborator
//!
//! The text extractor optionally consults a pretrained classifier. Loading is
//! expensive and may fail (missing weights, no network), so the process keeps
//! one [`TextModelService`] that attempts the load once and remembers the
//! outcome for every later request.

#[cfg(feature = "ml-models")]
pub mod roberta;

#[cfg(feature = "ml-models")]
pub use roberta::RobertaDetector;

use crate::config::TextModelConfig;
use async_trait::async_trait;
use provenant_core::{Capability, Result};
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;

/// Model output for one text
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVerdict {
    /// Probability (0-100) that the text is machine-generated
    pub ai_probability: f64,

    /// Label of the winning class
    pub label: String,
}

impl ModelVerdict {
    pub fn new(ai_probability: f64, label: impl Into<String>) -> Self {
        Self {
            ai_probability,
            label: label.into(),
        }
    }
}

/// A pretrained text classifier
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Estimate the probability that `text` is machine-generated
    async fn classify_text(&self, text: &str) -> Result<ModelVerdict>;

    /// Model name reported in metrics
    fn name(&self) -> &str;
}

/// Outcome of the one-time load attempt
#[derive(Clone)]
pub enum ModelState {
    Ready(Arc<dyn TextModel>),
    Unavailable(String),
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// View the state as an extractor capability
    pub fn capability(&self) -> Capability<Arc<dyn TextModel>> {
        match self {
            Self::Ready(model) => Capability::Available(Arc::clone(model)),
            Self::Unavailable(reason) => Capability::unavailable(reason.clone()),
        }
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(model) => f.debug_tuple("Ready").field(&model.name()).finish(),
            Self::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// Attempt-once holder for the text model
pub struct TextModelService {
    state: OnceCell<ModelState>,
}

impl TextModelService {
    /// Service that has not attempted a load yet
    pub fn new() -> Self {
        Self {
            state: OnceCell::new(),
        }
    }

    /// Service pre-populated with a model, skipping the load
    pub fn with_model(model: Arc<dyn TextModel>) -> Self {
        Self {
            state: OnceCell::new_with(Some(ModelState::Ready(model))),
        }
    }

    /// Process-wide service
    pub fn global() -> &'static TextModelService {
        static GLOBAL: OnceLock<TextModelService> = OnceLock::new();
        GLOBAL.get_or_init(TextModelService::new)
    }

    /// Load the model on the first call; later calls return the recorded state
    pub async fn initialize(&self, config: &TextModelConfig) -> &ModelState {
        self.state
            .get_or_init(|| async {
                let state = load_model(config).await;
                match &state {
                    ModelState::Ready(model) => {
                        tracing::info!(model = model.name(), "Text model loaded")
                    }
                    ModelState::Unavailable(reason) => {
                        tracing::warn!(reason = %reason, "Text model unavailable, using heuristics only")
                    }
                }
                state
            })
            .await
    }

    /// Recorded state, if a load has been attempted
    pub fn state(&self) -> Option<&ModelState> {
        self.state.get()
    }

    /// Capability view of the recorded state
    pub fn capability(&self) -> Capability<Arc<dyn TextModel>> {
        match self.state.get() {
            Some(state) => state.capability(),
            None => Capability::unavailable("text model not initialized"),
        }
    }
}

impl Default for TextModelService {
    fn default() -> Self {
        Self::new()
    }
}

async fn load_model(config: &TextModelConfig) -> ModelState {
    if !config.enabled {
        return ModelState::Unavailable("disabled by configuration".to_string());
    }

    #[cfg(feature = "ml-models")]
    {
        match RobertaDetector::load(config).await {
            Ok(detector) => ModelState::Ready(Arc::new(detector)),
            Err(e) => ModelState::Unavailable(e.to_string()),
        }
    }

    #[cfg(not(feature = "ml-models"))]
    {
        ModelState::Unavailable("built without the ml-models feature".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(f64);

    #[async_trait]
    impl TextModel for FixedModel {
        async fn classify_text(&self, _text: &str) -> Result<ModelVerdict> {
            Ok(ModelVerdict::new(self.0, "Fake"))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_disabled_model_is_unavailable() {
        let service = TextModelService::new();
        assert!(service.state().is_none());
        assert!(!service.capability().is_available());

        let config = TextModelConfig {
            enabled: false,
            ..Default::default()
        };
        let state = service.initialize(&config).await;
        assert!(!state.is_ready());
        assert!(service
            .capability()
            .reason()
            .unwrap()
            .contains("disabled"));
    }

    #[tokio::test]
    async fn test_initialize_attempts_once() {
        let service = TextModelService::with_model(Arc::new(FixedModel(80.0)));
        let config = TextModelConfig {
            enabled: false,
            ..Default::default()
        };
        // Already populated: the disabled config is never consulted.
        assert!(service.initialize(&config).await.is_ready());

        let model = service.capability().get().cloned().unwrap();
        assert_eq!(model.name(), "fixed");
        let verdict = model.classify_text("anything").await.unwrap();
        assert_eq!(verdict.ai_probability, 80.0);
    }
}
