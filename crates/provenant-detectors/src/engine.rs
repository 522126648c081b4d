//! Detection engine facade
//!
//! Owns one extractor per modality. Every optional capability is probed once
//! when the engine is built; the extractors only ever see the outcome.

use crate::config::{DetectorConfig, VideoConfig};
use crate::image::ImageSignalExtractor;
use crate::media::{
    ExifReader, FaceDetector, FfmpegFrameSource, FrameSource, MetadataReader, SeetaFaceDetector,
};
use crate::model::{TextModel, TextModelService};
use crate::text::TextSignalExtractor;
use crate::video::VideoSignalExtractor;
use provenant_core::{AnalysisResult, Capability, Error, ImageInput, Result, VideoInput};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// The optional collaborators handed to the extractors
#[derive(Clone)]
pub struct EngineCapabilities {
    pub text_model: Capability<Arc<dyn TextModel>>,
    pub metadata: Capability<Arc<dyn MetadataReader>>,
    pub pixels: Capability,
    pub frames: Capability<Arc<dyn FrameSource>>,
    pub faces: Capability<Arc<dyn FaceDetector>>,
}

impl EngineCapabilities {
    /// Probe everything the configuration enables
    pub async fn probe(config: &DetectorConfig, models: &TextModelService) -> Result<Self> {
        let text_model = models.initialize(&config.text_model).await.capability();

        let metadata = if config.image.metadata {
            Capability::Available(Arc::new(ExifReader::new()) as Arc<dyn MetadataReader>)
        } else {
            Capability::unavailable("disabled by configuration")
        };
        let pixels = Capability::toggle(config.image.pixel_analysis, "disabled by configuration");

        let video = config.video.clone();
        let (frames, faces) = tokio::task::spawn_blocking(move || probe_video(&video))
            .await
            .map_err(|e| Error::internal(format!("Capability probe task failed: {}", e)))?;

        Ok(Self {
            text_model,
            metadata,
            pixels,
            frames,
            faces,
        })
    }

    /// Heuristics only: no model, no decoders
    pub fn heuristic() -> Self {
        Self {
            text_model: Capability::unavailable("not configured"),
            metadata: Capability::unavailable("not configured"),
            pixels: Capability::unavailable("not configured"),
            frames: Capability::unavailable("not configured"),
            faces: Capability::unavailable("not configured"),
        }
    }

    pub fn report(&self) -> CapabilityReport {
        CapabilityReport {
            text_model: CapabilityStatus::of(&self.text_model, |m| m.name().to_string()),
            metadata: CapabilityStatus::of(&self.metadata, |m| m.name().to_string()),
            pixel_analysis: CapabilityStatus::of(&self.pixels, |_| "image".to_string()),
            frame_analysis: CapabilityStatus::of(&self.frames, |f| f.name().to_string()),
            face_detection: CapabilityStatus::of(&self.faces, |f| f.name().to_string()),
        }
    }
}

fn probe_video(
    config: &VideoConfig,
) -> (
    Capability<Arc<dyn FrameSource>>,
    Capability<Arc<dyn FaceDetector>>,
) {
    if !config.frame_analysis {
        return (
            Capability::unavailable("disabled by configuration"),
            Capability::unavailable("frame analysis disabled"),
        );
    }

    let frames = Capability::from_result(
        FfmpegFrameSource::probe(&config.ffmpeg_path, &config.ffprobe_path)
            .map(|source| Arc::new(source) as Arc<dyn FrameSource>),
    );
    let faces = match &config.face_model_path {
        Some(path) => Capability::from_result(
            SeetaFaceDetector::from_file(path).map(|d| Arc::new(d) as Arc<dyn FaceDetector>),
        ),
        None => Capability::unavailable("no face model configured"),
    };
    (frames, faces)
}

/// Availability of one capability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityStatus {
    pub available: bool,

    /// Implementation name when available, reason otherwise
    pub detail: String,
}

impl CapabilityStatus {
    fn of<T>(capability: &Capability<T>, name: impl FnOnce(&T) -> String) -> Self {
        match capability {
            Capability::Available(value) => Self {
                available: true,
                detail: name(value),
            },
            Capability::Unavailable { reason } => Self {
                available: false,
                detail: reason.clone(),
            },
        }
    }
}

/// Capability summary for health reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityReport {
    pub text_model: CapabilityStatus,
    pub metadata: CapabilityStatus,
    pub pixel_analysis: CapabilityStatus,
    pub frame_analysis: CapabilityStatus,
    pub face_detection: CapabilityStatus,
}

/// Multi-modal detection engine
pub struct DetectionEngine {
    text: TextSignalExtractor,
    image: Arc<ImageSignalExtractor>,
    video: Arc<VideoSignalExtractor>,
    report: CapabilityReport,
}

impl DetectionEngine {
    /// Build from configuration using the process-wide text model
    pub async fn from_config(config: &DetectorConfig) -> Result<Self> {
        Self::with_model_service(config, TextModelService::global()).await
    }

    /// Build from configuration using the given text model service
    pub async fn with_model_service(
        config: &DetectorConfig,
        models: &TextModelService,
    ) -> Result<Self> {
        let capabilities = EngineCapabilities::probe(config, models).await?;
        let engine = Self::new(capabilities).with_model_chars(config.text_model.max_chars);
        engine.log_capabilities();
        Ok(engine)
    }

    /// Build from already-resolved capabilities
    pub fn new(capabilities: EngineCapabilities) -> Self {
        let report = capabilities.report();
        let EngineCapabilities {
            text_model,
            metadata,
            pixels,
            frames,
            faces,
        } = capabilities;

        Self {
            text: TextSignalExtractor::new(text_model),
            image: Arc::new(ImageSignalExtractor::new(metadata, pixels)),
            video: Arc::new(VideoSignalExtractor::new(frames, faces)),
            report,
        }
    }

    fn with_model_chars(mut self, model_chars: usize) -> Self {
        self.text = self.text.with_model_chars(model_chars);
        self
    }

    fn log_capabilities(&self) {
        let r = &self.report;
        for (name, status) in [
            ("text_model", &r.text_model),
            ("metadata", &r.metadata),
            ("pixel_analysis", &r.pixel_analysis),
            ("frame_analysis", &r.frame_analysis),
            ("face_detection", &r.face_detection),
        ] {
            if status.available {
                tracing::info!(capability = name, implementation = %status.detail, "Capability available");
            } else {
                tracing::info!(capability = name, reason = %status.detail, "Capability unavailable");
            }
        }
    }

    pub fn capabilities(&self) -> &CapabilityReport {
        &self.report
    }

    /// Whether the pretrained text model is loaded
    pub fn model_loaded(&self) -> bool {
        self.text.has_model()
    }

    /// Analyze a text
    pub async fn analyze_text(&self, text: &str) -> Result<AnalysisResult> {
        let start = Instant::now();
        let result = self.text.analyze(text).await;
        log_result("text", &result, start);
        Ok(result)
    }

    /// Analyze an image on the blocking pool
    pub async fn analyze_image(&self, input: ImageInput) -> Result<AnalysisResult> {
        let start = Instant::now();
        let extractor = Arc::clone(&self.image);
        let result = tokio::task::spawn_blocking(move || extractor.analyze(&input))
            .await
            .map_err(|e| Error::internal(format!("Image analysis task failed: {}", e)))?;
        log_result("image", &result, start);
        Ok(result)
    }

    /// Analyze a video on the blocking pool
    pub async fn analyze_video(&self, input: VideoInput) -> Result<AnalysisResult> {
        let start = Instant::now();
        let extractor = Arc::clone(&self.video);
        let result = tokio::task::spawn_blocking(move || extractor.analyze(&input))
            .await
            .map_err(|e| Error::internal(format!("Video analysis task failed: {}", e)))?;
        log_result("video", &result, start);
        Ok(result)
    }
}

fn log_result(modality: &'static str, result: &AnalysisResult, start: Instant) {
    tracing::debug!(
        modality,
        prediction = %result.prediction,
        ai_probability = result.ai_probability,
        signals = result.signals.len(),
        latency_us = start.elapsed().as_micros() as u64,
        "Analysis complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use provenant_core::Prediction;

    #[tokio::test]
    async fn test_heuristic_engine_report() {
        let engine = DetectionEngine::new(EngineCapabilities::heuristic());
        assert!(!engine.model_loaded());
        let report = engine.capabilities();
        assert!(!report.text_model.available);
        assert_eq!(report.frame_analysis.detail, "not configured");

        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["face_detection"]["available"], false);
    }

    #[tokio::test]
    async fn test_disabled_config_probe() {
        let mut config = DetectorConfig::default();
        config.text_model.enabled = false;
        config.image.metadata = false;
        config.video.frame_analysis = false;

        let service = TextModelService::new();
        let engine = DetectionEngine::with_model_service(&config, &service)
            .await
            .unwrap();
        let report = engine.capabilities();
        assert!(!report.text_model.available);
        assert!(!report.metadata.available);
        assert!(report.pixel_analysis.available);
        assert!(!report.frame_analysis.available);
    }

    #[tokio::test]
    async fn test_video_runs_on_blocking_pool() {
        let engine = DetectionEngine::new(EngineCapabilities::heuristic());
        let result = engine
            .analyze_video(VideoInput::new(vec![0u8; 16], "x.mp4"))
            .await
            .unwrap();
        assert_eq!(result.ai_probability, 43.0);
        assert_eq!(result.prediction, Prediction::Uncertain);
    }
}
