//! Provenant Detectors
//!
//! Signal extractors that estimate whether text, images, or video were
//! produced by a generative model.
//!
//! ## Components
//!
//! - **Text**: optional pretrained RoBERTa detector plus stylometric heuristics
//! - **Image**: filename, size, EXIF metadata, resolution and texture checks
//! - **Video**: frame sampling with temporal, sharpness, face and color stability
//! - **Engine**: probes optional capabilities once and dispatches per modality
//!
//! Every optional dependency (the text model, EXIF parsing, pixel decoding,
//! ffmpeg, the face model) degrades to a documented fallback when missing.

pub mod config;
pub mod engine;
pub mod image;
pub mod lexicon;
pub mod media;
pub mod model;
pub mod stats;
pub mod text;
pub mod video;

pub use config::{DetectorConfig, ImageConfig, ModelSourceSpec, TextModelConfig, VideoConfig};
pub use engine::{CapabilityReport, CapabilityStatus, DetectionEngine, EngineCapabilities};
pub use crate::image::ImageSignalExtractor;
pub use model::{ModelState, ModelVerdict, TextModel, TextModelService};
pub use text::TextSignalExtractor;
pub use video::{FrameAnalysis, VideoSignalExtractor};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::DetectorConfig;
    pub use crate::engine::{DetectionEngine, EngineCapabilities};
    pub use crate::model::{ModelVerdict, TextModel};
    pub use provenant_core::prelude::*;
}
