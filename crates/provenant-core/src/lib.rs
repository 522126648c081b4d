//! Provenant Core
//!
//! Core types, traits, and utilities shared across Provenant components.
//!
//! This crate provides:
//! - The analysis data model (signals, verdicts, results)
//! - Error types and result handling
//! - Capability and step-outcome types used to degrade gracefully when an
//!   optional dependency is missing or fails
//! - The shared score aggregation and classification policy
//! - Content fingerprinting

pub mod capability;
pub mod error;
pub mod fingerprint;
pub mod scoring;
pub mod types;

pub use capability::{Capability, StepOutcome};
pub use error::{Error, Result};
pub use fingerprint::content_fingerprint;
pub use scoring::{classify, round_to, ScorePolicy, ScoreSheet};
pub use types::{AnalysisResult, ContentType, ImageInput, Metrics, Prediction, Signal, SignalWeight, VideoInput};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::capability::{Capability, StepOutcome};
    pub use crate::error::{Error, Result};
    pub use crate::scoring::{ScorePolicy, ScoreSheet};
    pub use crate::types::{AnalysisResult, Prediction, Signal, SignalWeight};
}
