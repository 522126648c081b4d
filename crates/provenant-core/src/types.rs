//! Core types for Provenant

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Modality-specific measurements reported alongside a verdict
pub type Metrics = BTreeMap<String, serde_json::Value>;

/// How strong a piece of evidence is.
///
/// Purely descriptive: the weight is shown to the caller but never scales
/// the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalWeight {
    High,
    Medium,
    Low,
}

impl SignalWeight {
    /// Lowercase name as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for SignalWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of evidence supporting or opposing an AI-generated verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Short human-readable name of the finding
    pub label: String,

    /// Descriptive strength of the finding
    pub weight: SignalWeight,

    /// Free-text detail (measured value, matched terms, ...)
    #[serde(default)]
    pub detail: String,
}

impl Signal {
    /// Create a new signal
    pub fn new(label: impl Into<String>, weight: SignalWeight, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            weight,
            detail: detail.into(),
        }
    }

    /// Create a high-weight signal
    pub fn high(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(label, SignalWeight::High, detail)
    }

    /// Create a medium-weight signal
    pub fn medium(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(label, SignalWeight::Medium, detail)
    }

    /// Create a low-weight signal
    pub fn low(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(label, SignalWeight::Low, detail)
    }
}

/// Three-way verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    AiGenerated,
    HumanCreated,
    Uncertain,
}

impl Prediction {
    /// Snake-case name as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiGenerated => "ai_generated",
            Self::HumanCreated => "human_created",
            Self::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of content that was analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Video,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of analyzing one piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Verdict derived from the clamped score
    pub prediction: Prediction,

    /// Probability (0-100) that the content is machine-generated
    pub ai_probability: f64,

    /// Always `100 - ai_probability`
    pub human_probability: f64,

    /// Evidence in detection order
    pub signals: Vec<Signal>,

    /// Modality-specific measurements
    #[serde(default)]
    pub metrics: Metrics,
}

impl AnalysisResult {
    /// Neutral verdict used when the input is too small to analyze
    pub fn insufficient(signal: Signal) -> Self {
        Self {
            prediction: Prediction::Uncertain,
            ai_probability: 50.0,
            human_probability: 50.0,
            signals: vec![signal],
            metrics: Metrics::new(),
        }
    }
}

/// Raw image submission
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// File contents
    pub bytes: Vec<u8>,

    /// Client-supplied filename
    pub filename: String,

    /// Declared MIME type
    pub content_type: String,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Size of the payload in mebibytes
    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / (1024.0 * 1024.0)
    }
}

/// Raw video submission
#[derive(Debug, Clone)]
pub struct VideoInput {
    /// File contents
    pub bytes: Vec<u8>,

    /// Client-supplied filename
    pub filename: String,
}

impl VideoInput {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    /// Size of the payload in mebibytes
    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_serializes_lowercase_weight() {
        let signal = Signal::high("Low burstiness", "Score: 2.10");
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["weight"], "high");
        assert_eq!(json["label"], "Low burstiness");
    }

    #[test]
    fn test_prediction_wire_names() {
        assert_eq!(
            serde_json::to_value(Prediction::AiGenerated).unwrap(),
            "ai_generated"
        );
        assert_eq!(Prediction::HumanCreated.to_string(), "human_created");
        assert_eq!(Prediction::Uncertain.as_str(), "uncertain");
    }

    #[test]
    fn test_insufficient_result() {
        let result = AnalysisResult::insufficient(Signal::low("Insufficient text", ""));
        assert_eq!(result.prediction, Prediction::Uncertain);
        assert_eq!(result.ai_probability + result.human_probability, 100.0);
        assert_eq!(result.signals.len(), 1);
        assert!(result.metrics.is_empty());
    }

    #[test]
    fn test_input_size_mb() {
        let input = VideoInput::new(vec![0u8; 512 * 1024], "clip.mp4");
        assert!((input.size_mb() - 0.5).abs() < 1e-12);
    }
}
