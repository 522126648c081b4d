//! Configuration for the detection engine and its optional capabilities

use provenant_core::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for all extractors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Pretrained text classifier
    #[serde(default)]
    pub text_model: TextModelConfig,

    /// Image checks
    #[serde(default)]
    pub image: ImageConfig,

    /// Video checks
    #[serde(default)]
    pub video: VideoConfig,
}

impl DetectorConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| provenant_core::Error::config(format!("Failed to parse detector config: {}", e)))
    }
}

/// Pretrained text classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextModelConfig {
    /// Attempt to load the model at startup
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Where to load the model from
    #[serde(default)]
    pub source: ModelSourceSpec,

    /// Inference device ("cpu", "cuda", "metal")
    #[serde(default = "default_device")]
    pub device: String,

    /// Characters of input passed to the model
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Token limit applied after tokenization
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// `id2label` names that denote the machine-generated class
    #[serde(default = "default_ai_labels")]
    pub ai_labels: Vec<String>,

    /// Display name reported in metrics
    #[serde(default = "default_model_name")]
    pub name: String,
}

impl Default for TextModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            source: ModelSourceSpec::default(),
            device: default_device(),
            max_chars: default_max_chars(),
            max_length: default_max_length(),
            ai_labels: default_ai_labels(),
            name: default_model_name(),
        }
    }
}

/// Model source specification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelSourceSpec {
    /// Directory containing config.json, tokenizer files, and weights
    Local { path: PathBuf },

    /// Download from Hugging Face Hub
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
    },
}

impl Default for ModelSourceSpec {
    fn default() -> Self {
        Self::HuggingFace {
            repo: "openai-community/roberta-base-openai-detector".to_string(),
            revision: default_revision(),
        }
    }
}

/// Image check settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Inspect EXIF metadata
    #[serde(default = "default_true")]
    pub metadata: bool,

    /// Decode pixels for dimension and texture checks
    #[serde(default = "default_true")]
    pub pixel_analysis: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            metadata: true,
            pixel_analysis: true,
        }
    }
}

/// Video check settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Decode frames for temporal analysis
    #[serde(default = "default_true")]
    pub frame_analysis: bool,

    /// ffmpeg executable
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: PathBuf,

    /// ffprobe executable
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: PathBuf,

    /// SeetaFace frontal face model; face checks are skipped when unset
    #[serde(default)]
    pub face_model_path: Option<PathBuf>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            frame_analysis: true,
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            face_model_path: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_max_chars() -> usize {
    2000
}

fn default_max_length() -> usize {
    512
}

fn default_ai_labels() -> Vec<String> {
    vec!["Fake".to_string(), "LABEL_1".to_string()]
}

fn default_model_name() -> String {
    "roberta-base-openai-detector".to_string()
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = DetectorConfig::from_yaml("{}").unwrap();
        assert!(config.text_model.enabled);
        assert_eq!(config.text_model.max_chars, 2000);
        assert_eq!(config.text_model.ai_labels, vec!["Fake", "LABEL_1"]);
        assert!(config.image.metadata);
        assert!(config.video.face_model_path.is_none());
    }

    #[test]
    fn test_parse_local_source() {
        let yaml = r#"
text_model:
  enabled: true
  source:
    type: local
    path: "./models/roberta-detector"
  device: cpu
image:
  pixel_analysis: false
video:
  frame_analysis: false
  face_model_path: "./models/seeta_fd_frontal_v1.0.bin"
"#;
        let config = DetectorConfig::from_yaml(yaml).unwrap();
        assert!(matches!(
            config.text_model.source,
            ModelSourceSpec::Local { ref path } if path.ends_with("roberta-detector")
        ));
        assert!(!config.image.pixel_analysis);
        assert!(config.image.metadata);
        assert!(!config.video.frame_analysis);
        assert!(config.video.face_model_path.is_some());
    }

    #[test]
    fn test_parse_huggingface_default_revision() {
        let yaml = r#"
text_model:
  source:
    type: huggingface
    repo: "org/detector"
"#;
        let config = DetectorConfig::from_yaml(yaml).unwrap();
        match config.text_model.source {
            ModelSourceSpec::HuggingFace { repo, revision } => {
                assert_eq!(repo, "org/detector");
                assert_eq!(revision, "main");
            }
            other => panic!("Expected HuggingFace source, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = DetectorConfig::from_yaml("text_model: [").unwrap_err();
        assert!(matches!(err, provenant_core::Error::Config(_)));
    }
}
