//! RoBERTa sequence classifier running on Candle
//!
//! Loads a fine-tuned RoBERTa detector checkpoint (by default
//! `openai-community/roberta-base-openai-detector`). The XLM-RoBERTa
//! sequence-classification module in `candle-transformers` shares RoBERTa's
//! weight layout, so it is used for both.

use super::{ModelVerdict, TextModel};
use crate::config::{ModelSourceSpec, TextModelConfig};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{
    Config as RobertaConfig, XLMRobertaForSequenceClassification,
};
use provenant_core::{round_to, Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokenizers::{Tokenizer, TruncationDirection};

/// Machine-text detector backed by a RoBERTa checkpoint
pub struct RobertaDetector {
    name: String,
    tokenizer: Tokenizer,
    model: XLMRobertaForSequenceClassification,
    device: Device,
    labels: Vec<String>,
    ai_index: usize,
    max_length: usize,
}

impl RobertaDetector {
    /// Resolve, download if needed, and load the configured checkpoint
    pub async fn load(config: &TextModelConfig) -> Result<Self> {
        let config = config.clone();
        tokio::task::spawn_blocking(move || Self::load_blocking(&config))
            .await
            .map_err(|e| Error::internal(format!("Model loading task failed: {}", e)))?
    }

    fn load_blocking(config: &TextModelConfig) -> Result<Self> {
        let model_path = resolve_model_path(&config.source)?;
        tracing::info!(path = %model_path.display(), "Loading RoBERTa detector");

        let tokenizer = load_tokenizer(&model_path)?;
        let config_path = model_path.join("config.json");
        let raw_config = read_json(&config_path)?;
        let roberta_config = parse_model_config(&raw_config)
            .map_err(|e| model_error(&format!("Failed to parse {}", config_path.display()), e))?;

        let labels = labels_from_config(&raw_config);
        let ai_index = resolve_ai_index(&labels, &config.ai_labels)?;

        let device = get_device(&config.device)?;
        let vb = load_var_builder(&model_path, &device)?;
        let model = XLMRobertaForSequenceClassification::new(labels.len(), &roberta_config, vb)
            .map_err(|e| model_error("Failed to build RoBERTa sequence model", e))?;

        tracing::info!(
            labels = ?labels,
            ai_label = %labels[ai_index],
            "Successfully loaded RoBERTa detector"
        );

        Ok(Self {
            name: config.name.clone(),
            tokenizer,
            model,
            device,
            labels,
            ai_index,
            max_length: config.max_length,
        })
    }

    fn input_tensor(&self, values: &[u32]) -> Result<Tensor> {
        Tensor::new(values, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| model_error("Failed to create input tensor", e))
    }
}

#[async_trait]
impl TextModel for RobertaDetector {
    async fn classify_text(&self, text: &str) -> Result<ModelVerdict> {
        let mut encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| model_error("Tokenization failed", e))?;
        encoding.truncate(self.max_length, 0, TruncationDirection::Right);

        let input_ids = self.input_tensor(encoding.get_ids())?;
        let attention_mask = self.input_tensor(encoding.get_attention_mask())?;
        let token_type_ids = self.input_tensor(encoding.get_type_ids())?;

        let logits = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids)
            .map_err(|e| model_error("Model forward pass failed", e))?;

        let probs: Vec<f32> = candle_nn::ops::softmax(&logits, D::Minus1)
            .and_then(|p| p.squeeze(0))
            .and_then(|p| p.to_vec1())
            .map_err(|e| model_error("Failed to read probabilities", e))?;

        let ai_prob = probs
            .get(self.ai_index)
            .copied()
            .ok_or_else(|| Error::model("AI label index out of range"))?;
        let winner = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap_or(self.ai_index);

        Ok(ModelVerdict::new(
            round_to(f64::from(ai_prob) * 100.0, 1),
            self.labels[winner].clone(),
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn model_error(context: &str, e: impl std::fmt::Display) -> Error {
    Error::model(format!("{}: {}", context, e))
}

fn resolve_model_path(source: &ModelSourceSpec) -> Result<PathBuf> {
    match source {
        ModelSourceSpec::Local { path } => {
            if !path.exists() {
                return Err(Error::model(format!(
                    "Model path does not exist: {}",
                    path.display()
                )));
            }
            Ok(path.clone())
        }
        ModelSourceSpec::HuggingFace { repo, revision } => download_from_huggingface(repo, revision),
    }
}

fn download_from_huggingface(repo: &str, revision: &str) -> Result<PathBuf> {
    tracing::info!(repo, revision, "Downloading model from HuggingFace");

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("provenant/models");
    std::fs::create_dir_all(&cache_dir).ok();

    let api = hf_hub::api::sync::ApiBuilder::new()
        .with_cache_dir(cache_dir)
        .build()
        .map_err(|e| model_error("Failed to initialize HuggingFace API", e))?;
    let repo_obj = api.repo(hf_hub::Repo::with_revision(
        repo.to_string(),
        hf_hub::RepoType::Model,
        revision.to_string(),
    ));

    let config_path = repo_obj
        .get("config.json")
        .map_err(|e| model_error("Failed to download config.json", e))?;

    if !["model.safetensors", "pytorch_model.bin"]
        .iter()
        .any(|file| repo_obj.get(file).is_ok())
    {
        return Err(Error::model(
            "No model weights found (tried model.safetensors, pytorch_model.bin)",
        ));
    }

    let has_tokenizer_json = repo_obj.get("tokenizer.json").is_ok();
    let has_bpe_files = repo_obj.get("vocab.json").is_ok() && repo_obj.get("merges.txt").is_ok();
    if !has_tokenizer_json && !has_bpe_files {
        return Err(Error::model(
            "No tokenizer found (tried tokenizer.json, vocab.json + merges.txt)",
        ));
    }

    let model_dir = config_path
        .parent()
        .ok_or_else(|| Error::model("Invalid cache path"))?;
    tracing::info!("Model available at: {}", model_dir.display());
    Ok(model_dir.to_path_buf())
}

fn get_device(device: &str) -> Result<Device> {
    match device.to_lowercase().as_str() {
        "cuda" | "cuda:0" => {
            Device::new_cuda(0).map_err(|e| model_error("Failed to initialize CUDA", e))
        }
        "mps" | "metal" => {
            Device::new_metal(0).map_err(|e| model_error("Failed to initialize Metal", e))
        }
        _ => Ok(Device::Cpu),
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| model_error(&format!("Failed to read {}", path.display()), e))?;
    serde_json::from_str(&content)
        .map_err(|e| model_error(&format!("Failed to parse {}", path.display()), e))
}

/// Parse `config.json` into Candle's config.
///
/// RoBERTa checkpoints exported by `transformers` omit
/// `position_embedding_type`, which Candle requires; it defaults to
/// `absolute` there.
fn parse_model_config(raw: &serde_json::Value) -> serde_json::Result<RobertaConfig> {
    let mut raw = raw.clone();
    if let Some(map) = raw.as_object_mut() {
        map.entry("position_embedding_type")
            .or_insert_with(|| serde_json::Value::String("absolute".to_string()));
    }
    serde_json::from_value(raw)
}

/// Class names ordered by index, from `id2label`
fn labels_from_config(config: &serde_json::Value) -> Vec<String> {
    let mut by_index = BTreeMap::new();
    if let Some(map) = config.get("id2label").and_then(|v| v.as_object()) {
        for (idx, label) in map {
            if let (Ok(idx), Some(label)) = (idx.parse::<usize>(), label.as_str()) {
                by_index.insert(idx, label.to_string());
            }
        }
    }
    if by_index.is_empty() {
        return vec!["LABEL_0".to_string(), "LABEL_1".to_string()];
    }
    by_index.into_values().collect()
}

fn resolve_ai_index(labels: &[String], ai_labels: &[String]) -> Result<usize> {
    labels
        .iter()
        .position(|label| ai_labels.iter().any(|ai| ai.eq_ignore_ascii_case(label)))
        .ok_or_else(|| {
            Error::model(format!(
                "None of the model labels {:?} match the configured AI labels {:?}",
                labels, ai_labels
            ))
        })
}

fn load_var_builder(model_path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_path.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)
                .map_err(|e| model_error("Failed to load weights", e))?
        };
        return Ok(vb);
    }

    let pth = model_path.join("pytorch_model.bin");
    if pth.exists() {
        return VarBuilder::from_pth(&pth, DType::F32, device)
            .map_err(|e| model_error("Failed to load pytorch weights", e));
    }

    Err(Error::model(format!(
        "No weights found in {} (tried model.safetensors, pytorch_model.bin)",
        model_path.display()
    )))
}

fn load_tokenizer(model_path: &Path) -> Result<Tokenizer> {
    let tokenizer_json = model_path.join("tokenizer.json");
    if tokenizer_json.exists() {
        tracing::debug!("Loading tokenizer from tokenizer.json");
        return Tokenizer::from_file(&tokenizer_json)
            .map_err(|e| model_error("Failed to load tokenizer.json", e));
    }

    let vocab = model_path.join("vocab.json");
    let merges = model_path.join("merges.txt");
    if vocab.exists() && merges.exists() {
        tracing::debug!("Building byte-level BPE tokenizer from vocab.json + merges.txt");

        use tokenizers::models::bpe::BPE;
        use tokenizers::pre_tokenizers::byte_level::ByteLevel;
        use tokenizers::processors::roberta::RobertaProcessing;

        let bpe = BPE::from_file(&vocab.to_string_lossy(), &merges.to_string_lossy())
            .build()
            .map_err(|e| model_error("Failed to build BPE model", e))?;

        let mut tokenizer = Tokenizer::new(bpe);
        tokenizer.with_pre_tokenizer(Some(ByteLevel::default().add_prefix_space(false)));
        tokenizer.with_decoder(Some(ByteLevel::default()));
        tokenizer.with_post_processor(Some(RobertaProcessing::new(
            ("</s>".to_string(), 2),
            ("<s>".to_string(), 0),
        )));
        return Ok(tokenizer);
    }

    Err(Error::model(format!(
        "No tokenizer found in {} (tried tokenizer.json, vocab.json + merges.txt)",
        model_path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_from_config_orders_by_index() {
        let config = serde_json::json!({
            "id2label": { "1": "Real", "0": "Fake" }
        });
        assert_eq!(labels_from_config(&config), vec!["Fake", "Real"]);
        assert_eq!(
            labels_from_config(&serde_json::json!({})),
            vec!["LABEL_0", "LABEL_1"]
        );
    }

    /// `config.json` of roberta-base-openai-detector
    fn roberta_base_config() -> serde_json::Value {
        serde_json::json!({
            "architectures": ["RobertaForSequenceClassification"],
            "attention_probs_dropout_prob": 0.1,
            "bos_token_id": 0,
            "eos_token_id": 2,
            "hidden_act": "gelu",
            "hidden_dropout_prob": 0.1,
            "hidden_size": 768,
            "id2label": { "0": "Fake", "1": "Real" },
            "initializer_range": 0.02,
            "intermediate_size": 3072,
            "label2id": { "Fake": 0, "Real": 1 },
            "layer_norm_eps": 1e-05,
            "max_position_embeddings": 514,
            "model_type": "roberta",
            "num_attention_heads": 12,
            "num_hidden_layers": 12,
            "pad_token_id": 1,
            "type_vocab_size": 1,
            "vocab_size": 50265
        })
    }

    #[test]
    fn test_parse_config_without_position_embedding_type() {
        let config = parse_model_config(&roberta_base_config()).unwrap();
        assert_eq!(config.position_embedding_type, "absolute");
        assert_eq!(config.hidden_size, 768);
        assert_eq!(config.pad_token_id, 1);
    }

    #[test]
    fn test_parse_config_keeps_explicit_position_embedding_type() {
        let mut raw = roberta_base_config();
        raw["position_embedding_type"] = serde_json::json!("relative_key");
        let config = parse_model_config(&raw).unwrap();
        assert_eq!(config.position_embedding_type, "relative_key");
    }

    #[test]
    fn test_resolve_ai_index() {
        let ai_labels = vec!["Fake".to_string(), "LABEL_1".to_string()];
        let labels = vec!["Fake".to_string(), "Real".to_string()];
        assert_eq!(resolve_ai_index(&labels, &ai_labels).unwrap(), 0);

        let generic = vec!["LABEL_0".to_string(), "LABEL_1".to_string()];
        assert_eq!(resolve_ai_index(&generic, &ai_labels).unwrap(), 1);

        let unknown = vec!["negative".to_string(), "positive".to_string()];
        assert!(resolve_ai_index(&unknown, &ai_labels).is_err());
    }

    #[test]
    fn test_missing_local_path() {
        let source = ModelSourceSpec::Local {
            path: PathBuf::from("/definitely/not/a/model/dir"),
        };
        assert!(matches!(resolve_model_path(&source), Err(Error::Model(_))));
    }

    #[test]
    fn test_empty_dir_has_no_tokenizer() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_tokenizer(dir.path()).is_err());
        assert!(load_var_builder(dir.path(), &Device::Cpu).is_err());
    }
}
