//! Text signal extraction
//!
//! Combines an optional pretrained classifier with stylometric heuristics:
//! sentence-length burstiness, lexical diversity, transition density,
//! LLM-associated vocabulary, structural repetition and word length.

use crate::lexicon;
use crate::model::TextModel;
use crate::stats;
use provenant_core::{
    round_to, AnalysisResult, Capability, Metrics, ScorePolicy, ScoreSheet, Signal, SignalWeight,
};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Minimum whitespace-separated words needed for analysis
pub const MIN_WORDS: usize = 5;

/// Characters of input passed to the pretrained model
pub const DEFAULT_MODEL_CHARS: usize = 2000;

const LEXICAL_STRIP: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"'];
const TRANSITION_STRIP: &[char] = &['.', ',', ';', ':'];
const VOCABULARY_STRIP: &[char] = &['.', ',', ';', ':', '\'', '"', '!', '?'];

/// Non-empty, trimmed sentences split on runs of `.`, `!`, `?`
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Stylometric measurements of a text
#[derive(Debug, Clone, PartialEq)]
pub struct TextFeatures {
    pub word_count: usize,
    pub sentence_count: usize,
    pub burstiness: f64,
    pub lexical_diversity: f64,
    pub transition_count: usize,
    pub transition_density: f64,
    /// AI-vocabulary hits, normalized, in order of appearance
    pub vocabulary_hits: Vec<String>,
    /// Only computed for four or more sentences
    pub structure_uniformity: Option<f64>,
    pub avg_word_length: f64,
    pub avg_sentence_length: f64,
    pub perplexity: f64,
}

impl TextFeatures {
    /// Measure `words`/`sentences`; both must be non-empty
    fn measure(words: &[&str], sentences: &[&str]) -> Self {
        let word_count = words.len();
        let sentence_lengths: Vec<f64> = sentences
            .iter()
            .map(|s| s.split_whitespace().count() as f64)
            .collect();

        let unique: HashSet<String> = words
            .iter()
            .map(|w| normalize(w, LEXICAL_STRIP))
            .collect();

        let transition_count = words
            .iter()
            .filter(|w| lexicon::is_transition_word(&normalize(w, TRANSITION_STRIP)))
            .count();

        let vocabulary_hits = words
            .iter()
            .map(|w| normalize(w, VOCABULARY_STRIP))
            .filter(|w| lexicon::is_ai_vocabulary(w))
            .collect();

        let structure_uniformity = (sentences.len() >= 4).then(|| structure_uniformity(sentences));

        Self {
            word_count,
            sentence_count: sentences.len(),
            burstiness: burstiness(&sentence_lengths),
            lexical_diversity: unique.len() as f64 / word_count as f64,
            transition_count,
            transition_density: transition_count as f64 / word_count as f64,
            vocabulary_hits,
            structure_uniformity,
            avg_word_length: words.iter().map(|w| w.chars().count()).sum::<usize>() as f64
                / word_count as f64,
            avg_sentence_length: word_count as f64 / sentences.len().max(1) as f64,
            perplexity: perplexity(words),
        }
    }

    fn metrics(&self) -> Metrics {
        let mut metrics = Metrics::new();
        metrics.insert("word_count".into(), json!(self.word_count));
        metrics.insert("sentence_count".into(), json!(self.sentence_count));
        metrics.insert("perplexity_estimate".into(), json!(round_to(self.perplexity, 1)));
        metrics.insert("burstiness".into(), json!(round_to(self.burstiness, 2)));
        metrics.insert(
            "lexical_diversity".into(),
            json!(round_to(self.lexical_diversity, 4)),
        );
        metrics.insert(
            "avg_sentence_length".into(),
            json!(round_to(self.avg_sentence_length, 1)),
        );
        metrics.insert("avg_word_length".into(), json!(round_to(self.avg_word_length, 1)));
        metrics.insert(
            "transition_density".into(),
            json!(round_to(self.transition_density, 4)),
        );
        metrics
    }
}

fn normalize(word: &str, strip: &[char]) -> String {
    word.to_lowercase().trim_matches(strip).to_string()
}

/// Population std-dev of sentence lengths; 10.0 below two sentences
fn burstiness(sentence_lengths: &[f64]) -> f64 {
    if sentence_lengths.len() < 2 {
        return 10.0;
    }
    stats::std_dev(sentence_lengths)
}

/// Mean of first-word repetition and length-bucket repetition
fn structure_uniformity(sentences: &[&str]) -> f64 {
    let first_words = sentences.iter().map(|s| {
        s.split_whitespace()
            .next()
            .map(str::to_lowercase)
            .unwrap_or_default()
    });
    let buckets = sentences.iter().map(|s| s.split_whitespace().count() / 5);
    (stats::top_frequency(first_words) + stats::top_frequency(buckets)) / 2.0
}

/// `2^H` over the lowercase unigram distribution
fn perplexity(words: &[&str]) -> f64 {
    if words.is_empty() {
        return 100.0;
    }
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in words {
        *counts.entry(word.to_lowercase()).or_insert(0) += 1;
    }
    let total = words.len() as f64;
    let entropy: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();
    2f64.powf(entropy)
}

/// First `max_chars` characters of `text`
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Distinct entries of `hits` in first-appearance order, at most `limit`
fn distinct_hits(hits: &[String], limit: usize) -> Vec<&str> {
    let mut seen = HashSet::new();
    hits.iter()
        .map(String::as_str)
        .filter(|hit| seen.insert(*hit))
        .take(limit)
        .collect()
}

/// Extracts signals from a piece of text
pub struct TextSignalExtractor {
    model: Capability<Arc<dyn TextModel>>,
    model_chars: usize,
}

impl TextSignalExtractor {
    pub fn new(model: Capability<Arc<dyn TextModel>>) -> Self {
        Self {
            model,
            model_chars: DEFAULT_MODEL_CHARS,
        }
    }

    /// Heuristics only
    pub fn heuristic() -> Self {
        Self::new(Capability::unavailable("no text model configured"))
    }

    /// Override how many characters are passed to the model
    pub fn with_model_chars(mut self, model_chars: usize) -> Self {
        self.model_chars = model_chars;
        self
    }

    pub fn has_model(&self) -> bool {
        self.model.is_available()
    }

    /// Analyze `text`
    pub async fn analyze(&self, text: &str) -> AnalysisResult {
        let words: Vec<&str> = text.split_whitespace().collect();
        let sentences = split_sentences(text);

        if words.len() < MIN_WORDS || sentences.is_empty() {
            return AnalysisResult::insufficient(Signal::low("Insufficient text", ""));
        }

        let mut sheet = ScoreSheet::new(ScorePolicy::TEXT);
        let model_result = self.model_signal(text, &mut sheet).await;

        let features = TextFeatures::measure(&words, &sentences);
        apply_heuristics(&features, &mut sheet);

        sheet.ensure_signal(Signal::low("No strong AI indicators", ""));

        let mut metrics = features.metrics();
        if let Some((score, name)) = model_result {
            metrics.insert("ml_model_score".into(), json!(score));
            metrics.insert("model_name".into(), json!(name));
        }
        sheet.finish(metrics)
    }

    /// Consult the model if available. Returns `(score, model name)` on success.
    async fn model_signal(&self, text: &str, sheet: &mut ScoreSheet) -> Option<(f64, String)> {
        let model = self.model.get()?;
        let input = truncate_chars(text, self.model_chars);

        match model.classify_text(input).await {
            Ok(verdict) => {
                let score = round_to(verdict.ai_probability, 1);
                let weight = if score > 70.0 {
                    SignalWeight::High
                } else if score > 45.0 {
                    SignalWeight::Medium
                } else {
                    SignalWeight::Low
                };
                sheet.add(
                    score * 0.5,
                    Signal::new(
                        format!("ML model: {}", model.name()),
                        weight,
                        format!("Model confidence: {:.1}% AI-generated", score),
                    ),
                );
                Some((score, model.name().to_string()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Text model inference failed");
                sheet.note(Signal::low("Model error, using heuristics only", e.to_string()));
                None
            }
        }
    }
}

impl Default for TextSignalExtractor {
    fn default() -> Self {
        Self::heuristic()
    }
}

fn apply_heuristics(f: &TextFeatures, sheet: &mut ScoreSheet) {
    if f.sentence_count > 3 {
        if f.burstiness < 3.5 {
            sheet.add(
                11.0,
                Signal::high(
                    "Low burstiness: unnaturally uniform sentence flow",
                    format!("Score: {:.2} (human avg: 6-12)", f.burstiness),
                ),
            );
        } else if f.burstiness < 5.0 {
            sheet.add(
                5.0,
                Signal::medium("Moderate burstiness", format!("Score: {:.2}", f.burstiness)),
            );
        }
    }

    if f.lexical_diversity < 0.50 {
        sheet.add(
            9.0,
            Signal::high(
                "Low lexical diversity",
                format!("Ratio: {:.3} (human avg: 0.6-0.8)", f.lexical_diversity),
            ),
        );
    } else if f.lexical_diversity < 0.58 {
        sheet.add(
            4.0,
            Signal::medium(
                "Below-average lexical diversity",
                format!("Ratio: {:.3}", f.lexical_diversity),
            ),
        );
    }

    if f.transition_density > 0.025 {
        sheet.add(
            8.0,
            Signal::high(
                "High transition word density",
                format!("{} transitions in {} words", f.transition_count, f.word_count),
            ),
        );
    } else if f.transition_density > 0.015 {
        sheet.add(
            4.0,
            Signal::medium(
                "Elevated transition word usage",
                format!("Density: {:.4}", f.transition_density),
            ),
        );
    }

    let hits = f.vocabulary_hits.len();
    if hits >= 3 {
        sheet.add(
            8.0,
            Signal::high(
                "AI-associated vocabulary detected",
                format!("Found: {}", distinct_hits(&f.vocabulary_hits, 5).join(", ")),
            ),
        );
    } else if hits >= 1 {
        sheet.add(
            3.0,
            Signal::low(
                "AI-associated vocabulary detected",
                format!("Found: {}", distinct_hits(&f.vocabulary_hits, 3).join(", ")),
            ),
        );
    }

    if let Some(uniformity) = f.structure_uniformity {
        if uniformity > 0.7 {
            sheet.add(
                7.0,
                Signal::high(
                    "Repetitive sentence structure",
                    format!("Uniformity: {:.2}", uniformity),
                ),
            );
        }
    }

    if f.avg_word_length > 5.5 {
        sheet.add(
            4.0,
            Signal::low(
                "High average word length",
                format!(
                    "Average: {:.1} chars (human avg: 4.5-5.2)",
                    f.avg_word_length
                ),
            ),
        );
    }
}
