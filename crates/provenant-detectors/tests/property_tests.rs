//! Property tests for result invariants across modalities

use proptest::prelude::*;
use provenant_core::{AnalysisResult, Capability, ImageInput, Prediction, SignalWeight, VideoInput};
use provenant_detectors::lexicon::{is_transition_word, AI_VOCABULARY};
use provenant_detectors::media::{ExifReader, MetadataReader};
use provenant_detectors::{
    EngineCapabilities, ImageSignalExtractor, TextSignalExtractor, VideoSignalExtractor,
};
use std::sync::Arc;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

fn assert_invariants(result: &AnalysisResult, ceiling: f64) {
    assert!(
        (result.ai_probability + result.human_probability - 100.0).abs() < 1e-9,
        "{} + {}",
        result.ai_probability,
        result.human_probability
    );
    assert!(result.ai_probability >= 5.0);
    assert!(result.ai_probability <= ceiling);
    assert!(!result.signals.is_empty());
}

/// Six eight-word sentences of unique long filler words, with the first
/// `hits` non-initial words replaced by distinct AI-vocabulary terms.
fn text_with_vocabulary_hits(hits: usize) -> String {
    let vocabulary: Vec<&str> = AI_VOCABULARY
        .iter()
        .copied()
        .filter(|w| !is_transition_word(w) && w.len() >= 6)
        .collect();

    let mut used = 0;
    let mut sentences = Vec::new();
    for s in 0..6 {
        let mut words = Vec::new();
        for w in 0..8 {
            if w > 0 && used < hits {
                words.push(vocabulary[used].to_string());
                used += 1;
            } else {
                words.push(format!("meadow{}x{}", s, w));
            }
        }
        sentences.push(words.join(" "));
    }
    format!("{}.", sentences.join(". "))
}

#[test]
fn test_vocabulary_fixture_holds_other_signals() {
    let extractor = TextSignalExtractor::heuristic();
    let base = block_on(extractor.analyze(&text_with_vocabulary_hits(0)));
    // burstiness 11 + word length 4
    assert_eq!(base.ai_probability, 15.0);

    let one = block_on(extractor.analyze(&text_with_vocabulary_hits(1)));
    assert_eq!(one.ai_probability, 18.0);
    let vocab = one.signals.iter().find(|s| s.label == "AI-associated vocabulary detected").unwrap();
    assert_eq!(vocab.weight, SignalWeight::Low);

    let three = block_on(extractor.analyze(&text_with_vocabulary_hits(3)));
    assert_eq!(three.ai_probability, 23.0);
}

#[test]
fn test_insufficient_text_exact_result() {
    let extractor = TextSignalExtractor::heuristic();
    for text in ["", "one", "a b c d", "Four words, that's all."] {
        let result = block_on(extractor.analyze(text));
        assert_eq!(result.prediction, Prediction::Uncertain);
        assert_eq!(result.ai_probability, 50.0);
        assert_eq!(result.human_probability, 50.0);
        assert_eq!(result.signals.len(), 1);
        assert_eq!(result.signals[0].label, "Insufficient text");
        assert_eq!(result.signals[0].weight, SignalWeight::Low);
        assert!(result.metrics.is_empty());
    }
}

proptest! {
    #[test]
    fn prop_vocabulary_hits_never_lower_score(hits in 0usize..30) {
        let extractor = TextSignalExtractor::heuristic();
        let fewer = block_on(extractor.analyze(&text_with_vocabulary_hits(hits)));
        let more = block_on(extractor.analyze(&text_with_vocabulary_hits(hits + 1)));
        prop_assert!(more.ai_probability >= fewer.ai_probability);
    }

    #[test]
    fn prop_text_invariants(text in "[a-zA-Z ,.!?']{0,400}") {
        let result = block_on(TextSignalExtractor::heuristic().analyze(&text));
        assert_invariants(&result, 98.0);
    }

    #[test]
    fn prop_image_invariants(
        bytes in prop::collection::vec(any::<u8>(), 0..4096),
        filename in "[a-zA-Z0-9_\\-]{1,24}\\.(png|jpg|webp|gif)",
    ) {
        let extractor = ImageSignalExtractor::new(
            Capability::Available(Arc::new(ExifReader::new()) as Arc<dyn MetadataReader>),
            Capability::Available(()),
        );
        let result = extractor.analyze(&ImageInput::new(bytes, filename, "image/png"));
        assert_invariants(&result, 96.0);
        prop_assert_eq!(
            result.signals.last().map(|s| s.label.as_str()),
            Some("Frequency domain analysis (FFT) performed")
        );
    }

    #[test]
    fn prop_video_invariants(len in 0usize..(3 * 1024 * 1024), filename in "[a-z]{1,12}\\.mp4") {
        let caps = EngineCapabilities::heuristic();
        let extractor = VideoSignalExtractor::new(caps.frames, caps.faces);
        let result = extractor.analyze(&VideoInput::new(vec![0u8; len], filename.clone()));
        assert_invariants(&result, 94.0);
        prop_assert_eq!(&result.signals.last().unwrap().detail, &filename);
    }
}
