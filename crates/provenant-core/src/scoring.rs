//! Score aggregation and classification policy
//!
//! Every modality sums fixed per-signal deltas into a running score. The
//! signal weight is never applied to the delta. Once all checks have run the
//! modality adds its own baseline bias, clamps into its own interval and maps
//! the clamped score to a verdict with the shared thresholds below.

use crate::types::{AnalysisResult, Metrics, Prediction, Signal};

/// Scores strictly above this are `ai_generated`
pub const AI_THRESHOLD: f64 = 65.0;

/// Scores strictly above this (and not above [`AI_THRESHOLD`]) are `uncertain`
pub const UNCERTAIN_THRESHOLD: f64 = 40.0;

/// Per-modality bias and clamp interval.
///
/// The constants are frozen calibration values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorePolicy {
    /// Added to the accumulated score before clamping
    pub bias: f64,

    /// Lower clamp bound
    pub floor: f64,

    /// Upper clamp bound
    pub ceiling: f64,
}

impl ScorePolicy {
    pub const TEXT: ScorePolicy = ScorePolicy {
        bias: 0.0,
        floor: 5.0,
        ceiling: 98.0,
    };

    pub const IMAGE: ScorePolicy = ScorePolicy {
        bias: 25.0,
        floor: 5.0,
        ceiling: 96.0,
    };

    pub const VIDEO: ScorePolicy = ScorePolicy {
        bias: 20.0,
        floor: 5.0,
        ceiling: 94.0,
    };

    /// Apply bias then clamp
    pub fn finalize(&self, raw: f64) -> f64 {
        (raw + self.bias).clamp(self.floor, self.ceiling)
    }
}

/// Map a clamped score to a verdict
pub fn classify(score: f64) -> Prediction {
    if score > AI_THRESHOLD {
        Prediction::AiGenerated
    } else if score > UNCERTAIN_THRESHOLD {
        Prediction::Uncertain
    } else {
        Prediction::HumanCreated
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Running score plus the ordered evidence that produced it
#[derive(Debug, Clone)]
pub struct ScoreSheet {
    policy: ScorePolicy,
    score: f64,
    signals: Vec<Signal>,
}

impl ScoreSheet {
    pub fn new(policy: ScorePolicy) -> Self {
        Self {
            policy,
            score: 0.0,
            signals: Vec::new(),
        }
    }

    /// Record a signal and its fixed score delta
    pub fn add(&mut self, delta: f64, signal: Signal) {
        tracing::debug!(
            label = %signal.label,
            weight = %signal.weight,
            delta,
            "signal"
        );
        self.score += delta;
        self.signals.push(signal);
    }

    /// Record an informational signal that does not move the score
    pub fn note(&mut self, signal: Signal) {
        self.add(0.0, signal);
    }

    /// Append `fallback` if nothing has been recorded yet
    pub fn ensure_signal(&mut self, fallback: Signal) {
        if self.signals.is_empty() {
            self.signals.push(fallback);
        }
    }

    /// Accumulated score before bias and clamping
    pub fn raw_score(&self) -> f64 {
        self.score
    }

    /// Score after bias and clamping
    pub fn final_score(&self) -> f64 {
        self.policy.finalize(self.score)
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Clamp, classify and assemble the result
    pub fn finish(self, metrics: Metrics) -> AnalysisResult {
        let score = self.final_score();
        let ai_probability = round_to(score, 1);
        AnalysisResult {
            prediction: classify(score),
            ai_probability,
            human_probability: round_to(100.0 - ai_probability, 1),
            signals: self.signals,
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalWeight;
    use proptest::prelude::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(classify(65.0), Prediction::Uncertain);
        assert_eq!(classify(65.01), Prediction::AiGenerated);
        assert_eq!(classify(40.0), Prediction::HumanCreated);
        assert_eq!(classify(40.01), Prediction::Uncertain);
    }

    #[test]
    fn test_policy_constants() {
        assert_eq!(ScorePolicy::TEXT.finalize(200.0), 98.0);
        assert_eq!(ScorePolicy::TEXT.finalize(-3.0), 5.0);
        assert_eq!(ScorePolicy::IMAGE.finalize(0.0), 25.0);
        assert_eq!(ScorePolicy::IMAGE.finalize(100.0), 96.0);
        assert_eq!(ScorePolicy::VIDEO.finalize(15.0), 35.0);
        assert_eq!(ScorePolicy::VIDEO.finalize(100.0), 94.0);
    }

    #[test]
    fn test_weight_does_not_scale_delta() {
        let mut high = ScoreSheet::new(ScorePolicy::TEXT);
        high.add(10.0, Signal::new("a", SignalWeight::High, ""));
        let mut low = ScoreSheet::new(ScorePolicy::TEXT);
        low.add(10.0, Signal::new("a", SignalWeight::Low, ""));
        assert_eq!(high.raw_score(), low.raw_score());
    }

    #[test]
    fn test_sheet_preserves_order_and_notes() {
        let mut sheet = ScoreSheet::new(ScorePolicy::VIDEO);
        sheet.add(8.0, Signal::low("first", ""));
        sheet.note(Signal::low("second", ""));
        sheet.add(15.0, Signal::medium("third", ""));
        assert_eq!(sheet.raw_score(), 23.0);

        let result = sheet.finish(Metrics::new());
        let labels: Vec<_> = result.signals.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
        assert_eq!(result.ai_probability, 43.0);
        assert_eq!(result.prediction, Prediction::Uncertain);
    }

    #[test]
    fn test_ensure_signal_only_when_empty() {
        let mut sheet = ScoreSheet::new(ScorePolicy::TEXT);
        sheet.ensure_signal(Signal::low("fallback", ""));
        sheet.ensure_signal(Signal::low("second fallback", ""));
        assert_eq!(sheet.signals().len(), 1);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to(67.25, 1), 67.3);
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(12.0, 2), 12.0);
    }

    proptest! {
        #[test]
        fn prop_probabilities_sum_to_100(raw in -500.0f64..500.0) {
            for policy in [ScorePolicy::TEXT, ScorePolicy::IMAGE, ScorePolicy::VIDEO] {
                let mut sheet = ScoreSheet::new(policy);
                sheet.add(raw, Signal::low("x", ""));
                let result = sheet.finish(Metrics::new());
                prop_assert!((result.ai_probability + result.human_probability - 100.0).abs() < 1e-9);
                prop_assert!(result.ai_probability >= policy.floor);
                prop_assert!(result.ai_probability <= policy.ceiling);
            }
        }
    }
}
