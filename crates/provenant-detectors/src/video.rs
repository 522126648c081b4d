//! Video signal extraction
//!
//! Samples up to [`MAX_SAMPLED_FRAMES`] frames and measures temporal
//! coherence, sharpness stability, face-count stability and color
//! stability between consecutive samples. When frames cannot be decoded the
//! extractor falls back to a fixed basic-mode signal.

use crate::media::{FaceDetector, FrameSource, VideoInfo};
use crate::stats;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use provenant_core::{
    content_fingerprint, round_to, AnalysisResult, Capability, Error, Metrics, Result,
    ScorePolicy, ScoreSheet, Signal, StepOutcome, VideoInput,
};
use serde_json::json;
use std::sync::Arc;

/// Upper bound on decoded frames per video
pub const MAX_SAMPLED_FRAMES: usize = 50;

/// Side of the grayscale thumbnail used for frame correlation
pub const THUMBNAIL_SIZE: u32 = 256;

/// Histogram bins per color channel
pub const HISTOGRAM_BINS: usize = 8;

/// Sampled frames required before sharpness stability is judged
pub const MIN_FRAMES_FOR_QUALITY: usize = 10;

/// Evenly spaced frame indices over `[0, total - 1]`, at most `max` of them
pub fn sample_indices(total: usize, max: usize) -> Vec<usize> {
    let n = total.min(max);
    match n {
        0 => Vec::new(),
        1 => vec![0],
        _ => {
            let mut indices: Vec<usize> = (0..n).map(|k| k * (total - 1) / (n - 1)).collect();
            indices.dedup();
            indices
        }
    }
}

/// Variance of the 4-neighbour Laplacian over interior pixels
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }
    let px = |x: u32, y: u32| f64::from(gray.get_pixel(x, y).0[0]);

    let mut responses = Vec::with_capacity(((w - 2) * (h - 2)) as usize);
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let lap = px(x, y - 1) + px(x - 1, y) + px(x + 1, y) + px(x, y + 1) - 4.0 * px(x, y);
            responses.push(lap);
        }
    }
    let sd = stats::std_dev(&responses);
    sd * sd
}

/// L2-normalized joint RGB histogram with [`HISTOGRAM_BINS`] bins per channel
pub fn color_histogram(frame: &RgbImage) -> Vec<f64> {
    let shift = 8 - HISTOGRAM_BINS.trailing_zeros();
    let mut hist = vec![0f64; HISTOGRAM_BINS.pow(3)];
    for pixel in frame.pixels() {
        let [r, g, b] = pixel.0;
        let idx = ((r >> shift) as usize * HISTOGRAM_BINS + (g >> shift) as usize) * HISTOGRAM_BINS
            + (b >> shift) as usize;
        hist[idx] += 1.0;
    }
    let norm = hist.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        hist.iter_mut().for_each(|v| *v /= norm);
    }
    hist
}

/// Histogram correlation; identical flat histograms correlate perfectly
fn histogram_correlation(a: &[f64], b: &[f64]) -> f64 {
    stats::pearson(a, b).unwrap_or(1.0)
}

/// Thumbnail correlation clamped at zero; undefined correlation counts as zero
fn frame_coherence(a: &GrayImage, b: &GrayImage) -> f64 {
    let a: Vec<f64> = a.as_raw().iter().map(|&v| f64::from(v)).collect();
    let b: Vec<f64> = b.as_raw().iter().map(|&v| f64::from(v)).collect();
    stats::pearson(&a, &b).unwrap_or(0.0).max(0.0)
}

/// Aggregated frame measurements for one video
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub frames_analyzed: usize,
    pub fps: f64,
    pub resolution: String,
    pub temporal_coherence: f64,
    pub quality_variance: f64,
    pub color_consistency: f64,
    pub face_inconsistency: f64,
    pub faces_detected: usize,
}

/// Folds decoded frames into running statistics.
///
/// Only the previous frame's thumbnail and histogram are retained.
#[derive(Default)]
pub struct FrameAccumulator {
    sharpness: Vec<f64>,
    coherence: Vec<f64>,
    color: Vec<f64>,
    face_counts: Vec<usize>,
    previous: Option<(GrayImage, Vec<f64>)>,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one frame, with its face count when face detection ran
    pub fn push(&mut self, frame: &RgbImage, faces: Option<usize>) {
        let gray = imageops::grayscale(frame);
        self.sharpness.push(laplacian_variance(&gray));
        if let Some(count) = faces {
            self.face_counts.push(count);
        }

        let thumbnail = imageops::resize(&gray, THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle);
        let histogram = color_histogram(frame);
        if let Some((prev_thumb, prev_hist)) = &self.previous {
            self.coherence.push(frame_coherence(prev_thumb, &thumbnail));
            self.color.push(histogram_correlation(prev_hist, &histogram));
        }
        self.previous = Some((thumbnail, histogram));
    }

    pub fn frames(&self) -> usize {
        self.sharpness.len()
    }

    /// Summarize; `None` below two frames
    pub fn finish(self, info: &VideoInfo) -> Option<FrameAnalysis> {
        if self.frames() < 2 {
            return None;
        }

        let with_faces: Vec<f64> = self
            .face_counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| c as f64)
            .collect();
        let face_inconsistency = if with_faces.is_empty() {
            0.0
        } else {
            stats::std_dev(&with_faces) / (stats::mean(&with_faces) + 1e-6)
        };

        Some(FrameAnalysis {
            frames_analyzed: self.frames(),
            fps: round_to(info.fps, 1),
            resolution: format!("{}×{}", info.width, info.height),
            temporal_coherence: stats::mean(&self.coherence),
            quality_variance: stats::std_dev(&self.sharpness),
            color_consistency: stats::mean(&self.color),
            face_inconsistency,
            faces_detected: with_faces.len(),
        })
    }
}

/// Extracts signals from a video upload
pub struct VideoSignalExtractor {
    frames: Capability<Arc<dyn FrameSource>>,
    faces: Capability<Arc<dyn FaceDetector>>,
}

impl VideoSignalExtractor {
    pub fn new(
        frames: Capability<Arc<dyn FrameSource>>,
        faces: Capability<Arc<dyn FaceDetector>>,
    ) -> Self {
        Self { frames, faces }
    }

    /// Analyze `input`
    pub fn analyze(&self, input: &VideoInput) -> AnalysisResult {
        let mut sheet = ScoreSheet::new(ScorePolicy::VIDEO);
        let size_mb = input.size_mb();

        if size_mb < 1.0 {
            sheet.add(
                8.0,
                Signal::low("Small video, limited frames", format!("{:.2} MB", size_mb)),
            );
        }

        let analysis = StepOutcome::when_available(&self.frames, |source| {
            self.analyze_frames(source.as_ref(), &input.bytes)
        })
        .trace("frame analysis");

        match analysis.as_completed() {
            Some(frames) => apply_frame_signals(frames, &mut sheet),
            None => {
                if let StepOutcome::Failed(e) = &analysis {
                    tracing::warn!(filename = %input.filename, error = %e, "Frame analysis failed, using basic mode");
                }
                sheet.add(
                    15.0,
                    Signal::medium(
                        "Frame analysis (basic mode)",
                        "Frame decoding unavailable for this file",
                    ),
                );
            }
        }

        sheet.note(Signal::low("Encoding metadata inspected", input.filename.clone()));

        let mut metrics = Metrics::new();
        metrics.insert("file_size_mb".into(), json!(round_to(size_mb, 2)));
        metrics.insert("filename".into(), json!(input.filename));
        metrics.insert("file_hash".into(), json!(content_fingerprint(&input.bytes)));
        if let Some(frames) = analysis.as_completed() {
            metrics.insert("frames_analyzed".into(), json!(frames.frames_analyzed));
            metrics.insert("fps".into(), json!(frames.fps));
            metrics.insert("resolution".into(), json!(frames.resolution));
            metrics.insert(
                "temporal_coherence".into(),
                json!(round_to(frames.temporal_coherence, 3)),
            );
        }

        sheet.finish(metrics)
    }

    fn analyze_frames(&self, source: &dyn FrameSource, bytes: &[u8]) -> Result<FrameAnalysis> {
        let mut stream = source.open(bytes)?;
        let info = stream.info().clone();
        let indices = sample_indices(info.frame_count, MAX_SAMPLED_FRAMES);
        if indices.len() < 2 {
            return Err(Error::extraction(format!(
                "Too few frames to sample ({})",
                info.frame_count
            )));
        }

        let detector = self.faces.get();
        let mut accumulator = FrameAccumulator::new();
        stream.decode_frames(&indices, &mut |frame| {
            let faces = detector.and_then(|d| {
                d.count_faces(&imageops::grayscale(&frame))
                    .map_err(|e| tracing::debug!(error = %e, "Face detection failed"))
                    .ok()
            });
            accumulator.push(&frame, faces);
        })?;

        let decoded = accumulator.frames();
        accumulator
            .finish(&info)
            .ok_or_else(|| Error::extraction(format!("Only {} frames decoded", decoded)))
    }
}

fn apply_frame_signals(frames: &FrameAnalysis, sheet: &mut ScoreSheet) {
    let tc = frames.temporal_coherence;
    if tc < 0.75 {
        sheet.add(
            20.0,
            Signal::high(
                "Low temporal coherence",
                format!("Score: {:.3} (natural: >0.85)", tc),
            ),
        );
    } else if tc < 0.85 {
        sheet.add(
            10.0,
            Signal::medium("Moderate temporal coherence", format!("Score: {:.3}", tc)),
        );
    } else {
        sheet.note(Signal::low("Good temporal coherence", format!("Score: {:.3}", tc)));
    }

    if frames.quality_variance < 5.0 && frames.frames_analyzed >= MIN_FRAMES_FOR_QUALITY {
        sheet.add(
            12.0,
            Signal::medium(
                "Unnaturally uniform frame quality",
                format!("Variance: {:.2}", frames.quality_variance),
            ),
        );
    }

    if frames.face_inconsistency > 0.3 {
        sheet.add(
            18.0,
            Signal::high(
                "Facial landmark inconsistencies",
                format!("Score: {:.2}", frames.face_inconsistency),
            ),
        );
    } else if frames.faces_detected > 0 {
        sheet.note(Signal::low(
            "Faces detected, landmarks consistent",
            format!("Found in {} frames", frames.faces_detected),
        ));
    }

    if frames.color_consistency < 0.8 {
        sheet.add(
            10.0,
            Signal::medium(
                "Color distribution shifts between frames",
                format!("Consistency: {:.3}", frames.color_consistency),
            ),
        );
    }
}
