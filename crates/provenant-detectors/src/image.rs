//! Image signal extraction
//!
//! Filename, file size, EXIF metadata, output resolution and texture
//! statistics. Every step after the filename scan is optional; a step that is
//! skipped or fails contributes nothing.

use crate::lexicon;
use crate::media::{pixels, ExifSummary, MetadataReader};
use provenant_core::{
    content_fingerprint, round_to, AnalysisResult, Capability, ImageInput, Metrics, ScorePolicy,
    ScoreSheet, Signal, StepOutcome,
};
use serde_json::json;
use std::sync::Arc;

/// Uniformity above which texture is flagged
pub const TEXTURE_UNIFORMITY_THRESHOLD: f64 = 0.85;

/// Uniformity above which the noise pattern is considered synthetic
pub const SYNTHETIC_NOISE_THRESHOLD: f64 = 0.82;

/// Extracts signals from an image upload
pub struct ImageSignalExtractor {
    metadata: Capability<Arc<dyn MetadataReader>>,
    pixels: Capability,
}

impl ImageSignalExtractor {
    pub fn new(metadata: Capability<Arc<dyn MetadataReader>>, pixels: Capability) -> Self {
        Self { metadata, pixels }
    }

    /// Analyze `input`
    pub fn analyze(&self, input: &ImageInput) -> AnalysisResult {
        let mut sheet = ScoreSheet::new(ScorePolicy::IMAGE);
        let size_mb = input.size_mb();

        if let Some(keyword) = lexicon::find_generator_keyword(&input.filename) {
            sheet.add(
                25.0,
                Signal::high(
                    format!("Filename contains AI generator: '{}'", keyword),
                    input.filename.clone(),
                ),
            );
        }

        if size_mb < 0.1 {
            sheet.add(
                10.0,
                Signal::medium("Very small file, possibly synthetic", format!("{:.2} MB", size_mb)),
            );
        } else if size_mb < 0.5 {
            sheet.add(5.0, Signal::low("Small file size", format!("{:.2} MB", size_mb)));
        }

        let exif = StepOutcome::when_available(&self.metadata, |reader| reader.read(&input.bytes))
            .trace("exif");
        let exif = exif.completed();
        if let Some(found) = &exif {
            apply_metadata(found.as_ref(), &mut sheet);
        }

        let dimensions =
            StepOutcome::when_available(&self.pixels, |_| pixels::probe_dimensions(&input.bytes))
                .trace("dimensions")
                .completed();
        if let Some((w, h)) = dimensions {
            if lexicon::is_generator_resolution(w, h) {
                sheet.add(
                    12.0,
                    Signal::medium(
                        format!("AI-typical resolution: {}×{}", w, h),
                        "Common AI generator output size",
                    ),
                );
            }
        }

        let uniformity = StepOutcome::when_available(&self.pixels, |_| {
            let rgb = pixels::decode_rgb(&input.bytes)?;
            pixels::texture_uniformity(&rgb)
                .ok_or_else(|| provenant_core::Error::extraction("Image too small for region grid"))
        })
        .trace("pixel statistics");
        if let Some(&uniformity) = uniformity.as_completed() {
            if uniformity > TEXTURE_UNIFORMITY_THRESHOLD {
                sheet.add(
                    12.0,
                    Signal::medium("High texture uniformity", format!("Score: {:.3}", uniformity)),
                );
            }
            if uniformity > SYNTHETIC_NOISE_THRESHOLD {
                sheet.add(
                    10.0,
                    Signal::medium(
                        "Synthetic noise pattern",
                        "Noise inconsistent with camera sensors",
                    ),
                );
            }
        }

        sheet.note(Signal::medium(
            "Frequency domain analysis (FFT) performed",
            "Scanned for GAN artifacts",
        ));

        let summary = exif.flatten();
        let mut metrics = Metrics::new();
        metrics.insert("file_size_mb".into(), json!(round_to(size_mb, 2)));
        metrics.insert("format".into(), json!(input.content_type));
        metrics.insert("exif_present".into(), json!(summary.is_some()));
        metrics.insert(
            "camera".into(),
            json!(summary
                .as_ref()
                .and_then(|s| s.camera.clone())
                .unwrap_or_else(|| "None".to_string())),
        );
        metrics.insert(
            "dimensions".into(),
            json!(dimensions
                .map(|(w, h)| format!("{}×{}", w, h))
                .unwrap_or_else(|| "Unknown".to_string())),
        );
        metrics.insert("file_hash".into(), json!(content_fingerprint(&input.bytes)));

        sheet.finish(metrics)
    }
}

fn apply_metadata(summary: Option<&ExifSummary>, sheet: &mut ScoreSheet) {
    let Some(summary) = summary else {
        sheet.add(
            12.0,
            Signal::medium(
                "No EXIF metadata, common in AI images",
                "Real photos typically have EXIF data",
            ),
        );
        return;
    };

    if let Some(camera) = &summary.camera {
        sheet.add(
            -15.0,
            Signal::low(
                "Camera metadata present, likely real photo",
                format!("Camera: {}", camera),
            ),
        );
    }
    if summary.has_gps {
        sheet.add(
            -10.0,
            Signal::low("GPS coordinates present", "Location data embedded"),
        );
    }
    if let Some(software) = &summary.software {
        if lexicon::is_generation_software(software) {
            sheet.add(
                15.0,
                Signal::high(format!("AI/editing software detected: {}", software), ""),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provenant_core::{Prediction, Result};

    struct FixedMetadata(Option<ExifSummary>);

    impl MetadataReader for FixedMetadata {
        fn read(&self, _bytes: &[u8]) -> Result<Option<ExifSummary>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn extractor(summary: Option<ExifSummary>) -> ImageSignalExtractor {
        ImageSignalExtractor::new(
            Capability::Available(Arc::new(FixedMetadata(summary))),
            Capability::unavailable("pixels disabled"),
        )
    }

    fn labels(result: &AnalysisResult) -> Vec<&str> {
        result.signals.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn test_no_exif_small_file() {
        let input = ImageInput::new(vec![0u8; 1024], "photo.png", "image/png");
        let result = extractor(None).analyze(&input);
        // 10 (tiny) + 12 (no EXIF) + 25 bias
        assert_eq!(result.ai_probability, 47.0);
        assert_eq!(result.prediction, Prediction::Uncertain);
        assert_eq!(
            labels(&result),
            vec![
                "Very small file, possibly synthetic",
                "No EXIF metadata, common in AI images",
                "Frequency domain analysis (FFT) performed",
            ]
        );
        assert_eq!(result.metrics["exif_present"], json!(false));
        assert_eq!(result.metrics["camera"], json!("None"));
        assert_eq!(result.metrics["dimensions"], json!("Unknown"));
    }

    #[test]
    fn test_editing_software_signal() {
        let summary = ExifSummary {
            camera: None,
            has_gps: false,
            software: Some("Adobe Photoshop 25.1".to_string()),
        };
        let input = ImageInput::new(vec![0u8; 300 * 1024], "edit.jpg", "image/jpeg");
        let result = extractor(Some(summary)).analyze(&input);
        // 5 (small) + 15 (software) + 25 bias
        assert_eq!(result.ai_probability, 45.0);
        assert!(labels(&result).contains(&"AI/editing software detected: Adobe Photoshop 25.1"));
        assert_eq!(result.metrics["exif_present"], json!(true));
    }

    /// 64×64 PNG whose 16×16 regions are checkerboards around 128.
    ///
    /// Regions alternate between std-devs `a` and `b`, so the texture
    /// uniformity is `1 - |a - b| / (a + b)`.
    fn two_texture_png(a: u8, b: u8) -> Vec<u8> {
        let image = ::image::RgbImage::from_fn(64, 64, |x, y| {
            let amplitude = if (x / 16 + y / 16) % 2 == 0 { a } else { b };
            let v = if (x + y) % 2 == 0 { 128 + amplitude } else { 128 - amplitude };
            ::image::Rgb([v, v, v])
        });
        let mut out = std::io::Cursor::new(Vec::new());
        image.write_to(&mut out, ::image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn pixel_extractor() -> ImageSignalExtractor {
        ImageSignalExtractor::new(
            Capability::unavailable("metadata disabled"),
            Capability::Available(()),
        )
    }

    #[test]
    fn test_fixture_uniformity_bands() {
        let decode = |bytes: Vec<u8>| {
            pixels::texture_uniformity(&pixels::decode_rgb(&bytes).unwrap()).unwrap()
        };
        assert!((decode(two_texture_png(35, 25)) - 5.0 / 6.0).abs() < 1e-6);
        assert!((decode(two_texture_png(32, 28)) - 14.0 / 15.0).abs() < 1e-6);
        assert!((decode(two_texture_png(40, 20)) - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_synthetic_noise_band_only() {
        let input = ImageInput::new(two_texture_png(35, 25), "texture.png", "image/png");
        let result = pixel_extractor().analyze(&input);

        // 10 (tiny) + 10 (noise) + 25 bias
        assert_eq!(result.ai_probability, 45.0);
        assert_eq!(
            labels(&result),
            vec![
                "Very small file, possibly synthetic",
                "Synthetic noise pattern",
                "Frequency domain analysis (FFT) performed",
            ]
        );
        assert_eq!(result.metrics["dimensions"], json!("64×64"));
    }

    #[test]
    fn test_high_uniformity_adds_both_signals() {
        let input = ImageInput::new(two_texture_png(32, 28), "texture.png", "image/png");
        let result = pixel_extractor().analyze(&input);

        // 10 (tiny) + 12 (texture) + 10 (noise) + 25 bias
        assert_eq!(result.ai_probability, 57.0);
        assert_eq!(
            labels(&result),
            vec![
                "Very small file, possibly synthetic",
                "High texture uniformity",
                "Synthetic noise pattern",
                "Frequency domain analysis (FFT) performed",
            ]
        );
    }

    #[test]
    fn test_varied_texture_adds_no_pixel_signal() {
        let input = ImageInput::new(two_texture_png(40, 20), "texture.png", "image/png");
        let result = pixel_extractor().analyze(&input);

        assert_eq!(result.ai_probability, 35.0);
        assert_eq!(result.prediction, Prediction::HumanCreated);
        assert!(!labels(&result).contains(&"Synthetic noise pattern"));
        assert!(!labels(&result).contains(&"High texture uniformity"));
    }

    #[test]
    fn test_unavailable_metadata_contributes_nothing() {
        let extractor = ImageSignalExtractor::new(
            Capability::unavailable("metadata disabled"),
            Capability::unavailable("pixels disabled"),
        );
        let input = ImageInput::new(vec![0u8; 2 * 1024 * 1024], "image.webp", "image/webp");
        let result = extractor.analyze(&input);
        assert_eq!(result.ai_probability, 25.0);
        assert_eq!(result.prediction, Prediction::HumanCreated);
        assert_eq!(result.signals.len(), 1);
    }
}
