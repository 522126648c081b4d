//! Frontal face detection for video frames

use image::GrayImage;
use provenant_core::{Error, Result};
use std::io::Cursor;
use std::path::Path;

/// Smallest face considered, in pixels
pub const MIN_FACE_SIZE: u32 = 30;

/// Counts faces in a grayscale frame
pub trait FaceDetector: Send + Sync {
    fn count_faces(&self, frame: &GrayImage) -> Result<usize>;

    fn name(&self) -> &str;
}

/// SeetaFace cascade detector (rustface)
///
/// The model is parsed once; each call builds a detector from a clone.
pub struct SeetaFaceDetector {
    model: rustface::Model,
}

impl SeetaFaceDetector {
    /// Load and validate a SeetaFace model file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let model = std::fs::read(path).map_err(|e| {
            Error::capability(format!(
                "Failed to read face model {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_bytes(model)
    }

    /// Parse an in-memory SeetaFace model
    pub fn from_bytes(model: Vec<u8>) -> Result<Self> {
        let model = rustface::read_model(Cursor::new(model))
            .map_err(|e| Error::capability(format!("Invalid face model: {}", e)))?;
        Ok(Self { model })
    }
}

impl FaceDetector for SeetaFaceDetector {
    fn count_faces(&self, frame: &GrayImage) -> Result<usize> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let (width, height) = frame.dimensions();
        let mut data = rustface::ImageData::new(frame.as_raw(), width, height);
        Ok(detector.detect(&mut data).len())
    }

    fn name(&self) -> &str {
        "seetaface"
    }
}
