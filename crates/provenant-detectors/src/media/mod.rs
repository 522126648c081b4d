//! Media decoding collaborators
//!
//! Each optional dependency of the image and video extractors sits behind a
//! small trait so the engine can decide availability once and tests can
//! substitute synthetic implementations.

pub mod exif;
pub mod faces;
pub mod frames;
pub mod pixels;

pub use self::exif::{ExifReader, ExifSummary, MetadataReader};
pub use faces::{FaceDetector, SeetaFaceDetector};
pub use frames::{FfmpegFrameSource, FrameSource, VideoInfo, VideoStream};
pub use pixels::{probe_dimensions, texture_uniformity};
