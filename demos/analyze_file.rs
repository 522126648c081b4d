//! Example: Analyze a text, image, or video file from the command line
//!
//! The modality is chosen from the file extension. Capabilities come from the
//! default detector configuration, so the text model is downloaded on first
//! use and frame analysis needs ffmpeg on the PATH.
//!
//! Run with: cargo run --example analyze_file -- path/to/file.jpg

use provenant_core::{ImageInput, VideoInput};
use provenant_detectors::{DetectionEngine, DetectorConfig};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: analyze_file <path> [config.yaml]")?;
    let config = match std::env::args().nth(2) {
        Some(config_path) => DetectorConfig::from_file(config_path)?,
        None => DetectorConfig::default(),
    };

    println!("Provenant File Analysis\n");
    let engine = DetectionEngine::from_config(&config).await?;

    let report = engine.capabilities();
    println!("Capabilities:");
    println!("  text model:     {}", report.text_model.detail);
    println!("  metadata:       {}", report.metadata.detail);
    println!("  pixel analysis: {}", report.pixel_analysis.detail);
    println!("  frame analysis: {}", report.frame_analysis.detail);
    println!("  face detection: {}\n", report.face_detection.detail);

    let filename = Path::new(&path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.clone());
    let extension = Path::new(&path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let result = match extension.as_str() {
        "png" | "jpg" | "jpeg" | "webp" | "gif" => {
            let bytes = std::fs::read(&path)?;
            let mime = format!("image/{}", if extension == "jpg" { "jpeg" } else { extension.as_str() });
            engine.analyze_image(ImageInput::new(bytes, filename, mime)).await?
        }
        "mp4" | "webm" | "mov" => {
            let bytes = std::fs::read(&path)?;
            engine.analyze_video(VideoInput::new(bytes, filename)).await?
        }
        _ => {
            let text = std::fs::read_to_string(&path)?;
            engine.analyze_text(&text).await?
        }
    };

    println!("Prediction: {}", result.prediction);
    println!(
        "AI probability: {:.1}%  (human: {:.1}%)\n",
        result.ai_probability, result.human_probability
    );

    println!("Signals:");
    for signal in &result.signals {
        println!("  [{:<6}] {}", signal.weight.as_str(), signal.label);
        if !signal.detail.is_empty() {
            println!("           {}", signal.detail);
        }
    }

    println!("\nMetrics:");
    for (key, value) in &result.metrics {
        println!("  {}: {}", key, value);
    }

    Ok(())
}
