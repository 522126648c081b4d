//! Video frame sources
//!
//! [`FfmpegFrameSource`] spools the upload to a temporary file, reads stream
//! properties with `ffprobe`, and pulls only the requested frames out of a
//! single `ffmpeg` process as raw RGB24, one frame at a time.

use image::RgbImage;
use provenant_core::{Error, Result};
use serde::Deserialize;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// Stream properties of the primary video track
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frame_count: usize,
}

/// Opens uploaded video bytes for frame access
pub trait FrameSource: Send + Sync {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn VideoStream>>;

    fn name(&self) -> &str;
}

/// An opened video
pub trait VideoStream {
    fn info(&self) -> &VideoInfo;

    /// Decode the frames at `indices` (ascending, unique) and hand each to
    /// `visit` in order. Frames that cannot be decoded are skipped. Returns
    /// the number of frames visited.
    fn decode_frames(&mut self, indices: &[usize], visit: &mut dyn FnMut(RgbImage)) -> Result<usize>;
}

/// [`FrameSource`] backed by the ffmpeg command-line tools
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegFrameSource {
    /// Check that both tools run, then build the source
    pub fn probe(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Result<Self> {
        let source = Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        };
        check_tool(&source.ffmpeg)?;
        check_tool(&source.ffprobe)?;
        Ok(source)
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn VideoStream>> {
        let mut file = tempfile::Builder::new()
            .prefix("provenant-")
            .suffix(".video")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        let info = run_ffprobe(&self.ffprobe, file.path())?;
        tracing::debug!(
            width = info.width,
            height = info.height,
            fps = info.fps,
            frames = info.frame_count,
            "Probed video"
        );

        Ok(Box::new(FfmpegStream {
            file,
            info,
            ffmpeg: self.ffmpeg.clone(),
        }))
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

struct FfmpegStream {
    file: NamedTempFile,
    info: VideoInfo,
    ffmpeg: PathBuf,
}

impl VideoStream for FfmpegStream {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn decode_frames(&mut self, indices: &[usize], visit: &mut dyn FnMut(RgbImage)) -> Result<usize> {
        if indices.is_empty() || self.info.width == 0 || self.info.height == 0 {
            return Ok(0);
        }

        let mut child = Command::new(&self.ffmpeg)
            .args(decode_args(self.file.path(), indices))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::decode(format!("Failed to start ffmpeg: {}", e)))?;

        let frame_len = self.info.width as usize * self.info.height as usize * 3;
        let mut visited = 0;
        if let Some(mut stdout) = child.stdout.take() {
            while visited < indices.len() {
                let mut buf = vec![0u8; frame_len];
                match stdout.read_exact(&mut buf) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                    Err(e) => {
                        let _ = child.kill();
                        return Err(e.into());
                    }
                }
                match RgbImage::from_raw(self.info.width, self.info.height, buf) {
                    Some(frame) => {
                        visit(frame);
                        visited += 1;
                    }
                    None => break,
                }
            }
        }

        // Drop the rest of the output, if any.
        let _ = child.kill();
        let _ = child.wait();
        Ok(visited)
    }
}

/// ffmpeg arguments emitting the selected frames as raw RGB24 at the coded
/// size. Rotation metadata is ignored so frames keep ffprobe's width and
/// height.
fn decode_args(video: &Path, indices: &[usize]) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-noautorotate", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(video.as_os_str().to_os_string());
    args.extend(["-an", "-sn", "-vf"].iter().map(OsString::from));
    args.push(OsString::from(select_filter(indices)));
    args.extend(
        ["-vsync", "0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"]
            .iter()
            .map(OsString::from),
    );
    args
}

/// `select='eq(n\,a)+eq(n\,b)+...'`
fn select_filter(indices: &[usize]) -> String {
    let terms: Vec<String> = indices.iter().map(|i| format!("eq(n\\,{})", i)).collect();
    format!("select='{}'", terms.join("+"))
}

fn check_tool(path: &Path) -> Result<()> {
    let output = Command::new(path)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::capability(format!("{} not runnable: {}", path.display(), e)))?;
    if !output.status.success() {
        return Err(Error::capability(format!(
            "{} -version exited with {}",
            path.display(),
            output.status
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    nb_read_packets: Option<String>,
}

fn run_ffprobe(ffprobe: &Path, video: &Path) -> Result<VideoInfo> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_packets",
            "-show_entries",
            "stream=width,height,r_frame_rate,nb_frames,nb_read_packets",
            "-of",
            "json",
        ])
        .arg(video)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::decode(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(Error::decode(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe(&output.stdout)
}

fn parse_probe(json: &[u8]) -> Result<VideoInfo> {
    let probe: ProbeOutput = serde_json::from_slice(json)?;
    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| Error::decode("No video stream found"))?;

    let frame_count = [&stream.nb_frames, &stream.nb_read_packets]
        .into_iter()
        .filter_map(|v| v.as_deref().and_then(|s| s.parse::<usize>().ok()))
        .find(|&n| n > 0)
        .unwrap_or(0);

    Ok(VideoInfo {
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        fps: stream.r_frame_rate.as_deref().map(parse_rate).unwrap_or(0.0),
        frame_count,
    })
}

/// Parse an ffprobe rational such as `30000/1001`
fn parse_rate(rate: &str) -> f64 {
    match rate.split_once('/') {
        Some((num, den)) => match (num.parse::<f64>(), den.parse::<f64>()) {
            (Ok(n), Ok(d)) if d != 0.0 => n / d,
            _ => 0.0,
        },
        None => rate.parse().unwrap_or(0.0),
    }
}
