//! EXIF metadata inspection

use exif::{Context, In, Tag, Value};
use provenant_core::{Error, Result};
use std::io::Cursor;

/// The EXIF facts the image extractor cares about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifSummary {
    /// `"Make Model"`, trimmed; `None` when neither tag is set
    pub camera: Option<String>,

    /// A GPS IFD is present
    pub has_gps: bool,

    /// Value of the `Software` tag
    pub software: Option<String>,
}

/// Reads embedded image metadata
pub trait MetadataReader: Send + Sync {
    /// `Ok(None)` when the container carries no EXIF block
    fn read(&self, bytes: &[u8]) -> Result<Option<ExifSummary>>;

    fn name(&self) -> &str;
}

/// [`MetadataReader`] backed by kamadak-exif
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifReader;

impl ExifReader {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataReader for ExifReader {
    fn read(&self, bytes: &[u8]) -> Result<Option<ExifSummary>> {
        // GIF has no EXIF container.
        if bytes.starts_with(b"GIF8") {
            return Ok(None);
        }

        let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Ok(None),
            Err(e) => return Err(Error::decode(format!("Failed to parse EXIF: {}", e))),
        };

        let make = ascii_field(&exif, Tag::Make);
        let model = ascii_field(&exif, Tag::Model);
        let camera = match (make, model) {
            (None, None) => None,
            (make, model) => {
                let joined = format!(
                    "{} {}",
                    make.unwrap_or_default(),
                    model.unwrap_or_default()
                );
                Some(joined.trim().to_string())
            }
        };

        let has_gps = exif.fields().any(|f| {
            f.tag == Tag::GPSInfoIFDPointer || f.tag.context() == Context::Gps
        });

        Ok(Some(ExifSummary {
            camera,
            has_gps,
            software: ascii_field(&exif, Tag::Software),
        }))
    }

    fn name(&self) -> &str {
        "kamadak-exif"
    }
}

/// First non-empty ASCII value of `tag` in the primary IFD
fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(values) => values
            .iter()
            .map(|v| {
                String::from_utf8_lossy(v)
                    .trim_matches(|c: char| c == '\0' || c.is_whitespace())
                    .to_string()
            })
            .find(|s| !s.is_empty()),
        _ => None,
    }
}
