//! File formats and compression levels understood by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A document or image format that can be submitted or produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Portable Document Format
    Pdf,
    /// Office Open XML word processing document
    Docx,
    /// JPEG image
    Jpg,
    /// Portable Network Graphics image
    Png,
}

impl FileFormat {
    /// All known formats.
    pub const ALL: [FileFormat; 4] = [Self::Pdf, Self::Docx, Self::Jpg, Self::Png];

    /// Returns the canonical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }

    /// Returns the MIME type served for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Jpg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Whether this format is a raster image.
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Jpg | Self::Png)
    }

    /// Parses a bare extension (no leading dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "jpg" | "jpeg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Detects the format of a file name from its extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Error returned when parsing an unknown format string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported file format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for FileFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Smallest accepted compression level value.
pub const MIN_COMPRESSION_LEVEL: i64 = 1;
/// Largest accepted compression level value.
pub const MAX_COMPRESSION_LEVEL: i64 = 100;
/// Level applied when a caller does not pick one.
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 50;

/// Compression tier derived from a 1-100 level value.
///
/// Lower values compress harder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    /// Strongest compression, lowest quality.
    High,
    /// Balanced.
    Medium,
    /// Lightest compression, highest quality.
    Low,
}

impl CompressionLevel {
    /// Maps an already validated level value onto a tier.
    pub fn from_value(value: u8) -> Self {
        match value {
            0..=25 => Self::High,
            26..=50 => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Output quality ratio in (0, 1].
    pub fn quality_ratio(&self) -> f32 {
        match self {
            Self::High => 0.25,
            Self::Medium => 0.50,
            Self::Low => 0.75,
        }
    }

    /// JPEG encoder quality (1-100).
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality_ratio() * 100.0).round() as u8
    }
}

/// Builds the output name for a conversion, e.g. `report_converted.pdf`.
pub fn converted_file_name(source_name: &str, target: FileFormat) -> String {
    format!("{}_converted.{}", file_stem(source_name), target.extension())
}

/// Builds the output name for a compression, keeping the source extension.
pub fn compressed_file_name(source_name: &str) -> String {
    let path = Path::new(source_name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_compressed.{}", file_stem(source_name), ext),
        None => format!("{}_compressed", file_stem(source_name)),
    }
}

fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("file")
}
