//! Raster image strategies built on the `image` crate.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

use super::error::ProcessingError;
use super::traits::{CompressionStrategy, ConversionStrategy, ProgressSink};
use crate::format::{CompressionLevel, FileFormat};

/// JPEG quality used when converting into JPEG.
const CONVERSION_JPEG_QUALITY: u8 = 90;

/// Converts between JPEG and PNG.
#[derive(Debug, Default, Clone)]
pub struct ImageFormatConverter;

impl ImageFormatConverter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionStrategy for ImageFormatConverter {
    fn name(&self) -> &str {
        "image-format"
    }

    fn supports(&self, source: FileFormat, target: FileFormat) -> bool {
        matches!(
            (source, target),
            (FileFormat::Jpg, FileFormat::Png) | (FileFormat::Png, FileFormat::Jpg)
        )
    }

    async fn convert(
        &self,
        source: &Path,
        target: &Path,
        progress: ProgressSink,
    ) -> Result<(), ProcessingError> {
        let target_format = FileFormat::from_file_name(&target.to_string_lossy())
            .filter(FileFormat::is_image)
            .ok_or_else(|| ProcessingError::Unsupported {
                reason: format!("not an image target: {}", target.display()),
            })?;

        let source = source.to_path_buf();
        let target = target.to_path_buf();
        run_blocking(move || {
            progress.report(20);
            let img = decode(&source)?;
            progress.report(50);
            match target_format {
                FileFormat::Jpg => write_jpeg(&img, &target, CONVERSION_JPEG_QUALITY)?,
                _ => write_png(&img, &target, CompressionType::Default)?,
            }
            progress.report(100);
            Ok(())
        })
        .await
    }
}

/// Re-encodes JPEG and PNG images at a lower quality.
///
/// JPEG output quality follows the level's ratio. PNG stays lossless and
/// trades encode time for size instead.
#[derive(Debug, Default, Clone)]
pub struct ImageCompressor;

impl ImageCompressor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompressionStrategy for ImageCompressor {
    fn name(&self) -> &str {
        "image-compress"
    }

    fn supports(&self, format: FileFormat) -> bool {
        format.is_image()
    }

    async fn compress(
        &self,
        source: &Path,
        target: &Path,
        level: CompressionLevel,
        progress: ProgressSink,
    ) -> Result<(), ProcessingError> {
        let format = FileFormat::from_file_name(&source.to_string_lossy())
            .filter(FileFormat::is_image)
            .ok_or_else(|| ProcessingError::Unsupported {
                reason: format!("not an image: {}", source.display()),
            })?;

        let source = source.to_path_buf();
        let target = target.to_path_buf();
        run_blocking(move || {
            progress.report(20);
            let img = decode(&source)?;
            progress.report(40);
            progress.report(60);
            match format {
                FileFormat::Png => write_png(&img, &target, png_compression(level))?,
                _ => write_jpeg(&img, &target, level.jpeg_quality())?,
            }
            debug!(
                source = %source.display(),
                level = ?level,
                "Image re-encoded"
            );
            progress.report(100);
            Ok(())
        })
        .await
    }
}

fn png_compression(level: CompressionLevel) -> CompressionType {
    match level {
        CompressionLevel::High => CompressionType::Best,
        CompressionLevel::Medium => CompressionType::Default,
        CompressionLevel::Low => CompressionType::Fast,
    }
}

/// Runs CPU-bound codec work off the async workers.
async fn run_blocking<F>(work: F) -> Result<(), ProcessingError>
where
    F: FnOnce() -> Result<(), ProcessingError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ProcessingError::Aborted {
            reason: e.to_string(),
        })?
}

fn decode(path: &Path) -> Result<DynamicImage, ProcessingError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// Encodes `img` as JPEG into memory, dropping any alpha channel.
pub(crate) fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, ProcessingError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)))?;
    Ok(buf)
}

/// Encodes `img` as PNG into memory.
pub(crate) fn encode_png(
    img: &DynamicImage,
    compression: CompressionType,
) -> Result<Vec<u8>, ProcessingError> {
    let mut buf = Vec::new();
    img.write_with_encoder(PngEncoder::new_with_quality(
        &mut buf,
        compression,
        FilterType::Adaptive,
    ))?;
    Ok(buf)
}

fn write_jpeg(img: &DynamicImage, target: &Path, quality: u8) -> Result<(), ProcessingError> {
    write_bytes(target, &encode_jpeg(img, quality)?)
}

fn write_png(
    img: &DynamicImage,
    target: &Path,
    compression: CompressionType,
) -> Result<(), ProcessingError> {
    write_bytes(target, &encode_png(img, compression)?)
}

fn write_bytes(target: &Path, bytes: &[u8]) -> Result<(), ProcessingError> {
    let mut out = BufWriter::new(File::create(target)?);
    out.write_all(bytes)?;
    out.flush()?;
    Ok(())
}
