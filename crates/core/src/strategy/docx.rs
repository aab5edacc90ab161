//! DOCX compression by re-encoding embedded media.
//!
//! A DOCX file is a zip container. Pictures live under `word/media/`; every
//! JPEG or PNG found there is decoded and written back as a lower quality
//! JPEG. Everything else in the container is copied through untouched.

use async_trait::async_trait;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::error::ProcessingError;
use super::raster::encode_jpeg;
use super::traits::{CompressionStrategy, ProgressSink};
use crate::format::{CompressionLevel, FileFormat};

const MEDIA_PREFIX: &str = "word/media/";

/// Compresses the pictures embedded in a DOCX document.
#[derive(Debug, Default, Clone)]
pub struct DocxCompressor;

impl DocxCompressor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompressionStrategy for DocxCompressor {
    fn name(&self) -> &str {
        "docx-media"
    }

    fn supports(&self, format: FileFormat) -> bool {
        format == FileFormat::Docx
    }

    async fn compress(
        &self,
        source: &Path,
        target: &Path,
        level: CompressionLevel,
        progress: ProgressSink,
    ) -> Result<(), ProcessingError> {
        let source = source.to_path_buf();
        let target = target.to_path_buf();
        tokio::task::spawn_blocking(move || rewrite_docx(&source, &target, level, &progress))
            .await
            .map_err(|e| ProcessingError::Aborted {
                reason: e.to_string(),
            })?
    }
}

fn is_picture(name: &str) -> bool {
    if !name.starts_with(MEDIA_PREFIX) {
        return false;
    }
    matches!(
        FileFormat::from_file_name(name),
        Some(FileFormat::Jpg) | Some(FileFormat::Png)
    )
}

fn rewrite_docx(
    source: &Path,
    target: &Path,
    level: CompressionLevel,
    progress: &ProgressSink,
) -> Result<(), ProcessingError> {
    progress.report(20);

    let mut archive = ZipArchive::new(BufReader::new(File::open(source)?))?;
    let mut writer = ZipWriter::new(BufWriter::new(File::create(target)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let pictures = archive.file_names().filter(|n| is_picture(n)).count();
    let mut done = 0;
    let mut saved: u64 = 0;

    for i in 0..archive.len() {
        let name = archive.by_index_raw(i)?.name().to_string();

        if !is_picture(&name) {
            let entry = archive.by_index_raw(i)?;
            writer.raw_copy_file(entry)?;
            continue;
        }

        let mut original = Vec::new();
        archive.by_index(i)?.read_to_end(&mut original)?;
        let bytes = match recompress(&original, level) {
            Ok(smaller) if smaller.len() < original.len() => {
                saved += (original.len() - smaller.len()) as u64;
                smaller
            }
            Ok(_) => original,
            Err(e) => {
                warn!(entry = %name, error = %e, "Keeping picture that failed to re-encode");
                original
            }
        };

        writer.start_file(name, options)?;
        std::io::Write::write_all(&mut writer, &bytes)?;

        done += 1;
        progress.report_fraction(20, 60, done, pictures);
    }

    writer.finish()?;
    debug!(pictures, saved_bytes = saved, "DOCX media recompressed");
    progress.report(100);
    Ok(())
}

/// Re-encodes a picture as JPEG at the level's quality.
///
/// The entry keeps its name, so a PNG picture ends up holding JPEG data.
/// Word sniffs picture content and renders it regardless.
fn recompress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>, ProcessingError> {
    let img = image::load_from_memory(data)?;
    encode_jpeg(&img, level.jpeg_quality())
}
