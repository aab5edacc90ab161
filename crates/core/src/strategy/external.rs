//! Strategies that shell out to LibreOffice and Ghostscript.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use super::config::ToolsConfig;
use super::error::ProcessingError;
use super::traits::{CompressionStrategy, ConversionStrategy, ProgressSink};
use crate::format::{CompressionLevel, FileFormat};

/// Runs an external tool to completion, killing it when `limit` elapses.
pub(crate) async fn run_tool(
    tool: &str,
    program: &Path,
    args: &[OsString],
    limit: Duration,
) -> Result<(), ProcessingError> {
    debug!(tool, program = %program.display(), ?args, "Running external tool");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| map_spawn_error(tool, program, e))?;

    match tokio::time::timeout(limit, child.wait_with_output()).await {
        Err(_) => Err(ProcessingError::Timeout {
            timeout_secs: limit.as_secs(),
        }),
        Ok(Err(e)) => Err(ProcessingError::Io(e)),
        Ok(Ok(output)) if output.status.success() => Ok(()),
        Ok(Ok(output)) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            Err(ProcessingError::tool_failed(
                tool,
                format!("exited with code {:?}", output.status.code()),
                (!stderr.trim().is_empty()).then_some(stderr),
            ))
        }
    }
}

fn map_spawn_error(tool: &str, program: &Path, e: std::io::Error) -> ProcessingError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ProcessingError::ToolNotFound {
            tool: tool.to_string(),
            path: program.to_path_buf(),
        }
    } else {
        ProcessingError::Io(e)
    }
}

/// Checks that a tool binary can be launched.
async fn probe_tool(tool: &str, program: &Path) -> Result<(), ProcessingError> {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map(|_| ())
        .map_err(|e| map_spawn_error(tool, program, e))
}

/// Returns `path` if it holds a non-empty file.
pub(crate) fn ensure_output(path: &Path) -> Result<(), ProcessingError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(ProcessingError::MissingOutput {
            path: path.to_path_buf(),
        }),
    }
}

/// Converts between DOCX and PDF with a headless LibreOffice.
///
/// Each run gets a private profile directory so concurrent conversions do
/// not fight over the user installation lock.
pub struct OfficeConverter {
    config: ToolsConfig,
}

impl OfficeConverter {
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    fn build_args(
        &self,
        source: &Path,
        target: FileFormat,
        work_dir: &Path,
    ) -> Vec<OsString> {
        let mut profile = OsString::from("-env:UserInstallation=file://");
        profile.push(work_dir.join("profile"));

        let mut args = vec![profile, "--headless".into(), "--norestore".into()];
        if target == FileFormat::Docx {
            args.push("--infilter=writer_pdf_import".into());
            args.push("--convert-to".into());
            args.push("docx:MS Word 2007 XML".into());
        } else {
            args.push("--convert-to".into());
            args.push(target.extension().into());
        }
        args.push("--outdir".into());
        args.push(work_dir.join("out").into_os_string());
        args.push(source.as_os_str().to_os_string());
        args
    }
}

#[async_trait]
impl ConversionStrategy for OfficeConverter {
    fn name(&self) -> &str {
        "libreoffice"
    }

    fn supports(&self, source: FileFormat, target: FileFormat) -> bool {
        matches!(
            (source, target),
            (FileFormat::Docx, FileFormat::Pdf) | (FileFormat::Pdf, FileFormat::Docx)
        )
    }

    async fn convert(
        &self,
        source: &Path,
        target: &Path,
        progress: ProgressSink,
    ) -> Result<(), ProcessingError> {
        let target_format = FileFormat::from_file_name(&target.to_string_lossy())
            .ok_or_else(|| ProcessingError::Unsupported {
                reason: format!("unknown target format: {}", target.display()),
            })?;

        let work_dir = tempfile::Builder::new()
            .prefix("docforge-office-")
            .tempdir()?;
        progress.report(20);

        let args = self.build_args(source, target_format, work_dir.path());
        run_tool(
            "soffice",
            &self.config.soffice_path,
            &args,
            self.config.timeout(),
        )
        .await?;
        progress.report(60);

        let produced = office_output_path(source, target_format, &work_dir.path().join("out"));
        ensure_output(&produced)?;
        tokio::fs::copy(&produced, target).await?;

        info!(
            source = %source.display(),
            target = %target.display(),
            "Office conversion finished"
        );
        progress.report(100);
        Ok(())
    }

    async fn validate(&self) -> Result<(), ProcessingError> {
        probe_tool("soffice", &self.config.soffice_path).await
    }
}

/// LibreOffice names its output after the input stem.
fn office_output_path(source: &Path, target: FileFormat, out_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "output".into());
    let mut name = stem;
    name.push(".");
    name.push(target.extension());
    out_dir.join(name)
}

/// Recompresses PDFs through Ghostscript's pdfwrite device.
pub struct PdfCompressor {
    config: ToolsConfig,
}

impl PdfCompressor {
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    fn pdf_settings(level: CompressionLevel) -> &'static str {
        match level {
            CompressionLevel::High => "/screen",
            CompressionLevel::Medium => "/ebook",
            CompressionLevel::Low => "/printer",
        }
    }

    fn build_args(&self, source: &Path, target: &Path, level: CompressionLevel) -> Vec<OsString> {
        let mut output = OsString::from("-sOutputFile=");
        output.push(target);

        vec![
            "-sDEVICE=pdfwrite".into(),
            "-dCompatibilityLevel=1.4".into(),
            format!("-dPDFSETTINGS={}", Self::pdf_settings(level)).into(),
            "-dNOPAUSE".into(),
            "-dQUIET".into(),
            "-dBATCH".into(),
            output,
            source.as_os_str().to_os_string(),
        ]
    }
}

#[async_trait]
impl CompressionStrategy for PdfCompressor {
    fn name(&self) -> &str {
        "ghostscript"
    }

    fn supports(&self, format: FileFormat) -> bool {
        format == FileFormat::Pdf
    }

    async fn compress(
        &self,
        source: &Path,
        target: &Path,
        level: CompressionLevel,
        progress: ProgressSink,
    ) -> Result<(), ProcessingError> {
        progress.report(20);
        let args = self.build_args(source, target, level);
        run_tool(
            "ghostscript",
            &self.config.ghostscript_path,
            &args,
            self.config.timeout(),
        )
        .await?;
        progress.report(90);
        ensure_output(target)?;
        progress.report(100);
        Ok(())
    }

    async fn validate(&self) -> Result<(), ProcessingError> {
        probe_tool("ghostscript", &self.config.ghostscript_path).await
    }
}
