//! Request validation performed before a job is created.

use thiserror::Error;

use crate::format::{CompressionLevel, FileFormat, MAX_COMPRESSION_LEVEL, MIN_COMPRESSION_LEVEL};

/// A file received from a caller.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name as supplied by the caller. Untrusted.
    pub file_name: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }
}

/// Raw conversion submission.
#[derive(Debug, Clone, Default)]
pub struct ConversionRequest {
    pub file: Option<UploadedFile>,
    pub target_format: Option<String>,
}

/// Raw compression submission.
#[derive(Debug, Clone, Default)]
pub struct CompressionRequest {
    pub file: Option<UploadedFile>,
    pub compression_level: Option<i64>,
}

/// A conversion request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidConversion {
    pub file: UploadedFile,
    pub source: FileFormat,
    pub target: FileFormat,
}

/// A compression request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidCompression {
    pub file: UploadedFile,
    pub format: FileFormat,
    /// Level value in `[MIN_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL]`.
    pub level_value: u8,
    pub level: CompressionLevel,
}

/// Malformed submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("File is required for {operation}.")]
    MissingFile { operation: &'static str },

    #[error("Invalid file name.")]
    MissingFileName,

    #[error("Target format is required for conversion.")]
    MissingTargetFormat,

    #[error("Invalid target format: {0}")]
    InvalidTargetFormat(String),

    #[error("Invalid source file format: {0}")]
    InvalidSourceFormat(String),

    #[error("Compression level is required.")]
    MissingCompressionLevel,

    #[error("Compression level must be between {min} and {max}, got {value}.")]
    CompressionLevelOutOfRange { value: i64, min: i64, max: i64 },

    #[error("File size {size} exceeds the maximum of {max} bytes.")]
    FileTooLarge { size: u64, max: u64 },
}

/// Checks submissions against format and size rules.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    max_file_size: u64,
}

impl RequestValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn validate_conversion(
        &self,
        request: ConversionRequest,
    ) -> Result<ValidConversion, ValidationError> {
        let file = self.check_file(request.file, "conversion")?;

        let target = request
            .target_format
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingTargetFormat)?;
        let target = target
            .parse::<FileFormat>()
            .map_err(|e| ValidationError::InvalidTargetFormat(e.0))?;

        let source = source_format(&file.file_name)?;
        Ok(ValidConversion {
            file,
            source,
            target,
        })
    }

    pub fn validate_compression(
        &self,
        request: CompressionRequest,
    ) -> Result<ValidCompression, ValidationError> {
        let file = self.check_file(request.file, "compression")?;

        let value = request
            .compression_level
            .ok_or(ValidationError::MissingCompressionLevel)?;
        if !(MIN_COMPRESSION_LEVEL..=MAX_COMPRESSION_LEVEL).contains(&value) {
            return Err(ValidationError::CompressionLevelOutOfRange {
                value,
                min: MIN_COMPRESSION_LEVEL,
                max: MAX_COMPRESSION_LEVEL,
            });
        }
        let level_value = value as u8;

        let format = source_format(&file.file_name)?;
        Ok(ValidCompression {
            file,
            format,
            level_value,
            level: CompressionLevel::from_value(level_value),
        })
    }

    fn check_file(
        &self,
        file: Option<UploadedFile>,
        operation: &'static str,
    ) -> Result<UploadedFile, ValidationError> {
        let file = file
            .filter(|f| !f.data.is_empty())
            .ok_or(ValidationError::MissingFile { operation })?;

        let size = file.data.len() as u64;
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        if file.file_name.trim().is_empty() {
            return Err(ValidationError::MissingFileName);
        }
        Ok(file)
    }
}

fn source_format(file_name: &str) -> Result<FileFormat, ValidationError> {
    let ext = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    FileFormat::from_extension(ext)
        .ok_or_else(|| ValidationError::InvalidSourceFormat(ext.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> RequestValidator {
        RequestValidator::new(1024)
    }

    fn conversion(name: &str, target: Option<&str>) -> ConversionRequest {
        ConversionRequest {
            file: Some(UploadedFile::new(name, b"data".to_vec())),
            target_format: target.map(String::from),
        }
    }

    fn compression(name: &str, level: Option<i64>) -> CompressionRequest {
        CompressionRequest {
            file: Some(UploadedFile::new(name, b"data".to_vec())),
            compression_level: level,
        }
    }

    #[test]
    fn test_valid_conversion() {
        let valid = validator()
            .validate_conversion(conversion("Report.DOCX", Some("PDF")))
            .unwrap();
        assert_eq!(valid.source, FileFormat::Docx);
        assert_eq!(valid.target, FileFormat::Pdf);
    }

    #[test]
    fn test_conversion_rejections() {
        let v = validator();
        assert_eq!(
            v.validate_conversion(ConversionRequest::default()).unwrap_err(),
            ValidationError::MissingFile {
                operation: "conversion"
            }
        );
        assert_eq!(
            v.validate_conversion(conversion("a.png", None)).unwrap_err(),
            ValidationError::MissingTargetFormat
        );
        assert_eq!(
            v.validate_conversion(conversion("a.png", Some("  "))).unwrap_err(),
            ValidationError::MissingTargetFormat
        );
        assert_eq!(
            v.validate_conversion(conversion("a.png", Some("xyz"))).unwrap_err(),
            ValidationError::InvalidTargetFormat("xyz".into())
        );
        assert_eq!(
            v.validate_conversion(conversion("notes.txt", Some("pdf"))).unwrap_err(),
            ValidationError::InvalidSourceFormat("txt".into())
        );
        assert_eq!(
            v.validate_conversion(conversion("README", Some("pdf"))).unwrap_err(),
            ValidationError::InvalidSourceFormat("".into())
        );
        assert_eq!(
            v.validate_conversion(conversion("", Some("pdf"))).unwrap_err(),
            ValidationError::MissingFileName
        );
    }

    #[test]
    fn test_empty_and_oversized_files() {
        let v = validator();
        let empty = ConversionRequest {
            file: Some(UploadedFile::new("a.png", Vec::new())),
            target_format: Some("jpg".into()),
        };
        assert!(matches!(
            v.validate_conversion(empty),
            Err(ValidationError::MissingFile { .. })
        ));

        let big = CompressionRequest {
            file: Some(UploadedFile::new("a.png", vec![0u8; 2048])),
            compression_level: Some(50),
        };
        assert_eq!(
            v.validate_compression(big).unwrap_err(),
            ValidationError::FileTooLarge {
                size: 2048,
                max: 1024
            }
        );
    }

    #[test]
    fn test_compression_level_bounds() {
        let v = validator();
        for bad in [-5, 0, 101] {
            assert!(matches!(
                v.validate_compression(compression("a.jpg", Some(bad))),
                Err(ValidationError::CompressionLevelOutOfRange { .. })
            ));
        }
        assert_eq!(
            v.validate_compression(compression("a.jpg", None)).unwrap_err(),
            ValidationError::MissingCompressionLevel
        );

        let low = v.validate_compression(compression("a.jpg", Some(1))).unwrap();
        assert_eq!(low.level, CompressionLevel::High);
        let high = v.validate_compression(compression("a.pdf", Some(100))).unwrap();
        assert_eq!(high.level, CompressionLevel::Low);
        assert_eq!(high.format, FileFormat::Pdf);
        assert_eq!(high.level_value, 100);
    }
}
