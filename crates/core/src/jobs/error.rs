//! Errors returned synchronously by job submission.

use thiserror::Error;

use super::validation::ValidationError;
use crate::format::FileFormat;
use crate::storage::StorageError;

/// Why a submission was refused. No job exists when one of these is returned.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No strategy handles the requested formats.
    #[error("Unsupported operation: {description}")]
    Unsupported { description: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl JobError {
    pub fn unsupported_conversion(source: FileFormat, target: FileFormat) -> Self {
        Self::Unsupported {
            description: format!("conversion from {} to {}", source, target),
        }
    }

    pub fn unsupported_compression(format: FileFormat) -> Self {
        Self::Unsupported {
            description: format!("compression of {}", format),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unsupported { .. } => "UNSUPPORTED_OPERATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_messages() {
        let err = JobError::from(ValidationError::MissingTargetFormat);
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.to_string(), "Target format is required for conversion.");

        let err = JobError::unsupported_conversion(FileFormat::Png, FileFormat::Docx);
        assert_eq!(err.code(), "UNSUPPORTED_OPERATION");
        assert_eq!(
            err.to_string(),
            "Unsupported operation: conversion from png to docx"
        );

        let err = JobError::from(StorageError::PathViolation {
            name: "../x".into(),
        });
        assert_eq!(err.code(), "STORAGE_ERROR");
    }
}
