//! Ordered lookup of conversion and compression strategies.

use std::sync::Arc;

use super::config::ToolsConfig;
use super::docx::DocxCompressor;
use super::external::{OfficeConverter, PdfCompressor};
use super::raster::{ImageCompressor, ImageFormatConverter};
use super::traits::{CompressionStrategy, ConversionStrategy};
use crate::format::FileFormat;

/// Holds the registered strategies in registration order.
///
/// Resolution returns the first strategy that supports the request, so the
/// same request always resolves to the same strategy.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    conversions: Vec<Arc<dyn ConversionStrategy>>,
    compressions: Vec<Arc<dyn CompressionStrategy>>,
}

impl StrategyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in strategies.
    pub fn with_defaults(tools: &ToolsConfig) -> Self {
        Self::new()
            .with_conversion(Arc::new(ImageFormatConverter::new()))
            .with_conversion(Arc::new(OfficeConverter::new(tools.clone())))
            .with_compression(Arc::new(ImageCompressor::new()))
            .with_compression(Arc::new(DocxCompressor::new()))
            .with_compression(Arc::new(PdfCompressor::new(tools.clone())))
    }

    /// Appends a conversion strategy.
    pub fn with_conversion(mut self, strategy: Arc<dyn ConversionStrategy>) -> Self {
        self.conversions.push(strategy);
        self
    }

    /// Appends a compression strategy.
    pub fn with_compression(mut self, strategy: Arc<dyn CompressionStrategy>) -> Self {
        self.compressions.push(strategy);
        self
    }

    pub fn resolve_conversion(
        &self,
        source: FileFormat,
        target: FileFormat,
    ) -> Option<Arc<dyn ConversionStrategy>> {
        self.conversions
            .iter()
            .find(|s| s.supports(source, target))
            .cloned()
    }

    pub fn resolve_compression(&self, format: FileFormat) -> Option<Arc<dyn CompressionStrategy>> {
        self.compressions
            .iter()
            .find(|s| s.supports(format))
            .cloned()
    }

    /// Names of registered conversion strategies, in order.
    pub fn conversion_names(&self) -> Vec<String> {
        self.conversions.iter().map(|s| s.name().to_string()).collect()
    }

    /// Names of registered compression strategies, in order.
    pub fn compression_names(&self) -> Vec<String> {
        self.compressions.iter().map(|s| s.name().to_string()).collect()
    }

    /// Runs `validate()` on every strategy, returning failures by name.
    pub async fn validate_all(&self) -> Vec<(String, String)> {
        let mut failures = Vec::new();
        for s in &self.conversions {
            if let Err(e) = s.validate().await {
                failures.push((s.name().to_string(), e.to_string()));
            }
        }
        for s in &self.compressions {
            if let Err(e) = s.validate().await {
                failures.push((s.name().to_string(), e.to_string()));
            }
        }
        failures
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("conversions", &self.conversion_names())
            .field("compressions", &self.compression_names())
            .finish()
    }
}
