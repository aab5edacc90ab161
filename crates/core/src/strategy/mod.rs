//! Transform strategies and their registry.
//!
//! A strategy turns a stored original into a processed artifact, reporting
//! progress through a [`ProgressSink`] as it goes:
//!
//! - [`ImageFormatConverter`] converts JPEG <-> PNG in process.
//! - [`OfficeConverter`] converts DOCX <-> PDF through LibreOffice.
//! - [`ImageCompressor`] and [`DocxCompressor`] re-encode pictures.
//! - [`PdfCompressor`] rewrites PDFs through Ghostscript.

mod config;
mod docx;
mod error;
mod external;
mod raster;
mod registry;
mod traits;

pub use config::ToolsConfig;
pub use docx::DocxCompressor;
pub use error::ProcessingError;
pub use external::{OfficeConverter, PdfCompressor};
pub use raster::{ImageCompressor, ImageFormatConverter};
pub use registry::StrategyRegistry;
pub use traits::{CompressionStrategy, ConversionStrategy, ProgressSink};
