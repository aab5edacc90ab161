//! Testing utilities and mock implementations.
//!
//! The mocks implement the strategy traits with scripted behavior so the
//! orchestrator and HTTP layer can be exercised without real codecs or
//! external tools.
//!
//! # Example
//!
//! ```rust,ignore
//! use docforge_core::testing::{MockCompressionStrategy, MockOutcome};
//!
//! let pdf = MockCompressionStrategy::new("pdf").supporting(FileFormat::Pdf);
//! pdf.set_outcome(MockOutcome::Fail("corrupt".into())).await;
//!
//! let registry = StrategyRegistry::new().with_compression(Arc::new(pdf.clone()));
//! ```

mod mock_strategy;

pub use mock_strategy::{
    MockCompressionStrategy, MockConversionStrategy, MockOutcome, RecordedTransform,
};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::jobs::UploadedFile;

    /// An upload with a fixed body.
    pub fn upload(name: &str) -> UploadedFile {
        UploadedFile::new(name, format!("contents of {}", name).into_bytes())
    }
}
