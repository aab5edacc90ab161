//! Trait definitions for transform strategies.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::error::ProcessingError;
use crate::format::{CompressionLevel, FileFormat};

/// Sink a strategy reports its progress (0-100) into.
///
/// Reports are clamped to 100 and only forwarded when they move forward, so
/// the receiving side always sees a non-decreasing sequence. Reporting never
/// blocks; if the receiver is gone the value is dropped and the strategy
/// carries on.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<u8>,
    last: Arc<AtomicU8>,
}

impl ProgressSink {
    /// Creates a sink and the receiver its reports arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<u8>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                last: Arc::new(AtomicU8::new(0)),
            },
            rx,
        )
    }

    /// Reports a new completion percentage.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.last.fetch_max(percent, Ordering::SeqCst);
        if percent > previous {
            let _ = self.tx.send(percent);
        }
    }

    /// Reports `base + span * done / total`, for per-item loops.
    pub fn report_fraction(&self, base: u8, span: u8, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        let step = (span as usize * done.min(total)) / total;
        self.report(base.saturating_add(step as u8));
    }

    /// Last value reported.
    pub fn last(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }
}

/// A strategy that converts one format into another.
///
/// Implementations are stateless with respect to jobs and may be invoked
/// concurrently. They must not keep references to the paths after returning.
#[async_trait]
pub trait ConversionStrategy: Send + Sync {
    /// Returns the name of this strategy.
    fn name(&self) -> &str;

    /// Whether this strategy handles `source` -> `target`.
    fn supports(&self, source: FileFormat, target: FileFormat) -> bool;

    /// Converts `source` into `target`, overwriting the placeholder there.
    async fn convert(
        &self,
        source: &Path,
        target: &Path,
        progress: ProgressSink,
    ) -> Result<(), ProcessingError>;

    /// Validates that the strategy is properly configured and ready.
    async fn validate(&self) -> Result<(), ProcessingError> {
        Ok(())
    }
}

/// A strategy that re-encodes a file in its own format at a smaller size.
#[async_trait]
pub trait CompressionStrategy: Send + Sync {
    /// Returns the name of this strategy.
    fn name(&self) -> &str;

    /// Whether this strategy handles files of `format`.
    fn supports(&self, format: FileFormat) -> bool;

    /// Compresses `source` into `target` at the given level.
    async fn compress(
        &self,
        source: &Path,
        target: &Path,
        level: CompressionLevel,
        progress: ProgressSink,
    ) -> Result<(), ProcessingError>;

    /// Validates that the strategy is properly configured and ready.
    async fn validate(&self) -> Result<(), ProcessingError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_forwards_only_forward_progress() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.report(20);
        sink.report(10);
        sink.report(20);
        sink.report(50);
        sink.report(250);

        let mut seen = Vec::new();
        while let Ok(p) = rx.try_recv() {
            seen.push(p);
        }
        assert_eq!(seen, vec![20, 50, 100]);
        assert_eq!(sink.last(), 100);
    }

    #[test]
    fn test_sink_survives_dropped_receiver() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        sink.report(40);
        assert_eq!(sink.last(), 40);
    }

    #[test]
    fn test_report_fraction() {
        let (sink, mut rx) = ProgressSink::channel();
        sink.report_fraction(20, 60, 1, 3);
        sink.report_fraction(20, 60, 3, 3);
        sink.report_fraction(20, 60, 1, 0);
        assert_eq!(rx.try_recv().unwrap(), 40);
        assert_eq!(rx.try_recv().unwrap(), 80);
        assert!(rx.try_recv().is_err());
    }
}
