//! Mock transform strategies for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::format::{CompressionLevel, FileFormat};
use crate::strategy::{CompressionStrategy, ConversionStrategy, ProcessingError, ProgressSink};

/// What a mock strategy does once it has reported its progress steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Write the output and return `Ok`.
    Succeed,
    /// Return a `ToolFailed` error with this reason.
    Fail(String),
    /// Panic inside the strategy.
    Panic,
}

/// A recorded strategy invocation for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedTransform {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Present for compressions.
    pub level: Option<CompressionLevel>,
    /// Bytes of the source at the time of the call.
    pub source_bytes: Vec<u8>,
}

/// Shared scripted behavior of both mock kinds.
#[derive(Debug, Clone)]
struct Script {
    name: String,
    steps: Arc<RwLock<Vec<u8>>>,
    step_delay: Arc<RwLock<Duration>>,
    outcome: Arc<RwLock<MockOutcome>>,
    calls: Arc<RwLock<Vec<RecordedTransform>>>,
}

impl Script {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Arc::new(RwLock::new(vec![20, 50, 100])),
            step_delay: Arc::new(RwLock::new(Duration::ZERO)),
            outcome: Arc::new(RwLock::new(MockOutcome::Succeed)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    async fn run(
        &self,
        source: &Path,
        target: &Path,
        level: Option<CompressionLevel>,
        progress: ProgressSink,
    ) -> Result<(), ProcessingError> {
        let source_bytes = tokio::fs::read(source).await?;
        self.calls.write().await.push(RecordedTransform {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            level,
            source_bytes: source_bytes.clone(),
        });

        let steps = self.steps.read().await.clone();
        let delay = *self.step_delay.read().await;
        let outcome = self.outcome.read().await.clone();

        for step in steps {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if step == 100 && outcome != MockOutcome::Succeed {
                break;
            }
            progress.report(step);
        }

        match outcome {
            MockOutcome::Succeed => {
                let mut output = format!("{}:", self.name).into_bytes();
                output.extend_from_slice(&source_bytes);
                tokio::fs::write(target, output).await?;
                Ok(())
            }
            MockOutcome::Fail(reason) => Err(ProcessingError::tool_failed(
                self.name.clone(),
                reason,
                None,
            )),
            MockOutcome::Panic => panic!("mock strategy {} panicked", self.name),
        }
    }
}

/// Mock implementation of [`ConversionStrategy`].
///
/// Provides controllable behavior for testing:
/// - Declare which format pairs it claims
/// - Script the progress values it reports
/// - Simulate failure, panic, or slow work
/// - Record every invocation
///
/// On success the output is the strategy name, a colon, then the source bytes.
#[derive(Debug, Clone)]
pub struct MockConversionStrategy {
    script: Script,
    pairs: Vec<(FileFormat, FileFormat)>,
}

impl MockConversionStrategy {
    pub fn new(name: &str) -> Self {
        Self {
            script: Script::new(name),
            pairs: Vec::new(),
        }
    }

    /// Claims `source` -> `target`.
    pub fn supporting(mut self, source: FileFormat, target: FileFormat) -> Self {
        self.pairs.push((source, target));
        self
    }

    /// Set the progress values reported in order.
    pub async fn set_progress_steps(&self, steps: Vec<u8>) {
        *self.script.steps.write().await = steps;
    }

    /// Set a pause before each progress step.
    pub async fn set_step_delay(&self, delay: Duration) {
        *self.script.step_delay.write().await = delay;
    }

    pub async fn set_outcome(&self, outcome: MockOutcome) {
        *self.script.outcome.write().await = outcome;
    }

    /// Get all recorded invocations.
    pub async fn recorded(&self) -> Vec<RecordedTransform> {
        self.script.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.script.calls.read().await.len()
    }
}

#[async_trait]
impl ConversionStrategy for MockConversionStrategy {
    fn name(&self) -> &str {
        &self.script.name
    }

    fn supports(&self, source: FileFormat, target: FileFormat) -> bool {
        self.pairs.contains(&(source, target))
    }

    async fn convert(
        &self,
        source: &Path,
        target: &Path,
        progress: ProgressSink,
    ) -> Result<(), ProcessingError> {
        self.script.run(source, target, None, progress).await
    }
}

/// Mock implementation of [`CompressionStrategy`].
#[derive(Debug, Clone)]
pub struct MockCompressionStrategy {
    script: Script,
    formats: Vec<FileFormat>,
}

impl MockCompressionStrategy {
    pub fn new(name: &str) -> Self {
        Self {
            script: Script::new(name),
            formats: Vec::new(),
        }
    }

    /// Claims files of `format`.
    pub fn supporting(mut self, format: FileFormat) -> Self {
        self.formats.push(format);
        self
    }

    /// Set the progress values reported in order.
    pub async fn set_progress_steps(&self, steps: Vec<u8>) {
        *self.script.steps.write().await = steps;
    }

    /// Set a pause before each progress step.
    pub async fn set_step_delay(&self, delay: Duration) {
        *self.script.step_delay.write().await = delay;
    }

    pub async fn set_outcome(&self, outcome: MockOutcome) {
        *self.script.outcome.write().await = outcome;
    }

    /// Get all recorded invocations.
    pub async fn recorded(&self) -> Vec<RecordedTransform> {
        self.script.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.script.calls.read().await.len()
    }
}

#[async_trait]
impl CompressionStrategy for MockCompressionStrategy {
    fn name(&self) -> &str {
        &self.script.name
    }

    fn supports(&self, format: FileFormat) -> bool {
        self.formats.contains(&format)
    }

    async fn compress(
        &self,
        source: &Path,
        target: &Path,
        level: CompressionLevel,
        progress: ProgressSink,
    ) -> Result<(), ProcessingError> {
        self.script.run(source, target, Some(level), progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mock_writes_tagged_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.jpg");
        let target = dir.path().join("a.png");
        std::fs::write(&source, b"pixels").unwrap();

        let mock = MockConversionStrategy::new("fake").supporting(FileFormat::Jpg, FileFormat::Png);
        let (sink, mut rx) = ProgressSink::channel();
        mock.convert(&source, &target, sink).await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"fake:pixels");
        assert_eq!(mock.call_count().await, 1);
        assert_eq!(rx.try_recv().unwrap(), 20);
    }

    #[tokio::test]
    async fn test_mock_failure_stops_short_of_100() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.pdf");
        std::fs::write(&source, b"pdf").unwrap();

        let mock = MockCompressionStrategy::new("fake").supporting(FileFormat::Pdf);
        mock.set_outcome(MockOutcome::Fail("bad input".into())).await;

        let (sink, mut rx) = ProgressSink::channel();
        let err = mock
            .compress(&source, &dir.path().join("b.pdf"), CompressionLevel::High, sink)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "fake failed: bad input");

        let mut seen = Vec::new();
        while let Ok(p) = rx.try_recv() {
            seen.push(p);
        }
        assert_eq!(seen, vec![20, 50]);
        assert_eq!(mock.recorded().await[0].level, Some(CompressionLevel::High));
    }
}
