//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the router over a real
//! orchestrator with mock strategies injected, so the HTTP layer can be
//! exercised without image codecs or external tools.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use docforge_core::{
    testing::{MockCompressionStrategy, MockConversionStrategy},
    Config, FileFormat, JobOrchestrator, ProgressTracker, StorageConfig, StorageManager,
    StrategyRegistry,
};
use docforge_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use docforge_core::testing::fixtures;

pub const BOUNDARY: &str = "docforge-test-boundary";

/// Test fixture for API testing with mock strategies.
///
/// Registered mocks:
/// - `image`: jpg -> png and png -> jpg conversion
/// - `office`: docx -> pdf conversion
/// - `compress`: pdf, jpg and png compression
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub state: Arc<AppState>,
    pub image: MockConversionStrategy,
    pub office: MockConversionStrategy,
    pub compressor: MockCompressionStrategy,
    /// Holds the storage roots
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// One part of a multipart form.
pub enum Part<'a> {
    File { name: &'a str, data: &'a [u8] },
    Text { field: &'a str, value: &'a str },
}

/// Encodes a multipart/form-data body with [`BOUNDARY`].
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File { name, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { field, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        field, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

impl TestFixture {
    /// Create a new test fixture with default settings.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Create a test fixture over `config`; storage roots are always
    /// redirected into a temp dir.
    pub async fn with_config(mut config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        config.storage = StorageConfig {
            originals_dir: temp_dir.path().join("originals"),
            processed_dir: temp_dir.path().join("processed"),
            ..config.storage
        };

        let image = MockConversionStrategy::new("image")
            .supporting(FileFormat::Jpg, FileFormat::Png)
            .supporting(FileFormat::Png, FileFormat::Jpg);
        let office = MockConversionStrategy::new("office")
            .supporting(FileFormat::Docx, FileFormat::Pdf);
        let compressor = MockCompressionStrategy::new("compress")
            .supporting(FileFormat::Pdf)
            .supporting(FileFormat::Jpg)
            .supporting(FileFormat::Png);

        let registry = StrategyRegistry::new()
            .with_conversion(Arc::new(image.clone()))
            .with_conversion(Arc::new(office.clone()))
            .with_compression(Arc::new(compressor.clone()));

        let storage = StorageManager::init(&config.storage)
            .await
            .expect("Failed to init storage");
        let orchestrator = JobOrchestrator::new(
            Arc::new(storage),
            Arc::new(registry),
            Arc::new(ProgressTracker::new()),
            &config.jobs,
            &config.upload,
        );

        let state = Arc::new(AppState::new(config, Arc::new(orchestrator)));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            image,
            office,
            compressor,
            temp_dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            bytes,
        }
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST a multipart form
    pub async fn post_form(&self, path: &str, parts: &[Part<'_>]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    /// Poll the status endpoint until the job is terminal.
    pub async fn wait_for_terminal(&self, job_id: &str) -> Value {
        for _ in 0..300 {
            let response = self.get(&format!("/api/v1/status/{}", job_id)).await;
            if response.status == StatusCode::OK {
                let body = response.json();
                if body["status"] == "COMPLETED" || body["status"] == "FAILED" {
                    return body;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Job {} never finished", job_id);
    }
}
