//! A11y Insights client
//!
//! Typed access to the analysis and report service: submitting tickets for
//! accessibility analysis, browsing and editing stored reports, and
//! streaming defect documentation.

pub mod client;
pub mod config;
pub mod error;
pub mod service;
pub mod stream;
pub mod types;

pub use client::A11yClient;
pub use config::{ClientConfig, ClientConfigBuilder, Settings};
pub use error::{ClientError, ClientResult, GENERIC_RETRY_MESSAGE};
pub use service::{DefectBody, ReportService};
pub use stream::{decode_text_stream, TextStream, Utf8ChunkDecoder};
pub use types::*;

#[cfg(any(test, feature = "test-utils"))]
pub use service::MockReportService;
