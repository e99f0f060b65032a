use async_trait::async_trait;

use crate::error::ClientResult;
use crate::stream::TextStream;
use crate::types::{
    AnalysisRequest, AnalysisResult, DefectDocumentationRequest, Report, ReportKey, ReportQuery,
    ReportSummary, ReportUpdate,
};

/// Body of a defect documentation response
pub enum DefectBody {
    /// Text body consumed incrementally
    Streaming(TextStream),
    /// Body read in one piece
    Complete(String),
}

impl std::fmt::Debug for DefectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefectBody::Streaming(_) => f.write_str("DefectBody::Streaming(..)"),
            DefectBody::Complete(text) => f.debug_tuple("DefectBody::Complete").field(text).finish(),
        }
    }
}

/// Operations offered by the analysis/report service.
///
/// Flows depend on this trait rather than on the HTTP client so they can be
/// driven by mocks in tests.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ReportService: Send + Sync {
    /// Create or update the report for a ticket; the server decides which
    async fn submit_analysis(&self, request: &AnalysisRequest) -> ClientResult<AnalysisResult>;

    /// List report summaries. Malformed envelopes yield an empty list.
    async fn list_reports(&self, query: &ReportQuery) -> ClientResult<Vec<ReportSummary>>;

    async fn get_report(&self, key: &ReportKey) -> ClientResult<Report>;

    async fn update_report(&self, key: &ReportKey, update: &ReportUpdate) -> ClientResult<Report>;

    async fn delete_report(&self, key: &ReportKey) -> ClientResult<()>;

    /// Request a markdown write-up of a defect
    async fn document_defect(&self, request: &DefectDocumentationRequest) -> ClientResult<DefectBody>;
}
