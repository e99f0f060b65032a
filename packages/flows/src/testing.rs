//! Service double whose reads wait until the test releases them

use a11y_client::{
    AnalysisRequest, AnalysisResult, ClientError, ClientResult, DefectBody,
    DefectDocumentationRequest, Report, ReportKey, ReportQuery, ReportService, ReportSummary,
    ReportUpdate,
};
use async_trait::async_trait;
use tokio::sync::Notify;

pub struct GatedService {
    report: Option<Report>,
    listing: Vec<ReportSummary>,
    /// Signalled once per read as it starts waiting
    pub entered: Notify,
    /// One permit lets one read return
    pub release: Notify,
}

impl GatedService {
    pub fn serving_report(report: Report) -> Self {
        Self::new(Some(report), Vec::new())
    }

    pub fn serving_listing(listing: Vec<ReportSummary>) -> Self {
        Self::new(None, listing)
    }

    fn new(report: Option<Report>, listing: Vec<ReportSummary>) -> Self {
        Self {
            report,
            listing,
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    async fn gate(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[async_trait]
impl ReportService for GatedService {
    async fn submit_analysis(&self, _request: &AnalysisRequest) -> ClientResult<AnalysisResult> {
        Err(ClientError::Transport("not served".to_string()))
    }

    async fn list_reports(&self, _query: &ReportQuery) -> ClientResult<Vec<ReportSummary>> {
        self.gate().await;
        Ok(self.listing.clone())
    }

    async fn get_report(&self, key: &ReportKey) -> ClientResult<Report> {
        self.gate().await;
        self.report
            .clone()
            .ok_or_else(|| ClientError::NotFound(key.ticket_id.clone()))
    }

    async fn update_report(&self, _key: &ReportKey, _update: &ReportUpdate) -> ClientResult<Report> {
        Err(ClientError::Transport("not served".to_string()))
    }

    async fn delete_report(&self, _key: &ReportKey) -> ClientResult<()> {
        Ok(())
    }

    async fn document_defect(&self, _request: &DefectDocumentationRequest) -> ClientResult<DefectBody> {
        Err(ClientError::Transport("not served".to_string()))
    }
}
