use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::service::{DefectBody, ReportService};
use crate::stream::decode_text_stream;
use crate::types::{
    AnalysisRequest, AnalysisResult, DefectDocumentationRequest, Report, ReportKey, ReportQuery,
    ReportSummary, ReportUpdate,
};

const ANALYZE_PATH: &str = "/v5/analyze";
const REPORTS_PATH: &str = "/v5/reports";
const DOCUMENT_DEFECTS_PATH: &str = "/v4/document-defects";
const MARKDOWN_ACCEPT: &str = "text/markdown, text/plain, */*";

/// HTTP client for the A11y Insights service
#[derive(Clone)]
pub struct A11yClient {
    http_client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl A11yClient {
    /// Create a new client from a validated configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url().to_string(),
            api_token: config.api_token.clone(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if a bearer token will be attached
    pub fn is_authenticated(&self) -> bool {
        self.api_token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn report_url(&self, ticket_id: &str) -> String {
        format!("{}{}/{}", self.base_url, REPORTS_PATH, ticket_id)
    }

    /// Attach the bearer token when one is configured
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn with_platform(request: RequestBuilder, key: &ReportKey) -> RequestBuilder {
        match &key.platform {
            Some(platform) => request.query(&[("platform", platform)]),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ClientResult<Response> {
        self.authorize(request).send().await.map_err(|e| {
            if e.is_timeout() {
                error!("Request to A11y Insights timed out: {}", e);
            } else if e.is_connect() {
                error!("Failed to connect to A11y Insights: {}", e);
            } else {
                error!("A11y Insights request failed: {}", e);
            }
            ClientError::Transport(e.to_string())
        })
    }

    /// Turn a non-success response into an error, reading the body for details
    async fn error_from(response: Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_status(status, &body);
        warn!("A11y Insights returned {}: {}", status, err);
        err
    }

    /// Extract the `reports` array from a listing envelope
    ///
    /// Entries that fail to parse are skipped; the rest are still listed.
    pub fn reports_from_envelope(mut payload: Value) -> Vec<ReportSummary> {
        let Some(Value::Array(entries)) = payload.get_mut("reports").map(Value::take) else {
            warn!("Report listing had no `reports` array, treating as empty");
            return Vec::new();
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(n, entry)| match serde_json::from_value::<ReportSummary>(entry) {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!("Skipping malformed report listing entry {}: {}", n, e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl ReportService for A11yClient {
    async fn submit_analysis(&self, request: &AnalysisRequest) -> ClientResult<AnalysisResult> {
        info!("Submitting analysis to {}", ANALYZE_PATH);

        let response = self
            .send(self.http_client.post(self.url(ANALYZE_PATH)).json(request))
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let result: AnalysisResult = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        info!("Analysis finished for {}", result.ticket_id);
        Ok(result)
    }

    async fn list_reports(&self, query: &ReportQuery) -> ClientResult<Vec<ReportSummary>> {
        let request = self.http_client.get(self.url(REPORTS_PATH)).query(&[
            ("platform", query.platform.clone()),
            ("skip", query.skip.to_string()),
            ("limit", query.limit.to_string()),
        ]);

        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let text = response.text().await?;
        let reports = match serde_json::from_str::<Value>(&text) {
            Ok(payload) => Self::reports_from_envelope(payload),
            Err(e) => {
                warn!("Report listing was not JSON, treating as empty: {}", e);
                Vec::new()
            }
        };

        debug!("Listed {} reports for platform {}", reports.len(), query.platform);
        Ok(reports)
    }

    async fn get_report(&self, key: &ReportKey) -> ClientResult<Report> {
        let request = Self::with_platform(self.http_client.get(self.report_url(&key.ticket_id)), key);
        let response = self.send(request).await?;

        if !response.status().is_success() {
            warn!(
                "Fetching report {} failed with {}",
                key.ticket_id,
                response.status()
            );
            return Err(ClientError::NotFound(key.ticket_id.clone()));
        }

        response
            .json::<Report>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    async fn update_report(&self, key: &ReportKey, update: &ReportUpdate) -> ClientResult<Report> {
        info!("Updating report {}", key.ticket_id);

        let request = Self::with_platform(
            self.http_client.put(self.report_url(&key.ticket_id)).json(update),
            key,
        );
        let response = self.send(request).await?;

        match response.status() {
            status if status.is_success() => response
                .json::<Report>()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string())),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(key.ticket_id.clone())),
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn delete_report(&self, key: &ReportKey) -> ClientResult<()> {
        info!("Deleting report {}", key.ticket_id);

        let request = Self::with_platform(self.http_client.delete(self.report_url(&key.ticket_id)), key);
        let response = self.send(request).await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(key.ticket_id.clone())),
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn document_defect(&self, request: &DefectDocumentationRequest) -> ClientResult<DefectBody> {
        info!(
            "Requesting defect documentation for {} on {}",
            request.page_or_screen, request.platform
        );

        let response = self
            .send(
                self.http_client
                    .post(self.url(DOCUMENT_DEFECTS_PATH))
                    .header(header::ACCEPT, MARKDOWN_ACCEPT)
                    .json(request),
            )
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let streamable = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/"))
            .unwrap_or(false);

        if streamable {
            debug!("Consuming defect documentation as a stream");
            Ok(DefectBody::Streaming(decode_text_stream(response.bytes_stream())))
        } else {
            debug!("Reading defect documentation in one piece");
            Ok(DefectBody::Complete(response.text().await?))
        }
    }
}
