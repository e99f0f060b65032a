// ABOUTME: Streaming defect documentation flow
// ABOUTME: Folds streamed markdown into a growing document and offers it as a .md artifact

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use a11y_client::{ClientResult, DefectBody, DefectDocumentationRequest, ReportService};
use futures::stream::{Stream, StreamExt};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info};

use crate::error::{FlowError, FlowResult};
use crate::export::file_stem;
use crate::guard::{BusyFlag, Generation};

/// Form backing a defect documentation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefectForm {
    pub platform: String,
    pub page_or_screen: String,
    pub defects: String,
}

impl Default for DefectForm {
    fn default() -> Self {
        Self {
            platform: "Android/TalkBack".to_string(),
            page_or_screen: "Fuel Popup Screen".to_string(),
            defects: "When selecting a pump, there will a PICK YOUR PUMP screen: When clicking on the Fuel button from the popup window when clicking on more button on the home screen, the PICK YOUR PUMP screen appears which appears to be moving up and down. - When PICK YOUR PUMP screen comes in, there is a popup which appears with details. Once the popup is open, the focus goes through the parent page behind first before going into the popup screen.".to_string(),
        }
    }
}

impl DefectForm {
    pub fn to_request(&self) -> DefectDocumentationRequest {
        DefectDocumentationRequest {
            platform: self.platform.clone(),
            page_or_screen: self.page_or_screen.clone(),
            defects: self.defects.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefectPhase {
    Idle,
    Requesting,
    Streaming,
    Completed,
    Failed,
}

/// State published to observers after every transition and every chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefectSnapshot {
    pub phase: DefectPhase,
    pub markdown: String,
    pub error: Option<String>,
}

impl Default for DefectSnapshot {
    fn default() -> Self {
        Self {
            phase: DefectPhase::Idle,
            markdown: String::new(),
            error: None,
        }
    }
}

/// `A11y_Defect_<page>.md` with whitespace runs collapsed to `_` and path
/// characters replaced
pub fn artifact_file_name(page_or_screen: &str) -> String {
    format!("A11y_Defect_{}.md", file_stem(page_or_screen, "defect"))
}

/// Completed markdown document ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefectArtifact {
    file_name: String,
    contents: String,
}

impl DefectArtifact {
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn media_type(&self) -> &'static str {
        "text/markdown"
    }

    /// Write the document into `dir`, returning the full path
    pub async fn write_to(&self, dir: &Path) -> ClientResult<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, self.contents.as_bytes()).await?;
        info!("Saved defect documentation to {}", path.display());
        Ok(path)
    }
}

/// Fold text chunks into successive accumulator values.
///
/// Each item is the full text received so far; an error ends the fold.
pub fn accumulate<S>(chunks: S) -> impl Stream<Item = ClientResult<String>>
where
    S: Stream<Item = ClientResult<String>>,
{
    chunks.scan((String::new(), false), |(buffer, failed), chunk| {
        if *failed {
            return futures::future::ready(None);
        }
        let step = match chunk {
            Ok(text) => {
                buffer.push_str(&text);
                Ok(buffer.clone())
            }
            Err(e) => {
                *failed = true;
                Err(e)
            }
        };
        futures::future::ready(Some(step))
    })
}

pub struct DefectFlow {
    service: Arc<dyn ReportService>,
    busy: BusyFlag,
    generation: Generation,
    state: RwLock<DefectSnapshot>,
    artifact: RwLock<Option<DefectArtifact>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<DefectSnapshot>>>,
}

impl DefectFlow {
    pub fn new(service: Arc<dyn ReportService>) -> Self {
        Self {
            service,
            busy: BusyFlag::new(),
            generation: Generation::new(),
            state: RwLock::new(DefectSnapshot::default()),
            artifact: RwLock::new(None),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Receive every published snapshot from now on
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<DefectSnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    pub async fn snapshot(&self) -> DefectSnapshot {
        self.state.read().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// The finished document, if the last run completed
    pub async fn download(&self) -> Option<DefectArtifact> {
        self.artifact.read().await.clone()
    }

    /// Clear text, error and completion; release the artifact and orphan any
    /// run still in flight
    pub async fn reset(&self) {
        let mut slot = self.artifact.write().await;
        self.generation.invalidate();
        slot.take();
        drop(slot);
        self.apply(DefectSnapshot::default()).await;
    }

    async fn apply(&self, snapshot: DefectSnapshot) {
        *self.state.write().await = snapshot.clone();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
        }
    }

    /// Publish only while `ticket` is the latest run
    async fn publish(&self, ticket: u64, snapshot: DefectSnapshot) -> FlowResult<()> {
        if !self.generation.is_current(ticket) {
            debug!("Dropping update from a superseded defect run");
            return Err(FlowError::Stale);
        }
        self.apply(snapshot).await;
        Ok(())
    }

    async fn fail(&self, ticket: u64, markdown: String, err: FlowError) -> FlowError {
        error!("Failed to document defect: {}", err);
        let snapshot = DefectSnapshot {
            phase: DefectPhase::Failed,
            markdown,
            error: Some(err.to_string()),
        };
        match self.publish(ticket, snapshot).await {
            Ok(()) => err,
            Err(stale) => stale,
        }
    }

    /// Request documentation and consume it, publishing progress as it arrives
    pub async fn submit(&self, form: &DefectForm) -> FlowResult<DefectArtifact> {
        let _busy = self.busy.try_acquire().ok_or(FlowError::Busy)?;
        let ticket = self.generation.begin();

        // a new run supersedes the previous document
        self.artifact.write().await.take();
        self.publish(
            ticket,
            DefectSnapshot {
                phase: DefectPhase::Requesting,
                ..DefectSnapshot::default()
            },
        )
        .await?;

        let body = match self.service.document_defect(&form.to_request()).await {
            Ok(body) => body,
            Err(e) => return Err(self.fail(ticket, String::new(), e.into()).await),
        };

        let markdown = match body {
            DefectBody::Streaming(chunks) => {
                let mut accumulated = String::new();
                let mut steps = Box::pin(accumulate(chunks));

                while let Some(step) = steps.next().await {
                    match step {
                        Ok(text) => {
                            debug!("Received defect chunk, {} bytes so far", text.len());
                            accumulated = text;
                            self.publish(
                                ticket,
                                DefectSnapshot {
                                    phase: DefectPhase::Streaming,
                                    markdown: accumulated.clone(),
                                    error: None,
                                },
                            )
                            .await?;
                        }
                        // keep what arrived visible, but offer no artifact
                        Err(e) => return Err(self.fail(ticket, accumulated, e.into()).await),
                    }
                }
                accumulated
            }
            DefectBody::Complete(text) => text,
        };

        // reset invalidates under this lock, so the check and the store are atomic
        let mut slot = self.artifact.write().await;
        if !self.generation.is_current(ticket) {
            return Err(FlowError::Stale);
        }
        let artifact = DefectArtifact::new(artifact_file_name(&form.page_or_screen), markdown.clone());
        *slot = Some(artifact.clone());
        drop(slot);

        self.publish(
            ticket,
            DefectSnapshot {
                phase: DefectPhase::Completed,
                markdown,
                error: None,
            },
        )
        .await?;

        info!("Defect documentation ready: {}", artifact.file_name());
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a11y_client::{ClientError, MockReportService};
    use futures::stream;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const CHUNKS: [&str; 3] = ["# Title\n", "Body line 1\n", "Body line 2"];

    fn streaming_service(chunks: Vec<ClientResult<String>>) -> MockReportService {
        let mut service = MockReportService::new();
        let mut chunks = Some(chunks);
        service.expect_document_defect().returning(move |_| {
            let items = chunks.take().unwrap_or_default();
            Ok(DefectBody::Streaming(stream::iter(items).boxed()))
        });
        service
    }

    fn ok_chunks() -> Vec<ClientResult<String>> {
        CHUNKS.iter().map(|c| Ok(c.to_string())).collect()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<DefectSnapshot>) -> Vec<DefectSnapshot> {
        let mut out = Vec::new();
        while let Ok(s) = rx.try_recv() {
            out.push(s);
        }
        out
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name("Fuel Popup Screen"),
            "A11y_Defect_Fuel_Popup_Screen.md"
        );
        assert_eq!(artifact_file_name("Pick \t your  pump"), "A11y_Defect_Pick_your_pump.md");
        assert_eq!(artifact_file_name(""), "A11y_Defect_defect.md");
        assert_eq!(artifact_file_name("../Settings/Pay"), "A11y_Defect__Settings_Pay.md");
    }

    #[tokio::test]
    async fn test_accumulate_yields_growing_prefixes() {
        let steps: Vec<String> = accumulate(stream::iter(ok_chunks()))
            .map(|s| s.unwrap())
            .collect()
            .await;

        assert_eq!(
            steps,
            vec![
                "# Title\n".to_string(),
                "# Title\nBody line 1\n".to_string(),
                "# Title\nBody line 1\nBody line 2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_streamed_run_publishes_every_chunk() {
        let flow = DefectFlow::new(Arc::new(streaming_service(ok_chunks())));
        let mut rx = flow.subscribe();

        let artifact = flow.submit(&DefectForm::default()).await.unwrap();
        let published = drain(&mut rx);

        let phases: Vec<DefectPhase> = published.iter().map(|s| s.phase).collect();
        assert_eq!(
            phases,
            vec![
                DefectPhase::Requesting,
                DefectPhase::Streaming,
                DefectPhase::Streaming,
                DefectPhase::Streaming,
                DefectPhase::Completed,
            ]
        );

        let streamed: Vec<&str> = published
            .iter()
            .filter(|s| s.phase == DefectPhase::Streaming)
            .map(|s| s.markdown.as_str())
            .collect();
        for pair in streamed.windows(2) {
            assert!(pair[1].starts_with(pair[0]) && pair[1].len() > pair[0].len());
        }

        let full = CHUNKS.concat();
        assert_eq!(published.last().unwrap().markdown, full);
        assert_eq!(artifact.contents(), full);
        assert_eq!(artifact.file_name(), "A11y_Defect_Fuel_Popup_Screen.md");
        assert_eq!(flow.download().await, Some(artifact));
    }

    #[tokio::test]
    async fn test_artifact_file_matches_accumulated_text() {
        let flow = DefectFlow::new(Arc::new(streaming_service(ok_chunks())));
        let artifact = flow.submit(&DefectForm::default()).await.unwrap();

        let dir = TempDir::new().unwrap();
        let path = artifact.write_to(dir.path()).await.unwrap();
        let written = tokio::fs::read(&path).await.unwrap();

        assert_eq!(written, flow.snapshot().await.markdown.into_bytes());
    }

    #[tokio::test]
    async fn test_complete_body_is_final_value() {
        let mut service = MockReportService::new();
        service
            .expect_document_defect()
            .returning(|_| Ok(DefectBody::Complete("# Whole document".to_string())));
        let flow = DefectFlow::new(Arc::new(service));
        let mut rx = flow.subscribe();

        let artifact = flow.submit(&DefectForm::default()).await.unwrap();
        assert_eq!(artifact.contents(), "# Whole document");

        let phases: Vec<DefectPhase> = drain(&mut rx).iter().map(|s| s.phase).collect();
        assert_eq!(phases, vec![DefectPhase::Requesting, DefectPhase::Completed]);
    }

    #[tokio::test]
    async fn test_truncated_stream_keeps_text_but_offers_nothing() {
        let chunks = vec![
            Ok("# Title\n".to_string()),
            Err(ClientError::Transport("connection reset".to_string())),
        ];
        let flow = DefectFlow::new(Arc::new(streaming_service(chunks)));

        assert!(flow.submit(&DefectForm::default()).await.is_err());

        let snapshot = flow.snapshot().await;
        assert_eq!(snapshot.phase, DefectPhase::Failed);
        assert_eq!(snapshot.markdown, "# Title\n");
        assert!(snapshot.error.unwrap().contains("connection reset"));
        assert!(flow.download().await.is_none());
    }

    #[tokio::test]
    async fn test_http_failure_is_terminal() {
        let mut service = MockReportService::new();
        service.expect_document_defect().returning(|_| {
            Err(ClientError::Transport("Server responded with 503 Service Unavailable".to_string()))
        });
        let flow = DefectFlow::new(Arc::new(service));

        assert!(flow.submit(&DefectForm::default()).await.is_err());
        let snapshot = flow.snapshot().await;
        assert_eq!(snapshot.phase, DefectPhase::Failed);
        assert!(snapshot.error.unwrap().contains("503"));
        assert!(!flow.is_busy());
    }

    #[tokio::test]
    async fn test_reset_clears_state_and_releases_artifact() {
        let flow = DefectFlow::new(Arc::new(streaming_service(ok_chunks())));
        flow.submit(&DefectForm::default()).await.unwrap();
        assert!(flow.download().await.is_some());

        flow.reset().await;

        assert_eq!(flow.snapshot().await, DefectSnapshot::default());
        assert!(flow.download().await.is_none());
    }

    #[tokio::test]
    async fn test_reset_during_stream_leaves_no_artifact() {
        let (tx, rx) = futures::channel::mpsc::unbounded::<ClientResult<String>>();
        let mut rx = Some(rx);
        let mut service = MockReportService::new();
        service.expect_document_defect().returning(move |_| {
            Ok(DefectBody::Streaming(rx.take().unwrap().boxed()))
        });
        let flow = Arc::new(DefectFlow::new(Arc::new(service)));
        let mut updates = flow.subscribe();

        let pending = tokio::spawn({
            let flow = flow.clone();
            async move { flow.submit(&DefectForm::default()).await }
        });
        tx.unbounded_send(Ok("# Partial".to_string())).unwrap();
        while updates.recv().await.unwrap().phase != DefectPhase::Streaming {}

        flow.reset().await;
        drop(tx);

        assert!(matches!(pending.await.unwrap(), Err(FlowError::Stale)));
        assert!(flow.download().await.is_none());
        assert_eq!(flow.snapshot().await, DefectSnapshot::default());
    }

    #[tokio::test]
    async fn test_new_run_releases_previous_artifact() {
        let mut service = MockReportService::new();
        let mut calls = 0;
        service.expect_document_defect().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(DefectBody::Complete("first".to_string()))
            } else {
                Err(ClientError::Transport("down".to_string()))
            }
        });
        let flow = DefectFlow::new(Arc::new(service));

        flow.submit(&DefectForm::default()).await.unwrap();
        assert!(flow.submit(&DefectForm::default()).await.is_err());
        assert!(flow.download().await.is_none());
    }

    #[tokio::test]
    async fn test_second_submission_while_busy_is_rejected() {
        let flow = DefectFlow::new(Arc::new(MockReportService::new()));
        let _held = flow.busy.try_acquire().unwrap();

        assert!(matches!(
            flow.submit(&DefectForm::default()).await,
            Err(FlowError::Busy)
        ));
    }
}
