// ABOUTME: Ticket/user-story analysis submission
// ABOUTME: Builds the mode-specific payload, guards re-submission and words the outcome

use std::sync::Arc;

use a11y_client::{AnalysisKind, AnalysisRequest, ClientError, ReportService, StoryMetadata};
use tracing::{error, info};

use crate::error::{FlowError, FlowResult};
use crate::guard::{BusyFlag, Generation};
use crate::notify::{Notice, NoticeAction, Notifier};

pub const MISSING_DESCRIPTION: &str = "Please provide a description before analyzing.";

/// Which identifying field the analysis is anchored on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalyzeMode {
    #[default]
    TicketReference,
    UserStory,
}

/// Form fields as the user fills them in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeForm {
    pub mode: AnalyzeMode,
    pub ticket_link: String,
    pub ticket_id: String,
    pub summary: String,
    pub description: String,
    pub metadata: StoryMetadata,
}

impl AnalyzeForm {
    pub fn new(mode: AnalyzeMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set a field by name; metadata keys route into the metadata map
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        match key {
            "ticket_link" | "jira_link" => self.ticket_link = value,
            "ticket_id" => self.ticket_id = value,
            "summary" => self.summary = value,
            "description" => self.description = value,
            other => return self.metadata.set(other, value),
        }
        true
    }

    /// Build the request for the selected mode, rejecting incomplete forms
    pub fn to_request(&self) -> Result<AnalysisRequest, ClientError> {
        if self.description.trim().is_empty() {
            return Err(ClientError::validation(MISSING_DESCRIPTION));
        }

        match self.mode {
            AnalyzeMode::TicketReference => {
                if self.ticket_link.trim().is_empty() {
                    return Err(ClientError::validation("Please provide the ticket link."));
                }
                Ok(AnalysisRequest::TicketReference {
                    jira_link: self.ticket_link.trim().to_string(),
                    summary: self.summary.clone(),
                    description: self.description.clone(),
                })
            }
            AnalyzeMode::UserStory => {
                if self.ticket_id.trim().is_empty() {
                    return Err(ClientError::validation("Please provide the ticket ID."));
                }
                Ok(AnalysisRequest::UserStory {
                    ticket_id: self.ticket_id.trim().to_string(),
                    summary: self.summary.clone(),
                    description: self.description.clone(),
                    metadata: self.metadata.clone(),
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeState {
    Idle,
    Submitting,
}

/// What a successful analysis did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    Created { ticket_id: String },
    Updated { ticket_id: String },
}

impl AnalyzeOutcome {
    pub fn ticket_id(&self) -> &str {
        match self {
            AnalyzeOutcome::Created { ticket_id } | AnalyzeOutcome::Updated { ticket_id } => ticket_id,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AnalyzeOutcome::Created { ticket_id } => {
                format!("Report for {} created successfully!", ticket_id)
            }
            AnalyzeOutcome::Updated { ticket_id } => {
                format!("Report for {} updated successfully!", ticket_id)
            }
        }
    }
}

pub struct AnalyzeFlow {
    service: Arc<dyn ReportService>,
    notifier: Arc<dyn Notifier>,
    busy: BusyFlag,
    generation: Generation,
}

impl AnalyzeFlow {
    pub fn new(service: Arc<dyn ReportService>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            service,
            notifier,
            busy: BusyFlag::new(),
            generation: Generation::new(),
        }
    }

    pub fn state(&self) -> AnalyzeState {
        if self.busy.is_busy() {
            AnalyzeState::Submitting
        } else {
            AnalyzeState::Idle
        }
    }

    /// Drop the result of any submission still in flight
    pub fn invalidate(&self) {
        self.generation.invalidate();
    }

    /// Validate, submit and announce the outcome
    pub async fn submit(&self, form: &AnalyzeForm) -> FlowResult<AnalyzeOutcome> {
        let request = match form.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.notifier.notify(Notice::error(e.user_message()));
                return Err(e.into());
            }
        };

        let _busy = self.busy.try_acquire().ok_or(FlowError::Busy)?;
        let ticket = self.generation.begin();

        let result = self.service.submit_analysis(&request).await;

        if !self.generation.is_current(ticket) {
            info!("Discarding analysis result from a superseded submission");
            return Err(FlowError::Stale);
        }

        match result {
            Ok(result) => {
                let outcome = match result.kind() {
                    AnalysisKind::Created => AnalyzeOutcome::Created {
                        ticket_id: result.ticket_id,
                    },
                    AnalysisKind::Updated => AnalyzeOutcome::Updated {
                        ticket_id: result.ticket_id,
                    },
                };
                info!("Analysis complete: {:?}", outcome);
                self.notifier.notify(
                    Notice::success(outcome.message()).with_action(NoticeAction::ViewReport {
                        ticket_id: outcome.ticket_id().to_string(),
                    }),
                );
                Ok(outcome)
            }
            Err(e) => {
                error!("Analyze failed: {}", e);
                let message = match &e {
                    ClientError::Server { message, .. } => message.clone(),
                    _ => "Failed to generate report. Please try again.".to_string(),
                };
                self.notifier.notify(Notice::error(message));
                Err(e.into())
            }
        }
    }
}
