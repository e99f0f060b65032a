// ABOUTME: Fetch-edit-persist cycle for one report's checklist and acceptance criteria
// ABOUTME: Items carry stable ids while loaded; positions are resolved only when saving

use std::fmt;
use std::sync::Arc;

use a11y_client::{
    ChecklistItem, ExtraFields, JsonReport, Report, ReportKey, ReportService, ReportUpdate,
};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{FlowError, FlowResult};
use crate::guard::{BusyFlag, Generation};
use crate::notify::{Confirmer, Notice, Notifier};

/// Opaque identity of an item within a loaded report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(Uuid);

impl ItemId {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<T> {
    pub id: ItemId,
    pub value: T,
}

impl<T> Tracked<T> {
    fn new(value: T) -> Self {
        Self {
            id: ItemId::fresh(),
            value,
        }
    }
}

/// A report as held by the editor
#[derive(Debug, Clone, PartialEq)]
pub struct EditableReport {
    pub ticket_id: String,
    pub summary: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub checklist: Vec<Tracked<ChecklistItem>>,
    pub criteria: Vec<Tracked<String>>,
    /// `json_report` keys other than the two collections
    pub report_extra: ExtraFields,
    /// Top-level report keys the models do not name
    pub extra: ExtraFields,
}

impl From<Report> for EditableReport {
    fn from(report: Report) -> Self {
        Self {
            ticket_id: report.ticket_id,
            summary: report.summary,
            platform: report.platform,
            created_at: report.created_at,
            updated_at: report.updated_at,
            checklist: report
                .json_report
                .developer_checklist
                .into_iter()
                .map(Tracked::new)
                .collect(),
            criteria: report
                .json_report
                .acceptance_criteria
                .into_iter()
                .map(Tracked::new)
                .collect(),
            report_extra: report.json_report.extra,
            extra: report.extra,
        }
    }
}

impl EditableReport {
    pub fn json_report(&self) -> JsonReport {
        JsonReport {
            developer_checklist: self.checklist.iter().map(|t| t.value.clone()).collect(),
            acceptance_criteria: self.criteria.iter().map(|t| t.value.clone()).collect(),
            extra: self.report_extra.clone(),
        }
    }

    pub fn to_report(&self) -> Report {
        Report {
            ticket_id: self.ticket_id.clone(),
            summary: self.summary.clone(),
            platform: self.platform.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            json_report: self.json_report(),
            extra: self.extra.clone(),
        }
    }

    pub fn checklist_id(&self, position: usize) -> Option<ItemId> {
        self.checklist.get(position).map(|t| t.id)
    }

    pub fn criterion_id(&self, position: usize) -> Option<ItemId> {
        self.criteria.get(position).map(|t| t.id)
    }

    fn checklist_position(&self, id: ItemId) -> FlowResult<usize> {
        self.checklist
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| FlowError::UnknownItem(id.to_string()))
    }

    fn criterion_position(&self, id: ItemId) -> FlowResult<usize> {
        self.criteria
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| FlowError::UnknownItem(id.to_string()))
    }
}

/// Working copy of one checklist item
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistDraft {
    pub id: ItemId,
    pub item: ChecklistItem,
}

/// Working value for adding (`target: None`) or editing a criterion
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionDraft {
    pub target: Option<ItemId>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    Loading,
    Ready(EditableReport),
    NotFound,
    Deleted,
}

pub struct ReportEditor {
    key: ReportKey,
    service: Arc<dyn ReportService>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    generation: Generation,
    saving: BusyFlag,
    state: RwLock<EditorState>,
}

impl ReportEditor {
    pub fn new(
        key: ReportKey,
        service: Arc<dyn ReportService>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            key,
            service,
            notifier,
            confirmer,
            generation: Generation::new(),
            saving: BusyFlag::new(),
            state: RwLock::new(EditorState::Loading),
        }
    }

    pub fn key(&self) -> &ReportKey {
        &self.key
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_busy()
    }

    pub async fn state(&self) -> EditorState {
        self.state.read().await.clone()
    }

    pub async fn report(&self) -> Option<EditableReport> {
        match &*self.state.read().await {
            EditorState::Ready(report) => Some(report.clone()),
            _ => None,
        }
    }

    /// Discard results of requests still in flight, e.g. when the view closes
    pub fn invalidate(&self) {
        self.generation.invalidate();
    }

    /// Load the report; any failure is terminal for this view
    pub async fn fetch(&self) -> FlowResult<EditableReport> {
        let ticket = self.generation.begin();
        let result = self.service.get_report(&self.key).await;

        // checked under the state lock so a delete cannot slip in between
        let mut state = self.state.write().await;
        if !self.generation.is_current(ticket) {
            info!("Discarding stale fetch of report {}", self.key.ticket_id);
            return Err(FlowError::Stale);
        }

        match result {
            Ok(report) => {
                let editable = EditableReport::from(report);
                *state = EditorState::Ready(editable.clone());
                Ok(editable)
            }
            Err(e) => {
                error!("Failed to fetch report {}: {}", self.key.ticket_id, e);
                *state = EditorState::NotFound;
                drop(state);
                self.notifier.notify(Notice::error("Failed to load report details."));
                Err(e.into())
            }
        }
    }

    /// Open a deep copy of a checklist item for editing
    pub async fn edit_checklist_item(&self, id: ItemId) -> FlowResult<ChecklistDraft> {
        let report = self.report().await.ok_or(FlowError::NotLoaded)?;
        let position = report.checklist_position(id)?;
        Ok(ChecklistDraft {
            id,
            item: report.checklist[position].value.clone(),
        })
    }

    /// Replace the drafted item and persist the whole `json_report`
    pub async fn save_checklist_item(&self, draft: &ChecklistDraft) -> FlowResult<()> {
        let report = self.report().await.ok_or(FlowError::NotLoaded)?;
        let position = report.checklist_position(draft.id)?;

        let mut json_report = report.json_report();
        json_report.developer_checklist[position] = draft.item.clone();

        self.persist(
            json_report,
            "Checklist item updated successfully!",
            "Failed to update checklist item.",
        )
        .await
    }

    /// Empty draft that appends a new criterion
    pub fn new_criterion(&self) -> CriterionDraft {
        CriterionDraft {
            target: None,
            value: String::new(),
        }
    }

    pub async fn edit_criterion(&self, id: ItemId) -> FlowResult<CriterionDraft> {
        let report = self.report().await.ok_or(FlowError::NotLoaded)?;
        let position = report.criterion_position(id)?;
        Ok(CriterionDraft {
            target: Some(id),
            value: report.criteria[position].value.clone(),
        })
    }

    /// Append or replace a criterion and persist
    pub async fn save_criterion(&self, draft: &CriterionDraft) -> FlowResult<()> {
        let report = self.report().await.ok_or(FlowError::NotLoaded)?;
        let mut json_report = report.json_report();

        match draft.target {
            Some(id) => {
                let position = report.criterion_position(id)?;
                json_report.acceptance_criteria[position] = draft.value.clone();
            }
            None => json_report.acceptance_criteria.push(draft.value.clone()),
        }

        self.persist(
            json_report,
            "Acceptance criteria updated successfully!",
            "Failed to update acceptance criteria.",
        )
        .await
    }

    /// Remove a criterion after confirmation. Returns false if declined.
    pub async fn delete_criterion(&self, id: ItemId) -> FlowResult<bool> {
        let report = self.report().await.ok_or(FlowError::NotLoaded)?;
        let position = report.criterion_position(id)?;

        if !self.confirmer.confirm("Delete this acceptance criterion?") {
            return Ok(false);
        }

        let mut json_report = report.json_report();
        json_report.acceptance_criteria.remove(position);

        self.persist(
            json_report,
            "Acceptance criterion removed.",
            "Failed to delete criterion.",
        )
        .await?;
        Ok(true)
    }

    /// Delete the whole report after confirmation. Returns false if declined.
    pub async fn delete_report(&self) -> FlowResult<bool> {
        let prompt = format!(
            "Delete report {}? This action cannot be undone.",
            self.key.ticket_id
        );
        if !self.confirmer.confirm(&prompt) {
            return Ok(false);
        }

        let _saving = self.saving.try_acquire().ok_or(FlowError::Busy)?;
        match self.service.delete_report(&self.key).await {
            Ok(()) => {
                // nothing loaded before the delete may land afterwards
                let mut state = self.state.write().await;
                self.generation.invalidate();
                *state = EditorState::Deleted;
                drop(state);
                self.notifier.notify(Notice::success(format!(
                    "Report {} deleted successfully.",
                    self.key.ticket_id
                )));
                Ok(true)
            }
            Err(e) => {
                error!("Failed to delete report {}: {}", self.key.ticket_id, e);
                self.notifier.notify(Notice::error("Failed to delete report."));
                Err(e.into())
            }
        }
    }

    /// Send the partial update, then refetch; the refetch is the source of truth
    async fn persist(&self, json_report: JsonReport, success: &str, failure: &str) -> FlowResult<()> {
        let _saving = self.saving.try_acquire().ok_or(FlowError::Busy)?;

        let update = ReportUpdate { json_report };
        if let Err(e) = self.service.update_report(&self.key, &update).await {
            error!("Failed to update report {}: {}", self.key.ticket_id, e);
            self.notifier.notify(Notice::error(failure));
            return Err(e.into());
        }

        self.notifier.notify(Notice::success(success));
        if let Err(e) = self.fetch().await {
            warn!("Refetch after save failed: {}", e);
        }
        Ok(())
    }
}
