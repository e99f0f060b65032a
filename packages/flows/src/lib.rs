//! User-facing workflows on top of the A11y Insights client
//!
//! Each flow owns its in-flight guard and stale-result generation, reports
//! outcomes through a [`Notifier`] and asks a [`Confirmer`] before destructive
//! actions. Front ends only render state and forward input.

pub mod analyze;
pub mod defect;
pub mod editor;
pub mod error;
pub mod export;
pub mod guard;
pub mod notify;
pub mod reports;

#[cfg(test)]
mod testing;

pub use analyze::{AnalyzeFlow, AnalyzeForm, AnalyzeMode, AnalyzeOutcome, AnalyzeState};
pub use defect::{
    accumulate, artifact_file_name, DefectArtifact, DefectFlow, DefectForm, DefectPhase,
    DefectSnapshot,
};
pub use editor::{
    ChecklistDraft, CriterionDraft, EditableReport, EditorState, ItemId, ReportEditor, Tracked,
};
pub use error::{FlowError, FlowResult};
pub use export::{file_stem, to_json, to_markdown, write_report, ExportFormat};
pub use guard::{BusyFlag, BusyGuard, Generation};
pub use notify::{
    Confirmer, Notice, NoticeAction, NoticeLevel, Notifier, QuietNotifier, RecordingNotifier,
    StaticConfirmer,
};
pub use reports::{DashboardSummary, RecentReport, ReportList, ReportStatus};
