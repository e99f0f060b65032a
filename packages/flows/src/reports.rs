// ABOUTME: Locally held report list and the dashboard figures derived from it
// ABOUTME: Refreshes are generation-guarded; deletes drop the entry without a refetch

use std::collections::BTreeMap;
use std::sync::Arc;

use a11y_client::{ReportKey, ReportQuery, ReportService, ReportSummary};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::error::{FlowError, FlowResult};
use crate::guard::Generation;
use crate::notify::{Confirmer, Notice, Notifier};

pub struct ReportList {
    service: Arc<dyn ReportService>,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    generation: Generation,
    reports: RwLock<Vec<ReportSummary>>,
}

impl ReportList {
    pub fn new(
        service: Arc<dyn ReportService>,
        notifier: Arc<dyn Notifier>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        Self {
            service,
            notifier,
            confirmer,
            generation: Generation::new(),
            reports: RwLock::new(Vec::new()),
        }
    }

    /// Replace the held list with one page from the server
    pub async fn refresh(&self, query: &ReportQuery) -> FlowResult<usize> {
        let ticket = self.generation.begin();
        let result = self.service.list_reports(query).await;

        let mut held = self.reports.write().await;
        if !self.generation.is_current(ticket) {
            return Err(FlowError::Stale);
        }

        match result {
            Ok(reports) => {
                let count = reports.len();
                info!("Loaded {} {} reports", count, query.platform);
                *held = reports;
                Ok(count)
            }
            Err(e) => {
                drop(held);
                error!("Failed to list reports: {}", e);
                self.notifier.notify(Notice::error("Failed to load reports."));
                Err(e.into())
            }
        }
    }

    pub async fn reports(&self) -> Vec<ReportSummary> {
        self.reports.read().await.clone()
    }

    /// Case-insensitive match on ticket id or summary
    pub async fn filtered(&self, needle: &str) -> Vec<ReportSummary> {
        let needle = needle.trim().to_lowercase();
        let reports = self.reports.read().await;
        if needle.is_empty() {
            return reports.clone();
        }
        reports
            .iter()
            .filter(|r| {
                r.ticket_id.to_lowercase().contains(&needle)
                    || r.summary.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Delete after confirmation. Returns false if declined.
    pub async fn delete(&self, key: &ReportKey) -> FlowResult<bool> {
        let prompt = format!(
            "Delete report {}? This action cannot be undone.",
            key.ticket_id
        );
        if !self.confirmer.confirm(&prompt) {
            return Ok(false);
        }

        match self.service.delete_report(key).await {
            Ok(()) => {
                // a refresh started before the delete would bring the entry back
                let mut held = self.reports.write().await;
                self.generation.invalidate();
                held.retain(|r| r.ticket_id != key.ticket_id);
                drop(held);
                self.notifier.notify(Notice::success(format!(
                    "Report {} deleted successfully.",
                    key.ticket_id
                )));
                Ok(true)
            }
            Err(e) => {
                error!("Failed to delete report {}: {}", key.ticket_id, e);
                self.notifier.notify(Notice::error("Failed to delete report."));
                Err(e.into())
            }
        }
    }

    pub fn invalidate(&self) {
        self.generation.invalidate();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Passed,
    Issues,
    /// Listing did not include the report body
    Unknown,
}

impl ReportStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Passed => "Passed",
            ReportStatus::Issues => "Issues",
            ReportStatus::Unknown => "Review Needed",
        }
    }
}

/// One row of the recent-reports table
#[derive(Debug, Clone, PartialEq)]
pub struct RecentReport {
    pub ticket_id: String,
    pub summary: String,
    pub platform: String,
    pub updated_at: DateTime<Utc>,
    pub issues: Option<usize>,
    pub status: ReportStatus,
}

impl From<&ReportSummary> for RecentReport {
    fn from(report: &ReportSummary) -> Self {
        let issues = report
            .json_report
            .as_ref()
            .map(|j| j.developer_checklist.len());
        let status = match issues {
            Some(0) => ReportStatus::Passed,
            Some(_) => ReportStatus::Issues,
            None => ReportStatus::Unknown,
        };
        Self {
            ticket_id: report.ticket_id.clone(),
            summary: report.summary.clone(),
            platform: report.platform.clone(),
            updated_at: report.updated_at,
            issues,
            status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_reports: usize,
    pub open_checklist_items: usize,
    pub last_analysis_run: Option<DateTime<Utc>>,
    pub by_platform: BTreeMap<String, usize>,
    pub recent: Vec<RecentReport>,
}

impl DashboardSummary {
    pub const RECENT_LIMIT: usize = 5;

    pub fn from_reports(reports: &[ReportSummary]) -> Self {
        let mut by_platform = BTreeMap::new();
        for report in reports {
            *by_platform.entry(report.platform.clone()).or_insert(0) += 1;
        }

        let mut newest: Vec<&ReportSummary> = reports.iter().collect();
        newest.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Self {
            total_reports: reports.len(),
            open_checklist_items: reports
                .iter()
                .filter_map(|r| r.json_report.as_ref())
                .map(|j| j.developer_checklist.len())
                .sum(),
            last_analysis_run: newest.first().map(|r| r.updated_at),
            by_platform,
            recent: newest
                .into_iter()
                .take(Self::RECENT_LIMIT)
                .map(RecentReport::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{RecordingNotifier, StaticConfirmer};
    use crate::testing::GatedService;
    use a11y_client::{ChecklistItem, ClientError, JsonReport, MockReportService};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn summary(id: &str, platform: &str, day: u32, checklist: Option<usize>) -> ReportSummary {
        let at = Utc.with_ymd_and_hms(2025, 10, day, 12, 0, 0).unwrap();
        ReportSummary {
            ticket_id: id.to_string(),
            summary: format!("Audit of {}", id),
            platform: platform.to_string(),
            created_at: at,
            updated_at: at,
            json_report: checklist.map(|n| JsonReport {
                developer_checklist: vec![ChecklistItem::default(); n],
                ..Default::default()
            }),
        }
    }

    fn list(service: MockReportService, confirm: bool) -> (ReportList, RecordingNotifier) {
        let notifier = RecordingNotifier::new();
        let list = ReportList::new(
            Arc::new(service),
            Arc::new(notifier.clone()),
            Arc::new(StaticConfirmer(confirm)),
        );
        (list, notifier)
    }

    #[tokio::test]
    async fn test_delete_removes_entry_without_refetch() {
        let mut service = MockReportService::new();
        service.expect_list_reports().times(1).returning(|_| {
            Ok(vec![
                summary("A11Y-1", "iOS", 1, None),
                summary("A11Y-2", "iOS", 2, None),
            ])
        });
        service.expect_delete_report().times(1).returning(|_| Ok(()));
        let (list, notifier) = list(service, true);

        list.refresh(&ReportQuery::default()).await.unwrap();
        assert!(list.delete(&ReportKey::new("A11Y-1")).await.unwrap());

        let ids: Vec<_> = list.reports().await.into_iter().map(|r| r.ticket_id).collect();
        assert_eq!(ids, vec!["A11Y-2".to_string()]);
        assert_eq!(
            notifier.last().unwrap().message,
            "Report A11Y-1 deleted successfully."
        );
    }

    #[tokio::test]
    async fn test_declined_delete_keeps_list() {
        let mut service = MockReportService::new();
        service
            .expect_list_reports()
            .returning(|_| Ok(vec![summary("A11Y-1", "iOS", 1, None)]));
        service.expect_delete_report().never();
        let (list, _) = list(service, false);

        list.refresh(&ReportQuery::default()).await.unwrap();
        assert!(!list.delete(&ReportKey::new("A11Y-1")).await.unwrap());
        assert_eq!(list.reports().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_list() {
        let mut service = MockReportService::new();
        let mut calls = 0;
        service.expect_list_reports().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(vec![summary("A11Y-1", "Web", 1, None)])
            } else {
                Err(ClientError::Transport("refused".to_string()))
            }
        });
        let (list, notifier) = list(service, true);

        list.refresh(&ReportQuery::new("Web")).await.unwrap();
        assert!(list.refresh(&ReportQuery::new("Web")).await.is_err());
        assert_eq!(list.reports().await.len(), 1);
        assert_eq!(notifier.last().unwrap(), Notice::error("Failed to load reports."));
    }

    #[tokio::test]
    async fn test_refresh_landing_after_delete_is_discarded() {
        let service = Arc::new(GatedService::serving_listing(vec![
            summary("A11Y-1", "iOS", 1, None),
            summary("A11Y-2", "iOS", 2, None),
        ]));
        let list = Arc::new(ReportList::new(
            service.clone(),
            Arc::new(RecordingNotifier::new()),
            Arc::new(StaticConfirmer(true)),
        ));

        service.release.notify_one();
        list.refresh(&ReportQuery::default()).await.unwrap();
        service.entered.notified().await;

        let pending = tokio::spawn({
            let list = list.clone();
            async move { list.refresh(&ReportQuery::default()).await }
        });
        service.entered.notified().await;

        assert!(list.delete(&ReportKey::new("A11Y-1")).await.unwrap());
        service.release.notify_one();

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, FlowError::Stale));
        let ids: Vec<_> = list.reports().await.into_iter().map(|r| r.ticket_id).collect();
        assert_eq!(ids, vec!["A11Y-2".to_string()]);
    }

    #[tokio::test]
    async fn test_refresh_landing_after_invalidate_keeps_list() {
        let service = Arc::new(GatedService::serving_listing(vec![summary(
            "A11Y-9", "Web", 1, None,
        )]));
        let list = Arc::new(ReportList::new(
            service.clone(),
            Arc::new(RecordingNotifier::new()),
            Arc::new(StaticConfirmer(true)),
        ));

        let pending = tokio::spawn({
            let list = list.clone();
            async move { list.refresh(&ReportQuery::new("Web")).await }
        });
        service.entered.notified().await;
        list.invalidate();
        service.release.notify_one();

        assert!(matches!(pending.await.unwrap(), Err(FlowError::Stale)));
        assert!(list.reports().await.is_empty());
    }

    #[tokio::test]
    async fn test_filter_matches_id_or_summary() {
        let mut service = MockReportService::new();
        service.expect_list_reports().returning(|_| {
            let mut checkout = summary("SHOP-7", "Web", 3, None);
            checkout.summary = "Checkout flow".to_string();
            Ok(vec![checkout, summary("A11Y-2", "Web", 4, None)])
        });
        let (list, _) = list(service, true);
        list.refresh(&ReportQuery::new("Web")).await.unwrap();

        assert_eq!(list.filtered("CHECKOUT").await[0].ticket_id, "SHOP-7");
        assert_eq!(list.filtered("a11y").await[0].ticket_id, "A11Y-2");
        assert_eq!(list.filtered("  ").await.len(), 2);
        assert!(list.filtered("nothing").await.is_empty());
    }

    #[test]
    fn test_dashboard_summary() {
        let reports = vec![
            summary("A", "iOS", 1, Some(3)),
            summary("B", "Web", 9, Some(0)),
            summary("C", "iOS", 5, None),
            summary("D", "Android", 2, Some(4)),
            summary("E", "iOS", 3, Some(1)),
            summary("F", "Web", 4, Some(1)),
        ];

        let dashboard = DashboardSummary::from_reports(&reports);
        assert_eq!(dashboard.total_reports, 6);
        assert_eq!(dashboard.open_checklist_items, 9);
        assert_eq!(
            dashboard.last_analysis_run,
            Some(Utc.with_ymd_and_hms(2025, 10, 9, 12, 0, 0).unwrap())
        );
        assert_eq!(dashboard.by_platform.get("iOS"), Some(&3));
        assert_eq!(dashboard.by_platform.get("Android"), Some(&1));

        let recent: Vec<_> = dashboard.recent.iter().map(|r| r.ticket_id.as_str()).collect();
        assert_eq!(recent, vec!["B", "C", "F", "E", "D"]);
        assert_eq!(dashboard.recent[0].status, ReportStatus::Passed);
        assert_eq!(dashboard.recent[1].status, ReportStatus::Unknown);
        assert_eq!(dashboard.recent[2].status, ReportStatus::Issues);
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = DashboardSummary::from_reports(&[]);
        assert_eq!(dashboard, DashboardSummary::default());
    }
}
