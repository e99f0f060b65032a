//! Request and response models for the A11y Insights service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields the service sends that these models do not name. Kept so that a
/// read-modify-write cycle sends them back untouched.
pub type ExtraFields = Map<String, Value>;

/// Optional metadata attached to a user-story analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryMetadata {
    #[serde(rename = "Project", default)]
    pub project: String,
    #[serde(rename = "Pillar", default)]
    pub pillar: String,
    #[serde(rename = "Assignee", default)]
    pub assignee: String,
    #[serde(rename = "Team", default)]
    pub team: String,
    #[serde(rename = "Fix Version", default)]
    pub fix_version: String,
}

impl StoryMetadata {
    /// Wire keys, in display order
    pub const KEYS: [&'static str; 5] = ["Project", "Pillar", "Assignee", "Team", "Fix Version"];

    /// Set a field by its wire key. Returns false for unknown keys.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        let slot = match key {
            "Project" => &mut self.project,
            "Pillar" => &mut self.pillar,
            "Assignee" => &mut self.assignee,
            "Team" => &mut self.team,
            "Fix Version" => &mut self.fix_version,
            _ => return false,
        };
        *slot = value.into();
        true
    }
}

/// Analysis submission, tagged by `mode` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum AnalysisRequest {
    /// Analyze an existing ticket by its link
    #[serde(rename = "jira")]
    TicketReference {
        jira_link: String,
        summary: String,
        description: String,
    },
    /// Analyze a free-form user story
    #[serde(rename = "userstory")]
    UserStory {
        ticket_id: String,
        summary: String,
        description: String,
        metadata: StoryMetadata,
    },
}

impl AnalysisRequest {
    pub fn description(&self) -> &str {
        match self {
            AnalysisRequest::TicketReference { description, .. }
            | AnalysisRequest::UserStory { description, .. } => description,
        }
    }
}

/// Whether an analysis produced a new report or refreshed an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Created,
    Updated,
}

/// Result of an analysis submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticket_id: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl AnalysisResult {
    /// A result whose `updated_at` is strictly later than `created_at`
    /// refreshed a report that already existed.
    pub fn kind(&self) -> AnalysisKind {
        if self.updated_at > self.created_at {
            AnalysisKind::Updated
        } else {
            AnalysisKind::Created
        }
    }
}

/// Platform-specific implementation hints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImplementationTips {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Citation of a WCAG success criterion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WcagReference {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// One developer checklist entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub item: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub non_accessible_example: String,
    #[serde(default)]
    pub accessible_example: String,
    #[serde(default)]
    pub implementation_tips: ImplementationTips,
    #[serde(default)]
    pub wcag_reference: WcagReference,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// The generated body of a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    #[serde(default)]
    pub developer_checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A stored report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub ticket_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub platform: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub json_report: JsonReport,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Report entry as returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub ticket_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub platform: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_report: Option<JsonReport>,
}

/// Partial update; the server merges `json_report` into the stored report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportUpdate {
    pub json_report: JsonReport,
}

/// Addresses a single report
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    pub ticket_id: String,
    pub platform: Option<String>,
}

impl ReportKey {
    pub fn new(ticket_id: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            platform: None,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}

/// Listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub platform: String,
    pub skip: u32,
    pub limit: u32,
}

impl ReportQuery {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            ..Self::default()
        }
    }
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            platform: "iOS".to_string(),
            skip: 0,
            limit: 100,
        }
    }
}

/// Defect description sent for markdown documentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectDocumentationRequest {
    pub platform: String,
    pub page_or_screen: String,
    pub defects: String,
}

/// Timestamps arrive either as RFC 3339 or as naive ISO-8601 in UTC
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}
