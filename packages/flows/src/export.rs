//! Report export to JSON and Markdown files

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use a11y_client::{ClientResult, Report};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

pub fn to_json(report: &Report) -> ClientResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn to_markdown(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", report.ticket_id);
    if !report.summary.is_empty() {
        let _ = writeln!(out, "\n{}", report.summary);
    }
    let _ = writeln!(
        out,
        "\n- Platform: {}\n- Created: {}\n- Updated: {}",
        report.platform,
        report.created_at.format("%Y-%m-%d %H:%M UTC"),
        report.updated_at.format("%Y-%m-%d %H:%M UTC"),
    );

    let _ = writeln!(out, "\n## Developer Checklist");
    if report.json_report.developer_checklist.is_empty() {
        let _ = writeln!(out, "\nNo checklist items.");
    }
    for (n, item) in report.json_report.developer_checklist.iter().enumerate() {
        let _ = writeln!(out, "\n### {}. {}", n + 1, item.item);
        let _ = writeln!(out, "\n**Intent:** {}", item.intent);
        let wcag = &item.wcag_reference;
        if !wcag.id.is_empty() {
            let _ = writeln!(out, "\n**WCAG {}:** [{}]({})", wcag.id, wcag.name, wcag.url);
        }
        if !item.non_accessible_example.is_empty() {
            let _ = writeln!(
                out,
                "\nNon-accessible example:\n\n```\n{}\n```",
                item.non_accessible_example
            );
        }
        if !item.accessible_example.is_empty() {
            let _ = writeln!(
                out,
                "\nAccessible example:\n\n```\n{}\n```",
                item.accessible_example
            );
        }
        if let Some(tip) = &item.implementation_tips.web {
            let _ = writeln!(out, "\n**Web tip:** {}", tip);
        }
    }

    let _ = writeln!(out, "\n## Acceptance Criteria\n");
    if report.json_report.acceptance_criteria.is_empty() {
        let _ = writeln!(out, "No acceptance criteria.");
    }
    for criterion in &report.json_report.acceptance_criteria {
        let _ = writeln!(out, "- {}", criterion);
    }
    out
}

/// File-name-safe form of `raw`. Whitespace runs become one `_`, anything but
/// alphanumerics, `-`, `_` and `.` becomes `_`, and leading dots are dropped,
/// so the result never leaves the directory it is joined to.
pub fn file_stem(raw: &str, fallback: &str) -> String {
    let mut safe = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                safe.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
            safe.push(c);
        } else {
            safe.push('_');
        }
    }

    match safe.trim_start_matches('.') {
        "" => fallback.to_string(),
        stem => stem.to_string(),
    }
}

/// Write `<ticket_id>.<ext>` into `dir`
pub async fn write_report(report: &Report, format: ExportFormat, dir: &Path) -> ClientResult<PathBuf> {
    let contents = match format {
        ExportFormat::Json => to_json(report)?,
        ExportFormat::Markdown => to_markdown(report),
    };
    tokio::fs::create_dir_all(dir).await?;
    let stem = file_stem(&report.ticket_id, "report");
    let path = dir.join(format!("{}.{}", stem, format.extension()));
    tokio::fs::write(&path, contents).await?;
    info!("Exported report {} to {}", report.ticket_id, path.display());
    Ok(path)
}
