// ABOUTME: CLI dashboard: report totals, open checklist items and recent reports

use a11y_cli::Context;
use a11y_client::ReportQuery;
use a11y_flows::{DashboardSummary, ReportList, ReportStatus};
use anyhow::Result;
use colored::*;
use comfy_table::{Cell, Color};

use super::utils::{format_date, table, truncate};

const ALL_PLATFORMS: [&str; 3] = ["iOS", "Android", "Web"];

pub async fn show_dashboard(ctx: &Context, platform: Option<String>, all_platforms: bool) -> Result<()> {
    let platforms: Vec<String> = if all_platforms {
        ALL_PLATFORMS.iter().map(|p| p.to_string()).collect()
    } else {
        vec![ctx.platform_or_default(platform)]
    };

    let list = ReportList::new(
        ctx.service.clone(),
        ctx.notifier.clone(),
        ctx.confirmer.clone(),
    );
    let mut reports = Vec::new();
    for platform in &platforms {
        list.refresh(&ReportQuery::new(platform)).await?;
        reports.extend(list.reports().await);
    }

    let summary = DashboardSummary::from_reports(&reports);

    println!("{}", "📊 Dashboard".blue().bold());
    println!();
    println!(
        "{} {}",
        "Total Reports Analyzed:".bold(),
        summary.total_reports.to_string().cyan()
    );
    println!(
        "{} {}",
        "Open Checklist Items:".bold(),
        summary.open_checklist_items.to_string().cyan()
    );
    let last_run = summary
        .last_analysis_run
        .as_ref()
        .map(format_date)
        .unwrap_or_else(|| "—".to_string());
    println!("{} {}", "Last Analysis Run:".bold(), last_run.cyan());

    if summary.by_platform.len() > 1 {
        let counts: Vec<String> = summary
            .by_platform
            .iter()
            .map(|(platform, count)| format!("{} {}", platform, count))
            .collect();
        println!("{} {}", "By Platform:".bold(), counts.join(", "));
    }

    if summary.recent.is_empty() {
        println!();
        println!("{}", "No reports yet".yellow());
        return Ok(());
    }

    println!();
    println!("{}", "Recent Reports".green().bold());
    let mut table = table(vec!["Ticket", "Summary", "Date", "Platform", "Issues Found", "Status"]);
    for recent in &summary.recent {
        let color = match recent.status {
            ReportStatus::Passed => Color::Green,
            ReportStatus::Issues => Color::Red,
            ReportStatus::Unknown => Color::Yellow,
        };
        let issues = recent
            .issues
            .map(|n| n.to_string())
            .unwrap_or_else(|| "—".to_string());
        table.add_row(vec![
            Cell::new(&recent.ticket_id),
            Cell::new(truncate(&recent.summary, 30)),
            Cell::new(format_date(&recent.updated_at)),
            Cell::new(&recent.platform),
            Cell::new(issues),
            Cell::new(recent.status.label()).fg(color),
        ]);
    }
    println!("{}", table);
    Ok(())
}
