// ABOUTME: CLI commands for browsing, editing, exporting and deleting reports
// ABOUTME: Items are addressed by their 1-based position as shown by `reports show`

use std::path::PathBuf;

use a11y_cli::Context;
use a11y_client::{ChecklistItem, ReportKey, ReportQuery};
use a11y_flows::{
    to_json, write_report, EditableReport, EditorState, ExportFormat, Notice, ReportEditor,
    ReportList,
};
use anyhow::{anyhow, bail, Result};
use clap::{Args, Subcommand};
use colored::*;
use inquire::Text;

use super::utils::{format_date, format_datetime, index_from_position, table, truncate};

#[derive(Subcommand)]
pub enum ReportsCommands {
    /// List reports for a platform
    List {
        /// Platform (defaults to the configured platform)
        #[arg(short, long)]
        platform: Option<String>,
        /// Number of reports to skip
        #[arg(long, default_value = "0")]
        skip: u32,
        /// Maximum number of reports
        #[arg(long, default_value = "100")]
        limit: u32,
        /// Only show reports whose ticket ID or summary contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Show a report's checklist and acceptance criteria
    Show {
        #[command(flatten)]
        target: Target,
        /// Print the raw report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a report to a JSON or Markdown file
    Export {
        #[command(flatten)]
        target: Target,
        /// json or md
        #[arg(short, long, default_value = "md")]
        format: ExportFormat,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Edit one developer checklist item
    EditItem {
        #[command(flatten)]
        target: Target,
        /// Item position as shown by `reports show`
        position: usize,
        #[command(flatten)]
        fields: ItemFields,
    },
    /// Append an acceptance criterion
    AddCriterion {
        #[command(flatten)]
        target: Target,
        /// Criterion text
        text: Option<String>,
    },
    /// Replace an acceptance criterion
    EditCriterion {
        #[command(flatten)]
        target: Target,
        /// Criterion position as shown by `reports show`
        position: usize,
        /// New text
        text: Option<String>,
    },
    /// Remove an acceptance criterion
    DeleteCriterion {
        #[command(flatten)]
        target: Target,
        /// Criterion position as shown by `reports show`
        position: usize,
    },
    /// Delete a report
    Delete {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args)]
pub struct Target {
    /// Ticket ID of the report
    ticket_id: String,
    /// Platform the report belongs to
    #[arg(short, long)]
    platform: Option<String>,
}

impl Target {
    fn key(&self) -> ReportKey {
        let key = ReportKey::new(&self.ticket_id);
        match &self.platform {
            Some(platform) => key.with_platform(platform),
            None => key,
        }
    }
}

/// Checklist fields to change; with none given every field is prompted
#[derive(Args, Default)]
pub struct ItemFields {
    #[arg(long)]
    item: Option<String>,
    #[arg(long)]
    intent: Option<String>,
    #[arg(long)]
    non_accessible_example: Option<String>,
    #[arg(long)]
    accessible_example: Option<String>,
    #[arg(long)]
    web_tip: Option<String>,
    #[arg(long)]
    wcag_id: Option<String>,
    #[arg(long)]
    wcag_name: Option<String>,
    #[arg(long)]
    wcag_url: Option<String>,
}

impl ItemFields {
    fn is_empty(&self) -> bool {
        self.item.is_none()
            && self.intent.is_none()
            && self.non_accessible_example.is_none()
            && self.accessible_example.is_none()
            && self.web_tip.is_none()
            && self.wcag_id.is_none()
            && self.wcag_name.is_none()
            && self.wcag_url.is_none()
    }

    fn apply(self, item: &mut ChecklistItem) {
        if let Some(v) = self.item {
            item.item = v;
        }
        if let Some(v) = self.intent {
            item.intent = v;
        }
        if let Some(v) = self.non_accessible_example {
            item.non_accessible_example = v;
        }
        if let Some(v) = self.accessible_example {
            item.accessible_example = v;
        }
        if let Some(v) = self.web_tip {
            item.implementation_tips.web = Some(v);
        }
        if let Some(v) = self.wcag_id {
            item.wcag_reference.id = v;
        }
        if let Some(v) = self.wcag_name {
            item.wcag_reference.name = v;
        }
        if let Some(v) = self.wcag_url {
            item.wcag_reference.url = v;
        }
    }

    fn prompt(item: &ChecklistItem) -> Result<Self> {
        let web = item.implementation_tips.web.clone().unwrap_or_default();
        Ok(Self {
            item: Some(edit("Item:", &item.item)?),
            intent: Some(edit("Intent:", &item.intent)?),
            non_accessible_example: Some(edit(
                "Non-accessible example:",
                &item.non_accessible_example,
            )?),
            accessible_example: Some(edit("Accessible example:", &item.accessible_example)?),
            web_tip: Some(edit("Web implementation tip:", &web)?),
            wcag_id: Some(edit("WCAG ID:", &item.wcag_reference.id)?),
            wcag_name: Some(edit("WCAG name:", &item.wcag_reference.name)?),
            wcag_url: Some(edit("WCAG URL:", &item.wcag_reference.url)?),
        })
    }
}

pub async fn handle_reports_command(ctx: &Context, command: ReportsCommands) -> Result<()> {
    match command {
        ReportsCommands::List {
            platform,
            skip,
            limit,
            filter,
        } => {
            let platform = ctx.platform_or_default(platform);
            list_reports(ctx, ReportQuery { platform, skip, limit }, filter).await
        }
        ReportsCommands::Show { target, json } => show_report(ctx, &target, json).await,
        ReportsCommands::Export {
            target,
            format,
            output,
        } => export_report(ctx, &target, format, output).await,
        ReportsCommands::EditItem {
            target,
            position,
            fields,
        } => edit_item(ctx, &target, position, fields).await,
        ReportsCommands::AddCriterion { target, text } => {
            let editor = load(ctx, &target).await?;
            let mut draft = editor.new_criterion();
            draft.value = match text {
                Some(text) => text,
                None => Text::new("New acceptance criterion:").prompt()?,
            };
            if draft.value.trim().is_empty() {
                bail!("Acceptance criterion cannot be empty");
            }
            editor.save_criterion(&draft).await?;
            Ok(())
        }
        ReportsCommands::EditCriterion {
            target,
            position,
            text,
        } => {
            let editor = load(ctx, &target).await?;
            let report = loaded(&editor).await?;
            let index = index_from_position(position, report.criteria.len(), "acceptance criterion")?;
            let id = report
                .criterion_id(index)
                .ok_or_else(|| anyhow!("No acceptance criterion #{}", position))?;

            let mut draft = editor.edit_criterion(id).await?;
            draft.value = match text {
                Some(text) => text,
                None => edit("Acceptance criterion:", &draft.value)?,
            };
            editor.save_criterion(&draft).await?;
            Ok(())
        }
        ReportsCommands::DeleteCriterion { target, position } => {
            let editor = load(ctx, &target).await?;
            let report = loaded(&editor).await?;
            let index = index_from_position(position, report.criteria.len(), "acceptance criterion")?;
            let id = report
                .criterion_id(index)
                .ok_or_else(|| anyhow!("No acceptance criterion #{}", position))?;

            println!("{} {}", "Criterion:".dimmed(), report.criteria[index].value);
            if !editor.delete_criterion(id).await? {
                println!("{}", "Deletion cancelled".yellow());
            }
            Ok(())
        }
        ReportsCommands::Delete { target } => {
            let list = ReportList::new(
                ctx.service.clone(),
                ctx.notifier.clone(),
                ctx.confirmer.clone(),
            );
            if !list.delete(&target.key()).await? {
                println!("{}", "Deletion cancelled".yellow());
            }
            Ok(())
        }
    }
}

async fn list_reports(ctx: &Context, query: ReportQuery, filter: Option<String>) -> Result<()> {
    let list = ReportList::new(
        ctx.service.clone(),
        ctx.notifier.clone(),
        ctx.confirmer.clone(),
    );
    list.refresh(&query).await?;

    let reports = match &filter {
        Some(needle) => list.filtered(needle).await,
        None => list.reports().await,
    };

    if reports.is_empty() {
        println!("{}", format!("No {} reports found", query.platform).yellow());
        println!("{}", "Use 'a11y analyze' to create your first report".dimmed());
        return Ok(());
    }

    println!("{}", format!("📋 {} Reports", query.platform).blue().bold());
    println!();

    let mut table = table(vec!["Ticket", "Summary", "Created", "Updated", "Checklist"]);
    for report in &reports {
        let checklist = report
            .json_report
            .as_ref()
            .map(|j| j.developer_checklist.len().to_string())
            .unwrap_or_else(|| "—".to_string());
        table.add_row(vec![
            report.ticket_id.clone(),
            truncate(&report.summary, 40),
            format_date(&report.created_at),
            format_date(&report.updated_at),
            checklist,
        ]);
    }

    println!("{}", table);
    println!("Total: {} reports", reports.len().to_string().cyan());
    Ok(())
}

async fn show_report(ctx: &Context, target: &Target, json: bool) -> Result<()> {
    let editor = load(ctx, target).await?;
    let report = loaded(&editor).await?;

    if json {
        println!("{}", to_json(&report.to_report())?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &EditableReport) {
    println!("{}", format!("📄 Report {}", report.ticket_id).blue().bold());
    println!();
    if !report.summary.is_empty() {
        println!("{} {}", "Summary:".bold(), report.summary);
    }
    println!("{} {}", "Platform:".bold(), report.platform);
    println!("{} {}", "Created:".bold(), format_datetime(&report.created_at));
    println!("{} {}", "Updated:".bold(), format_datetime(&report.updated_at));

    println!();
    println!("{}", "Developer Checklist".green().bold());
    if report.checklist.is_empty() {
        println!("{}", "  No checklist items".dimmed());
    }
    for (n, tracked) in report.checklist.iter().enumerate() {
        let item = &tracked.value;
        println!();
        println!("{} {}", format!("{}.", n + 1).cyan().bold(), item.item.bold());
        println!("   {} {}", "Intent:".dimmed(), item.intent);
        if !item.wcag_reference.id.is_empty() {
            println!(
                "   {} {} {} ({})",
                "WCAG:".dimmed(),
                item.wcag_reference.id,
                item.wcag_reference.name,
                item.wcag_reference.url.dimmed()
            );
        }
        if !item.non_accessible_example.is_empty() {
            println!("   {} {}", "✗".red(), item.non_accessible_example);
        }
        if !item.accessible_example.is_empty() {
            println!("   {} {}", "✓".green(), item.accessible_example);
        }
        if let Some(tip) = &item.implementation_tips.web {
            println!("   {} {}", "Web tip:".dimmed(), tip);
        }
    }

    println!();
    println!("{}", "Acceptance Criteria".green().bold());
    if report.criteria.is_empty() {
        println!("{}", "  No acceptance criteria".dimmed());
    }
    for (n, criterion) in report.criteria.iter().enumerate() {
        println!("  {} {}", format!("{}.", n + 1).cyan(), criterion.value);
    }
}

async fn export_report(
    ctx: &Context,
    target: &Target,
    format: ExportFormat,
    output: PathBuf,
) -> Result<()> {
    let editor = load(ctx, target).await?;
    let report = loaded(&editor).await?;

    let path = write_report(&report.to_report(), format, &output).await?;
    ctx.notifier
        .notify(Notice::success(format!("Exported {}", path.display())));
    Ok(())
}

async fn edit_item(ctx: &Context, target: &Target, position: usize, fields: ItemFields) -> Result<()> {
    let editor = load(ctx, target).await?;
    let report = loaded(&editor).await?;
    let index = index_from_position(position, report.checklist.len(), "checklist item")?;
    let id = report
        .checklist_id(index)
        .ok_or_else(|| anyhow!("No checklist item #{}", position))?;

    let mut draft = editor.edit_checklist_item(id).await?;
    let fields = if fields.is_empty() {
        ItemFields::prompt(&draft.item)?
    } else {
        fields
    };
    fields.apply(&mut draft.item);

    editor.save_checklist_item(&draft).await?;
    Ok(())
}

async fn load(ctx: &Context, target: &Target) -> Result<ReportEditor> {
    let editor = ReportEditor::new(
        target.key(),
        ctx.service.clone(),
        ctx.notifier.clone(),
        ctx.confirmer.clone(),
    );
    editor.fetch().await?;
    Ok(editor)
}

async fn loaded(editor: &ReportEditor) -> Result<EditableReport> {
    match editor.state().await {
        EditorState::Ready(report) => Ok(report),
        other => bail!("Report {} is not available ({:?})", editor.key().ticket_id, other),
    }
}

fn edit(prompt: &str, current: &str) -> Result<String> {
    Ok(Text::new(prompt).with_initial_value(current).prompt()?)
}
