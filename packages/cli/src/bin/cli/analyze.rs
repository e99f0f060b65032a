// ABOUTME: CLI commands for submitting tickets and user stories for analysis
// ABOUTME: Missing fields are prompted for; validation happens in the analyze flow

use a11y_cli::Context;
use a11y_client::StoryMetadata;
use a11y_flows::{AnalyzeFlow, AnalyzeForm, AnalyzeMode};
use anyhow::{bail, Result};
use clap::Subcommand;
use colored::*;
use inquire::Text;

use super::utils::parse_key_val;

#[derive(Subcommand)]
pub enum AnalyzeCommands {
    /// Analyze a ticket by its link
    Jira {
        /// Ticket link
        #[arg(short, long)]
        link: Option<String>,
        /// Ticket summary
        #[arg(short, long)]
        summary: Option<String>,
        /// Ticket description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Analyze a user story with optional metadata
    Story {
        /// Ticket ID, e.g. A11Y-2053
        #[arg(short = 'i', long)]
        ticket_id: Option<String>,
        /// Story summary
        #[arg(short, long)]
        summary: Option<String>,
        /// Story description
        #[arg(short, long)]
        description: Option<String>,
        /// Metadata entry; repeatable (Project, Pillar, Assignee, Team, "Fix Version")
        #[arg(short, long = "meta", value_parser = parse_key_val)]
        metadata: Vec<(String, String)>,
    },
}

pub async fn handle_analyze_command(ctx: &Context, command: AnalyzeCommands) -> Result<()> {
    let form = match command {
        AnalyzeCommands::Jira {
            link,
            summary,
            description,
        } => {
            println!("{}", "🔎 Analyze Ticket".blue().bold());
            let mut form = AnalyzeForm::new(AnalyzeMode::TicketReference);
            form.ticket_link = prompt_if_missing(link, "Ticket link:")?;
            form.summary = prompt_if_missing(summary, "Summary:")?;
            form.description = prompt_if_missing(description, "Description:")?;
            form
        }
        AnalyzeCommands::Story {
            ticket_id,
            summary,
            description,
            metadata,
        } => {
            println!("{}", "🔎 Analyze User Story".blue().bold());
            let mut form = AnalyzeForm::new(AnalyzeMode::UserStory);
            form.ticket_id = prompt_if_missing(ticket_id, "Ticket ID:")?;
            form.summary = prompt_if_missing(summary, "Summary:")?;
            form.description = prompt_if_missing(description, "Description:")?;
            for (key, value) in metadata {
                if !form.set(&key, value) {
                    bail!(
                        "Unknown metadata key {:?} (expected one of: {})",
                        key,
                        StoryMetadata::KEYS.join(", ")
                    );
                }
            }
            form
        }
    };

    println!("{}", "Analyzing... this can take a few minutes".dimmed());
    let flow = AnalyzeFlow::new(ctx.service.clone(), ctx.notifier.clone());
    flow.submit(&form).await?;
    Ok(())
}

fn prompt_if_missing(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Text::new(prompt).prompt()?),
    }
}
