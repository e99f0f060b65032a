use clap::{Parser, Subcommand};
use colored::*;
use std::process;

mod cli;

use a11y_cli::{init_tracing, is_reported, Context, Overrides};
use cli::analyze::AnalyzeCommands;
use cli::defect::DefectArgs;
use cli::reports::ReportsCommands;
use cli::settings::SettingsCommands;

#[derive(Parser)]
#[command(name = "a11y")]
#[command(about = "A11y Insights CLI - accessibility analysis for tickets and user stories")]
#[command(version)]
struct Cli {
    /// Service base URL (overrides settings and A11Y_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token sent with every request (overrides A11Y_API_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a ticket or user story for accessibility analysis
    #[command(subcommand)]
    Analyze(AnalyzeCommands),
    /// Generate markdown documentation for accessibility defects
    Defect(DefectArgs),
    /// Browse, edit and delete reports
    #[command(subcommand)]
    Reports(ReportsCommands),
    /// Summary figures and the most recent reports
    Dashboard {
        /// Platform to summarise (defaults to the configured platform)
        #[arg(short, long)]
        platform: Option<String>,
        /// Summarise iOS, Android and Web together
        #[arg(long, conflicts_with = "platform")]
        all_platforms: bool,
    },
    /// Show or change persisted settings
    #[command(subcommand)]
    Settings(SettingsCommands),
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = handle_command(cli).await {
        if !is_reported(&e) {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        process::exit(1);
    }
}

async fn handle_command(cli: Cli) -> anyhow::Result<()> {
    let overrides = Overrides {
        api_url: cli.api_url,
        token: cli.token,
        platform: None,
        timeout_secs: cli.timeout,
    };

    // settings must stay usable while the service configuration is broken
    let command = match cli.command {
        Commands::Settings(settings_cmd) => {
            return cli::settings::handle_settings_command(settings_cmd, &overrides).await
        }
        other => other,
    };

    let ctx = Context::load(&overrides, cli.yes).await?;

    match command {
        Commands::Analyze(analyze_cmd) => cli::analyze::handle_analyze_command(&ctx, analyze_cmd).await,
        Commands::Defect(args) => cli::defect::handle_defect_command(&ctx, args).await,
        Commands::Reports(reports_cmd) => cli::reports::handle_reports_command(&ctx, reports_cmd).await,
        Commands::Dashboard {
            platform,
            all_platforms,
        } => cli::dashboard::show_dashboard(&ctx, platform, all_platforms).await,
        Commands::Settings(_) => Ok(()),
    }
}
