// ABOUTME: CLI command for streaming defect documentation
// ABOUTME: Prints markdown as it arrives and saves the finished document as a .md file

use std::io::Write;
use std::path::PathBuf;

use a11y_cli::Context;
use a11y_flows::{DefectFlow, DefectForm, DefectPhase, Notice};
use anyhow::Result;
use clap::Args;
use colored::*;
use tracing::debug;

#[derive(Args)]
pub struct DefectArgs {
    /// Platform and assistive technology, e.g. "Android/TalkBack"
    #[arg(short, long)]
    platform: Option<String>,
    /// Page or screen where the defects occur
    #[arg(long = "page")]
    page_or_screen: Option<String>,
    /// Free-text description of the defects
    #[arg(short, long)]
    defects: Option<String>,
    /// Directory for the generated markdown file
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
    /// Only print the document
    #[arg(long)]
    no_save: bool,
}

pub async fn handle_defect_command(ctx: &Context, args: DefectArgs) -> Result<()> {
    let mut form = DefectForm::default();
    if let Some(platform) = args.platform {
        form.platform = platform;
    }
    if let Some(page) = args.page_or_screen {
        form.page_or_screen = page;
    }
    if let Some(defects) = args.defects {
        form.defects = defects;
    }

    eprintln!(
        "{} {} on {}",
        "📝 Documenting defects for".blue().bold(),
        form.page_or_screen.cyan(),
        form.platform.cyan()
    );

    let flow = DefectFlow::new(ctx.service.clone());
    let mut updates = flow.subscribe();

    // prints only the new tail of every snapshot
    let printer = tokio::spawn(async move {
        let mut printed = 0;
        while let Some(snapshot) = updates.recv().await {
            if let Some(delta) = snapshot.markdown.get(printed..) {
                if !delta.is_empty() {
                    print!("{}", delta);
                    let _ = std::io::stdout().flush();
                    printed = snapshot.markdown.len();
                }
            }
            debug!("Defect phase: {:?}", snapshot.phase);
            if matches!(snapshot.phase, DefectPhase::Completed | DefectPhase::Failed) {
                break;
            }
        }
    });

    let result = flow.submit(&form).await;
    let failure = flow.snapshot().await.error;
    // closes the subscription if the run ended before a final snapshot
    drop(flow);
    let _ = printer.await;
    println!();

    match result {
        Ok(artifact) => {
            if args.no_save {
                return Ok(());
            }
            let path = artifact.write_to(&args.output).await?;
            ctx.notifier
                .notify(Notice::success(format!("Saved {}", path.display())));
            Ok(())
        }
        Err(e) => {
            let message = failure.unwrap_or_else(|| e.to_string());
            eprintln!("{} {}", "Defect documentation failed:".red().bold(), message);
            Err(e.into())
        }
    }
}
