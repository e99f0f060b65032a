// ABOUTME: Terminal implementations of the notification and confirmation seams
// ABOUTME: Notices go to stderr so streamed output on stdout stays clean

use a11y_flows::{Confirmer, Notice, NoticeAction, NoticeLevel, Notifier};
use colored::*;
use inquire::Confirm;

pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("{}", render(&notice));
        if let Some(NoticeAction::ViewReport { ticket_id }) = &notice.action {
            eprintln!(
                "  {} {}",
                "View report:".dimmed(),
                format!("a11y reports show {}", ticket_id).cyan()
            );
        }
    }
}

pub fn render(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Success => format!("{} {}", "✓".green().bold(), notice.message.green()),
        NoticeLevel::Info => format!("{} {}", "ℹ".cyan(), notice.message),
        NoticeLevel::Warning => format!("{} {}", "⚠".yellow(), notice.message.yellow()),
        NoticeLevel::Error => format!("{} {}", "✗".red().bold(), notice.message.red()),
    }
}

/// Prompts on the terminal unless `--yes` was given
pub struct InquireConfirmer {
    assume_yes: bool,
}

impl InquireConfirmer {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirmer for InquireConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        // an interrupted or failed prompt counts as "no"
        Confirm::new(prompt)
            .with_default(false)
            .prompt()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_keeps_message() {
        colored::control::set_override(false);
        assert_eq!(render(&Notice::error("Failed to delete report.")), "✗ Failed to delete report.");
        assert_eq!(render(&Notice::success("Saved")), "✓ Saved");
    }

    #[test]
    fn test_assume_yes_skips_prompt() {
        assert!(InquireConfirmer::new(true).confirm("Delete?"));
    }
}
