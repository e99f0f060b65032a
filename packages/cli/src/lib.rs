//! Shared plumbing for the `a11y` command-line front end

pub mod config;
pub mod terminal;

use std::sync::Arc;

use a11y_client::{A11yClient, ClientConfig, ReportService, Settings};
use a11y_flows::{Confirmer, FlowError, Notifier, QuietNotifier};
use tracing_subscriber::EnvFilter;

pub use config::{apply_setting, resolve, Overrides};
pub use terminal::{InquireConfirmer, TerminalNotifier};

/// Initialise logging on stderr. `RUST_LOG` applies unless `verbose` is set.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // a second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Everything a command needs to run a flow
pub struct Context {
    pub settings: Settings,
    pub config: ClientConfig,
    pub service: Arc<dyn ReportService>,
    pub notifier: Arc<dyn Notifier>,
    pub confirmer: Arc<dyn Confirmer>,
}

impl Context {
    pub async fn load(overrides: &Overrides, assume_yes: bool) -> anyhow::Result<Self> {
        let settings = Settings::load().await?;
        Self::with_settings(settings, overrides, assume_yes)
    }

    pub fn with_settings(
        settings: Settings,
        overrides: &Overrides,
        assume_yes: bool,
    ) -> anyhow::Result<Self> {
        let config = resolve(&settings, overrides)?;
        let service: Arc<dyn ReportService> = Arc::new(A11yClient::new(&config)?);
        Ok(Self {
            notifier: notifier_for(&settings),
            confirmer: Arc::new(InquireConfirmer::new(assume_yes)),
            settings,
            config,
            service,
        })
    }

    pub fn platform_or_default(&self, platform: Option<String>) -> String {
        platform.unwrap_or_else(|| self.config.default_platform.clone())
    }
}

pub fn notifier_for(settings: &Settings) -> Arc<dyn Notifier> {
    if settings.notifications {
        Arc::new(TerminalNotifier)
    } else {
        Arc::new(QuietNotifier::new(TerminalNotifier))
    }
}

/// Client failures inside a flow have already been shown as a notice
pub fn is_reported(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<FlowError>(), Some(FlowError::Client(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use a11y_client::ClientError;

    #[test]
    fn test_flow_client_errors_are_reported() {
        let reported = anyhow::Error::from(FlowError::Client(ClientError::Transport("x".into())));
        assert!(is_reported(&reported));

        let busy = anyhow::Error::from(FlowError::Busy);
        assert!(!is_reported(&busy));

        let plain = anyhow::anyhow!("No checklist item #9");
        assert!(!is_reported(&plain));
    }
}
