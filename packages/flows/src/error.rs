use a11y_client::ClientError;
use thiserror::Error;

pub type FlowResult<T> = Result<T, FlowError>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("A request is already in flight")]
    Busy,

    #[error("Result discarded: a newer request superseded it")]
    Stale,

    #[error("No report is loaded")]
    NotLoaded,

    #[error("Unknown item: {0}")]
    UnknownItem(String),
}

impl FlowError {
    /// Check if local validation rejected the input before any request
    pub fn is_validation(&self) -> bool {
        matches!(self, FlowError::Client(ClientError::Validation(_)))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FlowError::Client(e) if e.is_not_found())
    }
}
