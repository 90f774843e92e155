use advisor_core::error::WorkflowError;
use thiserror::Error;

/// Dispatch errors.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    #[error("Approval required but {0} is missing from the request")]
    MissingField(&'static str),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}
