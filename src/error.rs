use thiserror::Error;

/// Errors that can occur while standing up or running the agent pipeline.
///
/// This is distinct from the per-line [`crate::wire::RejectReason`] taxonomy:
/// those are expected, per-line outcomes counted in [`crate::stats::Stats`];
/// `AgentError` covers setup and I/O failures that are fatal to a stage.
#[derive(Error, Debug)]
pub enum AgentError {
    /// A custom error with a free-form message.
    #[error("agent error: {0}")]
    Custom(String),

    /// An I/O error from the standard library, e.g. failure to bind the
    /// listener socket or open the debug dump file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to construct an HDR histogram with the configured bounds.
    #[error("histogram creation error: {0}")]
    HistogramCreation(#[from] hdrhistogram::CreationError),
}

impl From<String> for AgentError {
    fn from(value: String) -> Self {
        Self::Custom(value)
    }
}

impl From<&str> for AgentError {
    fn from(value: &str) -> Self {
        Self::Custom(value.to_string())
    }
}

/// Result type for agent setup/runtime operations.
pub type AgentResult<T> = Result<T, AgentError>;
