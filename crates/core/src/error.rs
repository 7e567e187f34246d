/// Domain error for every stage of a render.
///
/// None of these are recovered locally: any variant aborts the remaining
/// stages of the request and is mapped to a single HTTP response by the API
/// crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Command failed: {command}: {stderr}")]
    CommandExecution { command: String, stderr: String },

    #[error("Could not determine media duration of {path}")]
    DurationUnavailable { path: String },

    #[error("Command timed out after {timeout_secs}s: {command}")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Unexpected(err.to_string())
    }
}
