use launchpad_core::LaunchpadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrewClientError {
    #[error("{0} not configured")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed payload: {0}")]
    Decode(String),

    /// The driver was asked to run a second time.
    #[error("analysis already started")]
    AlreadyStarted,
}

impl From<LaunchpadError> for CrewClientError {
    fn from(e: LaunchpadError) -> Self {
        match e {
            LaunchpadError::Config(what) => CrewClientError::Config(what),
            LaunchpadError::Validation(msg) => CrewClientError::Validation(msg),
            LaunchpadError::Upstream { status, message } => {
                CrewClientError::Upstream { status, message }
            }
            LaunchpadError::Transport(msg) => CrewClientError::Transport(msg),
            other => CrewClientError::Decode(other.to_string()),
        }
    }
}
