use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchpadError {
    /// A required external service URL is not configured.
    #[error("{0} not configured")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    /// Remote service answered with a non-2xx status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Chat not found")]
    ChatNotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LaunchpadError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LaunchpadError>;
