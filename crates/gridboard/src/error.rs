use gridboard_layout::LayoutError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GridboardError>;

#[derive(Debug, Error)]
pub enum GridboardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("layout store returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl GridboardError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => 2,
            Self::Layout(_) => 3,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Whether this is a transport or storage failure, which load and save
    /// tolerate instead of propagating.
    #[must_use]
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Json(_) | Self::Http(_) | Self::Status { .. }
        )
    }
}
