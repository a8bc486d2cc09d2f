/// Result alias used throughout the crate.
pub type Result<T, E = GlueError> = std::result::Result<T, E>;

/// Everything that can go wrong between the page, the cell widget and the STL server.
#[derive(Debug, thiserror::Error)]
pub enum GlueError {
    #[error("`{url}` answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to `{url}` failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("page element `{0}` is missing")]
    MissingElement(String),
    #[error("DOM operation failed: {0}")]
    Dom(String),
    #[error("computation cell error: {0}")]
    Cell(String),
    #[error("an STL export is already in flight")]
    ExportInFlight,
    #[error("load of `{0}` was superseded by a newer load")]
    Superseded(String),
    #[error("unknown model `{0}`")]
    UnknownModel(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GlueError {
    fn from(e: serde_json::Error) -> Self {
        GlueError::Config(e.to_string())
    }
}
