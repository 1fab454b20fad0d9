/// Failures surfaced to the person running push50.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    InvalidSlug(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Dependency(String),

    #[error("{0}")]
    Submission(String),

    #[error("Interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures talking to the network or to git. Callers translate these
/// before they reach the command layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http: {0}")]
    Http(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("git {command}: {stderr}")]
    Git { command: String, stderr: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<surf::Error> for TransportError {
    fn from(e: surf::Error) -> Self {
        Self::Http(e.to_string())
    }
}
