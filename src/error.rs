use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Failures surfaced by the conversion core.
///
/// The `Display` text is what a renderer shows for `Failed { reason }`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// No response reached us from the backend.
    #[error("Server unreachable: {0}. Is the conversion backend running?")]
    NetworkUnreachable(String),

    /// The request reached the backend but no answer came back in time.
    #[error("Request timed out: {0}. The backend may still be working on it; check YouTube Music before retrying")]
    RequestTimedOut(String),

    /// The backend answered with a failure.
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// A request/response payload did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A progress event could not be decoded.
    #[error("Could not decode progress event: {0}")]
    StreamDecodeError(String),

    #[error("Playlist not found: {0}")]
    PlaylistNotFound(String),

    #[error("Empty response received from server")]
    EmptyResponse,

    /// The progress stream dropped before the job reported completion.
    #[error("Progress stream interrupted: {0}")]
    ProgressStreamInterrupted(String),

    /// Caller bug, e.g. confirming without a selection.
    #[error("Precondition violated: {0}")]
    PreconditionViolation(&'static str),
}

impl ConvertError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        ConvertError::ServerError {
            status,
            message: message.into(),
        }
    }

    /// Programmer errors are never rendered to the user.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, ConvertError::PreconditionViolation(_))
    }

    /// Classify a transport failure that happened before any status was read.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ConvertError::server(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return ConvertError::MalformedResponse(err.to_string());
        }
        // a connect timeout never reached the server
        if err.is_timeout() && !err.is_connect() {
            return ConvertError::RequestTimedOut(err.to_string());
        }
        ConvertError::NetworkUnreachable(err.to_string())
    }
}
