use hamro_core::error::CoreError;
use hamro_session::SessionError;

/// Error type for every gateway call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A protected call was attempted without a stored token. No request
    /// was sent.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The backend answered with a non-2xx status. `message` is the
    /// server's `detail` or the operation's fallback text.
    #[error("{message}")]
    ServerRejected { status: u16, message: String },

    /// The request never produced a response (refused, reset, DNS, TLS,
    /// timeout).
    #[error("Could not reach the server: {0}")]
    Connectivity(#[from] reqwest::Error),

    /// Client-side input check failed before any request.
    #[error("{0}")]
    Validation(String),

    /// A 2xx body did not match the expected model.
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be built (TLS backend, builder options).
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),
}

/// Coarse classification used by callers deciding how to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthenticationRequired,
    ServerRejected,
    Connectivity,
    Validation,
    /// Local faults: undecodable responses, storage, bad configuration.
    Internal,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::AuthenticationRequired => ErrorKind::AuthenticationRequired,
            ApiError::ServerRejected { .. } => ErrorKind::ServerRejected,
            ApiError::Connectivity(_) => ErrorKind::Connectivity,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Decode(_)
            | ApiError::Session(_)
            | ApiError::InvalidUrl(_)
            | ApiError::ClientSetup(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status of a server rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ServerRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ApiError::Validation(msg),
            other @ CoreError::InvalidField { .. } => ApiError::Decode(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
