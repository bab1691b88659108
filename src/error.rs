/// Errors returned by the portal clients and the session store.
///
/// The variants split into three families callers branch on:
/// transport (`Transport`, `Status`) means "retry later",
/// input (`Validation`, `Rejected`) means "fix your input",
/// and `Unauthorized` means "log in again".
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{operation} failed with HTTP {status}: {detail}")]
    Status {
        operation: &'static str,
        status: u16,
        detail: String,
    },

    /// Envelope `code == 0`. `message` comes from the service and is user-facing.
    #[error("{message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{operation} requires a valid session")]
    Unauthorized { operation: &'static str },

    #[error("{operation} returned an unreadable response: {detail}")]
    Decode {
        operation: &'static str,
        detail: String,
    },

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the request never produced an application answer.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            #[cfg(feature = "client")]
            Self::Transport(_) => true,
            Self::Status { .. } => true,
            _ => false,
        }
    }

    /// True when the caller should send the user back to the login entry point.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
