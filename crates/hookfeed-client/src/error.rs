/// Failure of a request against the event server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request never reached the server or the response never arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status or an `error` field.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The body was not the expected JSON structure.
    #[error("malformed response: {0}")]
    Payload(String),
}

impl FetchError {
    /// Stable code used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Server { .. } => "server",
            Self::Payload(_) => "payload",
        }
    }

    /// Message suitable for a user-facing notification.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Transport(m) | Self::Payload(m) => m,
            Self::Server { message, .. } => message,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Payload(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
