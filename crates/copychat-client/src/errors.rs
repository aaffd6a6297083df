/// Errors returned by the client API.
///
/// Malformed frames inside a stream are recovered by the decoder and never
/// reach this type; unresolvable history records are silently skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Connection, timeout, or stream I/O failure.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// The API answered with a non-success HTTP status.
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },
    /// The run itself failed (explicit error event from the provider).
    #[error("run failed: {message}")]
    Run { message: String },
    /// Response shape or event sequencing was invalid.
    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl ClientError {
    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an HTTP-level error for a non-success status.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a run-failure error carrying the provider's message.
    pub fn run(message: impl Into<String>) -> Self {
        Self::Run {
            message: message.into(),
        }
    }

    /// Creates a protocol-level error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(message) => message,
            Self::Transport { message }
            | Self::Api { message, .. }
            | Self::Run { message }
            | Self::Protocol { message } => message,
        }
    }
}
