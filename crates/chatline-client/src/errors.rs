/// Failure reported by a [`Transport`](crate::transport::Transport)
/// implementation before it is classified for the public API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    /// The request could not be sent or the connection failed.
    #[error("request failed: {0}")]
    Send(String),
    /// Reading the response body failed after the status line arrived.
    #[error("body read failed: {0}")]
    Read(String),
}

impl TransportFailure {
    /// Returns the human-readable message for this failure.
    pub fn message(&self) -> &str {
        match self {
            Self::Send(message) | Self::Read(message) => message,
        }
    }
}

/// Top-level error type returned by every client operation.
///
/// Only `Cancelled` and the transport/server variants are expected in normal
/// operation. Frames that fail to decode never surface here; the dispatcher
/// recovers from them internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    /// The caller aborted the operation. Not an error worth reporting.
    #[error("cancelled")]
    Cancelled,
    /// The stream endpoint rejected the request or the stream broke.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },
    /// A batch endpoint answered with a non-success status.
    #[error("server error: {message}")]
    Server {
        message: String,
        status: Option<u16>,
    },
    /// A success response carried a body that did not match its envelope.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl ChatError {
    pub(crate) fn transport(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Transport {
            message: message.into(),
            status,
        }
    }

    pub(crate) fn server(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Server {
            message: message.into(),
            status,
        }
    }

    /// True when the caller aborted the operation.
    ///
    /// Callers use this to skip error reporting for user-initiated stops.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status attached to the failure, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } | Self::Server { status, .. } => *status,
            _ => None,
        }
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { message, .. } | Self::Server { message, .. } => message.clone(),
            Self::Cancelled => "cancelled".to_string(),
            Self::Protocol(message) | Self::Config(message) => message.clone(),
        }
    }
}

/// Extracts the failure reason from a `{"error": ...}` envelope.
///
/// Accepts a plain string or an object carrying `message`. Returns `None` for
/// bodies that are not JSON or carry no usable reason.
pub(crate) fn error_message_from_body(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let error = value.get("error")?;
    let message = error
        .as_str()
        .or_else(|| error.get("message").and_then(|v| v.as_str()))?;
    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
