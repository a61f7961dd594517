//! Error taxonomy for the conversion client.
//!
//! Three failure classes exist:
//! - `InvalidInput`: rejected before any request is sent (no file and no
//!   URL, malformed numbers, invariant violations caught at submit).
//! - `Transport`: a network or backend failure during one request; aborts
//!   that stage only, and carries the backend's human-readable message.
//! - `Busy`: an operation for the stage is already in flight; callers
//!   treat this as a no-op, never a queue.
//!
//! Field-scoped soft validation (crop numeric fields) is *not* an error:
//! it is reported as plain `FieldIssue` values by the crop editor and
//! never blocks other fields from updating.

use thiserror::Error;

/// Which backend request a transport failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Upload,
    FetchUrl,
    Analyze,
    Convert,
    Download,
}

impl RequestKind {
    pub fn label(self) -> &'static str {
        match self {
            RequestKind::Upload => "upload",
            RequestKind::FetchUrl => "URL processing",
            RequestKind::Analyze => "analysis",
            RequestKind::Convert => "conversion",
            RequestKind::Download => "download",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Client-facing error for the pipeline and backend client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// User input rejected before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network or backend failure during a pipeline stage. The message is
    /// surfaced verbatim to the user.
    #[error("{kind} failed: {message}")]
    Transport { kind: RequestKind, message: String },

    /// An operation for this stage is already in flight.
    #[error("{0} already in progress")]
    Busy(RequestKind),
}

impl ClientError {
    pub fn transport(kind: RequestKind, message: impl Into<String>) -> Self {
        ClientError::Transport {
            kind,
            message: message.into(),
        }
    }

    /// The message a user should see, without the error-class framing.
    pub fn surface_message(&self) -> String {
        match self {
            ClientError::InvalidInput(message) => message.clone(),
            ClientError::Transport { message, .. } => message.clone(),
            ClientError::Busy(kind) => format!("{} already in progress", kind),
        }
    }
}
