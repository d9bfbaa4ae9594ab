use std::fmt;

use thiserror::Error;

/// Failure taxonomy shared by the embedding, retrieval and chat clients.
///
/// The public soft methods (`embed`, `retrieve`, `complete`) collapse every
/// variant to an empty vector, empty string or `None`. The `try_*` methods
/// surface the variant so callers and tests can tell "nothing matched" apart
/// from "the service was misconfigured or unreachable".
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required credential or connection string is absent.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Network-level failure: connect error, timeout, broken stream.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote service answered with a non-success status code.
    #[error("unexpected status code {code}")]
    Status { code: u16 },

    /// The response body did not contain the expected fields.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl PipelineError {
    pub fn transport(err: impl fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn malformed(err: impl fmt::Display) -> Self {
        Self::MalformedResponse(err.to_string())
    }

    /// True when the failure is a configuration gap rather than a runtime
    /// fault of the remote service.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
