//! Error taxonomy shared across the session engine.

use thiserror::Error;

/// Errors raised by shell session primitives.
///
/// These surface as a populated `error` field on the resulting
/// [`StepEvent`](crate::StepEvent); the session itself continues so the
/// oracle can decide how to recover (typically by reconnecting).
#[derive(Debug, Error)]
pub enum SessionError {
    /// TCP or SSH-level connection failure.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The server rejected the supplied credentials.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// A shell channel was required but none exists and creation failed.
    #[error("shell unavailable: {0}")]
    ShellUnavailable(String),
    /// I/O failure on an open shell channel.
    #[error("shell channel error: {0}")]
    Channel(String),
}

/// Errors raised at the oracle boundary.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle endpoint could not be reached or returned a non-success
    /// status.
    #[error("oracle request failed: {0}")]
    Transport(String),
    /// The oracle answered, but the payload does not match the expected
    /// action schema. Recoverable: the controller skips the iteration.
    #[error("invalid oracle response: {0}")]
    InvalidResponse(String),
    /// The oracle returned no content at all.
    #[error("oracle returned an empty response")]
    Empty,
}
