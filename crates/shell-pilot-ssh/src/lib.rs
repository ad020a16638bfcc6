//! Interactive SSH shell sessions for the session engine.
//!
//! Provides:
//! - `ShellSession` - russh-backed implementation of `ShellDriver`
//! - Prompt/credential heuristics and output sanitization
//! - The command-completion polling loop over a testable stream seam

pub mod command;
pub mod session;
pub mod stream;
pub mod text;

pub use session::ShellSession;
pub use stream::{ShellStream, StreamEvent};
