//! Core abstractions for autonomous remote shell sessions.
//!
//! This crate provides the fundamental building blocks:
//! - `StepEvent` / `EventKind` - Typed record of one attempted action
//! - `EventLog` - Append-only history with bounding and windowing
//! - `NextAction` - Structured action proposed by the oracle
//! - `Credentials` - Transport and elevation-prompt credentials
//! - Oracle and ShellDriver traits

pub mod action;
pub mod credentials;
pub mod error;
pub mod event;
pub mod history;
pub mod traits;

pub use action::{CommandSpec, NextAction};
pub use credentials::Credentials;
pub use error::{OracleError, SessionError};
pub use event::{CommandKind, EventKind, StepEvent};
pub use history::{EventLog, HistoryWindow};
pub use traits::{
    CloseShellOutcome, CommandOutcome, ConnectOutcome, DisconnectOutcome, InterruptOutcome,
    Oracle, ShellCreateOutcome, ShellDriver,
};
