//! Session orchestration: the decision loop and end-of-run artifacts.
//!
//! Provides:
//! - `SessionController` - drive a shell session from oracle decisions
//! - `RunConfig` / `Pacing` - owned run configuration (no global state)
//! - Persistence of the event history and final summary

pub mod config;
pub mod controller;
pub mod persist;

pub use config::{Pacing, RunConfig};
pub use controller::{RunReport, SessionController};
