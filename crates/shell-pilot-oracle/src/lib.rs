//! OpenAI-compatible oracle gateway.
//!
//! Provides:
//! - `OpenAiOracle` - chat-completions client implementing the `Oracle` trait
//! - Wire types and the JSON-schema response constraint
//! - System prompt template loading and rendering

pub mod client;
pub mod prompt;
pub mod wire;

pub use client::{OpenAiOracle, OracleConfig};
pub use prompt::{load_template, render_system_prompt};
