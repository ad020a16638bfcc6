//! The command-completion polling loop.
//!
//! Completion is inferred, not signaled: the loop accumulates raw bytes
//! and decides the command is done when the trailing line looks like a
//! shell prompt or the remote reports an exit status. A command that never
//! produces either is interrupted once its budget expires and reported as
//! a typed timeout outcome with whatever output was captured.

use std::time::Duration;

use shell_pilot_core::{CommandOutcome, SessionError};
use tokio::time::Instant;

use crate::stream::{ShellStream, StreamEvent};
use crate::text::{contains_credential_prompt, is_prompt_line, last_line, sanitize_output};

/// Granularity of the completion poll.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Settle before draining banner output from a fresh shell.
pub(crate) const SHELL_SETTLE: Duration = Duration::from_secs(1);

/// Settle after draining, before the shell accepts its first command.
pub(crate) const SHELL_READY_SETTLE: Duration = Duration::from_millis(500);

/// Grace period for an interrupt byte to take effect.
pub(crate) const INTERRUPT_SETTLE: Duration = Duration::from_millis(100);

/// The interrupt control byte (Ctrl+C).
pub(crate) const CTRL_C: u8 = 0x03;

/// Write `command` to the shell and poll until completion or timeout.
///
/// The credential secret is injected at most once per invocation when a
/// credential-prompt marker appears in the accumulated buffer; the
/// injection is never treated as command output.
///
/// # Errors
/// Returns [`SessionError::Channel`] on channel I/O failure. A timeout is
/// not an error: it yields [`CommandOutcome::TimedOut`].
pub async fn drive_command<S: ShellStream + ?Sized>(
    stream: &mut S,
    command: &str,
    secret: &str,
    timeout: Duration,
) -> Result<CommandOutcome, SessionError> {
    stream.send(format!("{command}\n").as_bytes()).await?;

    let start = Instant::now();
    let mut buffer = String::new();
    let mut secret_sent = false;

    loop {
        match stream.poll_chunk(POLL_INTERVAL).await? {
            StreamEvent::Data(bytes) => {
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                if !secret_sent && contains_credential_prompt(&buffer) {
                    stream.send(format!("{secret}\n").as_bytes()).await?;
                    secret_sent = true;
                } else if is_prompt_line(last_line(&buffer)) {
                    break;
                }
            }
            StreamEvent::Exited(status) => {
                tracing::debug!(status, "remote reported exit status");
                break;
            }
            StreamEvent::Closed => {
                tracing::debug!("shell channel closed while waiting for completion");
                break;
            }
            StreamEvent::Idle => {}
        }

        if start.elapsed() >= timeout {
            stream.send(&[CTRL_C]).await?;
            tokio::time::sleep(INTERRUPT_SETTLE).await;
            return Ok(CommandOutcome::TimedOut {
                output: sanitize_output(&buffer, command),
                timeout,
            });
        }
    }

    Ok(CommandOutcome::Completed {
        output: sanitize_output(&buffer, command),
    })
}

/// Drain login banner/MOTD output from a freshly opened shell.
///
/// A fixed settle lets the banner start arriving, a read loop consumes it
/// while available, and a short final settle leaves the prompt ready.
/// Without this, banner text corrupts the first command's output.
pub async fn drain_startup_output<S: ShellStream + ?Sized>(stream: &mut S) {
    tokio::time::sleep(SHELL_SETTLE).await;
    loop {
        match stream.poll_chunk(POLL_INTERVAL).await {
            Ok(StreamEvent::Data(bytes)) => {
                tracing::trace!(len = bytes.len(), "discarded banner bytes");
            }
            Ok(StreamEvent::Idle | StreamEvent::Closed | StreamEvent::Exited(_)) | Err(_) => break,
        }
    }
    tokio::time::sleep(SHELL_READY_SETTLE).await;
}
