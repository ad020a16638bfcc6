//! The byte-stream seam between the completion loop and russh.

use std::time::Duration;

use async_trait::async_trait;
use russh::{Channel, ChannelMsg, client::Msg};
use shell_pilot_core::SessionError;

/// One observation from a bounded wait on the shell channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Nothing arrived within the wait window.
    Idle,
    /// Raw bytes from the remote shell.
    Data(Vec<u8>),
    /// The remote reported an exit status.
    Exited(u32),
    /// The channel is gone; no further data will arrive.
    Closed,
}

/// Minimal interface the completion loop needs from a shell channel.
///
/// The russh channel implements it for production; tests drive the loop
/// with a scripted stream instead of a live server.
#[async_trait]
pub trait ShellStream: Send {
    /// Wait up to `wait` for the next channel event.
    ///
    /// # Errors
    /// Returns [`SessionError::Channel`] on channel I/O failure.
    async fn poll_chunk(&mut self, wait: Duration) -> Result<StreamEvent, SessionError>;

    /// Write raw bytes to the remote shell.
    ///
    /// # Errors
    /// Returns [`SessionError::Channel`] if the write fails.
    async fn send(&mut self, bytes: &[u8]) -> Result<(), SessionError>;

    /// Close the channel.
    ///
    /// # Errors
    /// Returns [`SessionError::Channel`] if the close exchange fails.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// A russh shell channel behind the [`ShellStream`] seam.
pub struct RusshStream {
    channel: Channel<Msg>,
}

impl RusshStream {
    /// Wrap an opened shell channel.
    #[must_use]
    pub fn new(channel: Channel<Msg>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl ShellStream for RusshStream {
    async fn poll_chunk(&mut self, wait: Duration) -> Result<StreamEvent, SessionError> {
        match tokio::time::timeout(wait, self.channel.wait()).await {
            Err(_elapsed) => Ok(StreamEvent::Idle),
            Ok(None) => Ok(StreamEvent::Closed),
            Ok(Some(msg)) => Ok(match msg {
                ChannelMsg::Data { data } => StreamEvent::Data(data.to_vec()),
                ChannelMsg::ExtendedData { data, .. } => StreamEvent::Data(data.to_vec()),
                ChannelMsg::ExitStatus { exit_status } => StreamEvent::Exited(exit_status),
                ChannelMsg::Eof | ChannelMsg::Close => StreamEvent::Closed,
                // Replies to pty/shell requests, window adjusts, etc.
                _ => StreamEvent::Idle,
            }),
        }
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.channel
            .data(bytes)
            .await
            .map_err(|e| SessionError::Channel(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.channel
            .close()
            .await
            .map_err(|e| SessionError::Channel(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::VecDeque;

    use super::*;

    /// Scripted stream for exercising the completion loop without SSH.
    pub(crate) struct FakeStream {
        script: VecDeque<StreamEvent>,
        pub(crate) writes: Vec<Vec<u8>>,
    }

    impl FakeStream {
        pub(crate) fn new(script: impl IntoIterator<Item = StreamEvent>) -> Self {
            Self {
                script: script.into_iter().collect(),
                writes: Vec::new(),
            }
        }

        /// Bytes written by the loop, concatenated per write call.
        pub(crate) fn write_log(&self) -> &[Vec<u8>] {
            &self.writes
        }
    }

    #[async_trait]
    impl ShellStream for FakeStream {
        async fn poll_chunk(&mut self, wait: Duration) -> Result<StreamEvent, SessionError> {
            match self.script.pop_front() {
                Some(StreamEvent::Idle) | None => {
                    // Model "nothing available": the wait window elapses.
                    tokio::time::sleep(wait).await;
                    Ok(StreamEvent::Idle)
                }
                Some(event) => Ok(event),
            }
        }

        async fn send(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
            self.writes.push(bytes.to_vec());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), SessionError> {
            Ok(())
        }
    }
}
