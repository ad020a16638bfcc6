//! russh-backed shell session: one transport, one interactive shell.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client;
use russh::keys::PublicKey;
use shell_pilot_core::{
    CloseShellOutcome, CommandOutcome, ConnectOutcome, Credentials, DisconnectOutcome,
    InterruptOutcome, SessionError, ShellCreateOutcome, ShellDriver,
};

use crate::command::{CTRL_C, drain_startup_output, drive_command};
use crate::stream::{RusshStream, ShellStream};

/// Accepts whatever host key the server presents.
///
/// The engine trusts unknown remote hosts by design; this is the named
/// security trade-off of the system, not an oversight.
struct AutoAcceptHandler;

impl client::Handler for AutoAcceptHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, _server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// One authenticated SSH transport plus one interactive shell channel.
///
/// Both handles are exclusively owned; all operations run on the caller's
/// task. Cleanup is explicit via [`ShellDriver::disconnect`] /
/// [`ShellDriver::close_shell`] rather than drop glue, so every exit path
/// of the owning controller can guarantee the release happened.
pub struct ShellSession {
    session_id: String,
    credentials: Credentials,
    handle: Option<client::Handle<AutoAcceptHandler>>,
    shell: Option<Box<dyn ShellStream>>,
}

impl ShellSession {
    /// Create a disconnected session for one remote machine.
    #[must_use]
    pub fn new(session_id: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            session_id: session_id.into(),
            credentials,
            handle: None,
            shell: None,
        }
    }

    /// Whether the transport is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether an interactive shell is currently open.
    #[must_use]
    pub fn has_shell(&self) -> bool {
        self.shell.is_some()
    }

    /// The label identifying this session in events and logs.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn open_shell_channel(&mut self) -> Result<Box<dyn ShellStream>, SessionError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| SessionError::ShellUnavailable("transport not connected".to_string()))?;

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| SessionError::ShellUnavailable(e.to_string()))?;
        channel
            .request_pty(false, "xterm", 80, 24, 0, 0, &[])
            .await
            .map_err(|e| SessionError::ShellUnavailable(e.to_string()))?;
        channel
            .request_shell(true)
            .await
            .map_err(|e| SessionError::ShellUnavailable(e.to_string()))?;

        Ok(Box::new(RusshStream::new(channel)))
    }

    #[cfg(test)]
    pub(crate) fn inject_shell(&mut self, shell: Box<dyn ShellStream>) {
        self.shell = Some(shell);
    }
}

#[async_trait]
impl ShellDriver for ShellSession {
    async fn connect(&mut self) -> Result<ConnectOutcome, SessionError> {
        if self.handle.is_some() {
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        let config = Arc::new(client::Config::default());
        let mut handle = client::connect(config, self.credentials.address(), AutoAcceptHandler)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        let auth = handle
            .authenticate_password(&self.credentials.username, &self.credentials.secret)
            .await
            .map_err(|e| SessionError::Auth(e.to_string()))?;
        if !auth.success() {
            return Err(SessionError::Auth(format!(
                "server rejected password for {}",
                self.credentials.username
            )));
        }

        self.handle = Some(handle);
        tracing::info!(session = %self.session_id, "transport connected");

        // Connect implies an open shell; a shell failure here is the
        // connect's failure, but the transport stays up so the oracle can
        // retry shell_create on its own.
        self.create_shell().await?;
        Ok(ConnectOutcome::Connected)
    }

    async fn disconnect(&mut self) -> DisconnectOutcome {
        if self.shell.is_some() {
            self.close_shell().await;
        }

        match self.handle.take() {
            Some(handle) => {
                if let Err(e) = handle
                    .disconnect(russh::Disconnect::ByApplication, "", "English")
                    .await
                {
                    tracing::debug!(session = %self.session_id, "disconnect exchange failed: {e}");
                }
                tracing::info!(session = %self.session_id, "transport disconnected");
                DisconnectOutcome::Disconnected
            }
            None => DisconnectOutcome::NotConnected,
        }
    }

    async fn create_shell(&mut self) -> Result<ShellCreateOutcome, SessionError> {
        if self.shell.is_some() {
            return Ok(ShellCreateOutcome::AlreadyOpen);
        }

        let mut shell = self.open_shell_channel().await?;
        drain_startup_output(shell.as_mut()).await;
        self.shell = Some(shell);
        tracing::info!(session = %self.session_id, "shell channel ready");
        Ok(ShellCreateOutcome::Created)
    }

    async fn close_shell(&mut self) -> CloseShellOutcome {
        match self.shell.take() {
            Some(mut shell) => {
                if let Err(e) = shell.close().await {
                    tracing::debug!(session = %self.session_id, "shell close failed: {e}");
                }
                CloseShellOutcome::Closed
            }
            None => CloseShellOutcome::NothingToClose,
        }
    }

    async fn send_command(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<CommandOutcome, SessionError> {
        if self.shell.is_none() {
            self.create_shell().await?;
        }
        let secret = self.credentials.secret.clone();
        let Some(shell) = self.shell.as_mut() else {
            return Err(SessionError::ShellUnavailable(
                "shell closed before command dispatch".to_string(),
            ));
        };

        drive_command(shell.as_mut(), command, &secret, timeout).await
    }

    async fn interrupt(&mut self) -> Result<InterruptOutcome, SessionError> {
        match self.shell.as_mut() {
            Some(shell) => {
                shell.send(&[CTRL_C]).await?;
                Ok(InterruptOutcome::Sent)
            }
            None => Ok(InterruptOutcome::NoShell),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamEvent;
    use crate::stream::testutil::FakeStream;

    fn session() -> ShellSession {
        ShellSession::new("test", Credentials::new("example.com", 22, "pilot", "hunter2"))
    }

    #[tokio::test]
    async fn close_shell_twice_is_a_distinguishable_noop() {
        let mut session = session();
        session.inject_shell(Box::new(FakeStream::new([])));

        assert_eq!(session.close_shell().await, CloseShellOutcome::Closed);
        assert_eq!(session.close_shell().await, CloseShellOutcome::NothingToClose);
    }

    #[tokio::test]
    async fn interrupt_without_shell_reports_no_shell() {
        let mut session = session();
        assert!(matches!(
            session.interrupt().await,
            Ok(InterruptOutcome::NoShell)
        ));
    }

    #[tokio::test]
    async fn disconnect_when_never_connected_is_tolerated() {
        let mut session = session();
        assert_eq!(session.disconnect().await, DisconnectOutcome::NotConnected);
    }

    #[tokio::test]
    async fn send_command_without_transport_is_shell_unavailable() {
        let mut session = session();
        let err = session
            .send_command("ls", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ShellUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn send_command_uses_the_open_shell() {
        let mut session = session();
        session.inject_shell(Box::new(FakeStream::new([StreamEvent::Data(
            b"ls\nfile1\nuser@host:~$ ".to_vec(),
        )])));

        let outcome = session
            .send_command("ls", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(outcome.output(), "file1");
    }

    #[tokio::test]
    async fn interrupt_with_shell_sends_ctrl_c() {
        let mut session = session();
        session.inject_shell(Box::new(FakeStream::new([])));
        assert!(matches!(
            session.interrupt().await,
            Ok(InterruptOutcome::Sent)
        ));
    }
}
