//! Credentials for the remote transport and elevation prompts.

use std::fmt;

/// Host, port, username and secret for one remote machine.
///
/// The same secret authenticates the transport and answers elevation
/// prompts (`sudo`) mid-command.
#[derive(Clone)]
pub struct Credentials {
    /// Remote host name or address.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Login username.
    pub username: String,
    /// Login password, also injected in response to credential prompts.
    pub secret: String,
}

impl Credentials {
    /// Create credentials for `username@host:port`.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// The `host:port` pair for connecting.
    #[must_use]
    pub fn address(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
}

// Manual impl so the secret never lands in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}
