//! Email provider contract and the HTTP API transports.

mod postmark;
mod sendgrid;

use async_trait::async_trait;

use crate::error::TransportError;

pub use postmark::PostmarkTransport;
pub use sendgrid::SendGridTransport;

/// Fixed sender identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub address: String,
    pub name: String,
}

impl Sender {
    /// `Name <address>`, or the bare address when the name is blank.
    #[must_use]
    pub fn mailbox(&self) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            self.address.clone()
        } else {
            format!("{} <{}>", name.replace(['<', '>', '"'], ""), self.address)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// One email provider.
///
/// Implementations make a single attempt and never retry; the gateway owns
/// deadlines and failover. Click tracking must be disabled so report links
/// are delivered untouched.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Sends `email` from `sender`, returning the provider's message id when
    /// it reports one.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network failure or when the provider
    /// refuses the message.
    async fn send(
        &self,
        sender: &Sender,
        email: &OutgoingEmail,
    ) -> Result<Option<String>, TransportError>;
}

/// Keeps provider error bodies short enough for logs and error envelopes.
fn clip(body: &str) -> String {
    const MAX_CHARS: usize = 300;
    body.chars().take(MAX_CHARS).collect()
}
