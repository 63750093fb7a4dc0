//! Primary/secondary failover over [`EmailTransport`]s.

use std::sync::Arc;
use std::time::Duration;

use siteaudit_core::{AppConfig, ConfigError, EmailProvider};

use crate::error::{DeliveryError, TransportError};
use crate::transport::{
    EmailTransport, OutgoingEmail, PostmarkTransport, SendGridTransport, Sender,
};

/// Which provider accepted a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub provider: &'static str,
    pub message_id: Option<String>,
    pub used_fallback: bool,
}

pub struct DeliveryGateway {
    primary: Arc<dyn EmailTransport>,
    secondary: Option<Arc<dyn EmailTransport>>,
    fallback_enabled: bool,
    timeout: Duration,
    sender: Sender,
}

impl DeliveryGateway {
    #[must_use]
    pub fn new(primary: Arc<dyn EmailTransport>, sender: Sender, timeout: Duration) -> Self {
        Self {
            primary,
            secondary: None,
            fallback_enabled: false,
            timeout,
            sender,
        }
    }

    /// Registers the transport tried once when the primary fails.
    #[must_use]
    pub fn with_fallback(mut self, secondary: Arc<dyn EmailTransport>, enabled: bool) -> Self {
        self.secondary = Some(secondary);
        self.fallback_enabled = enabled;
        self
    }

    /// Builds the configured primary and (optional) secondary transports.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when a configured provider has
    /// no credential.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let sender = Sender {
            address: config.email_from_address.clone(),
            name: config.email_from_name.clone(),
        };
        let primary = build_transport(config, config.email_primary)?;
        let gateway = Self::new(
            primary,
            sender,
            Duration::from_secs(config.email_timeout_secs),
        );
        match config.email_secondary {
            Some(provider) if config.email_fallback_enabled => {
                let secondary = build_transport(config, provider)?;
                Ok(gateway.with_fallback(secondary, true))
            }
            _ => Ok(gateway),
        }
    }

    /// Sends `email` through the primary, falling back to the secondary at
    /// most once.
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::PrimaryFailed`]: the primary failed and no
    ///   fallback is available.
    /// - [`DeliveryError::AllTransportsFailed`]: both attempts failed.
    pub async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, DeliveryError> {
        let primary_err = match self.attempt(self.primary.as_ref(), email).await {
            Ok(message_id) => {
                return Ok(DeliveryReceipt {
                    provider: self.primary.name(),
                    message_id,
                    used_fallback: false,
                })
            }
            Err(e) => e,
        };

        let secondary = match (&self.secondary, self.fallback_enabled) {
            (Some(secondary), true) => secondary,
            _ => {
                tracing::error!(
                    provider = self.primary.name(),
                    error = %primary_err,
                    "email delivery failed with no fallback"
                );
                return Err(DeliveryError::PrimaryFailed(primary_err));
            }
        };

        tracing::warn!(
            primary = self.primary.name(),
            secondary = secondary.name(),
            error = %primary_err,
            "primary email transport failed, trying fallback"
        );

        match self.attempt(secondary.as_ref(), email).await {
            Ok(message_id) => Ok(DeliveryReceipt {
                provider: secondary.name(),
                message_id,
                used_fallback: true,
            }),
            Err(secondary_err) => {
                tracing::error!(
                    primary_error = %primary_err,
                    secondary_error = %secondary_err,
                    "all email transports failed"
                );
                Err(DeliveryError::AllTransportsFailed {
                    primary: primary_err,
                    secondary: secondary_err,
                })
            }
        }
    }

    async fn attempt(
        &self,
        transport: &dyn EmailTransport,
        email: &OutgoingEmail,
    ) -> Result<Option<String>, TransportError> {
        match tokio::time::timeout(self.timeout, transport.send(&self.sender, email)).await {
            Ok(result) => {
                if result.is_ok() {
                    tracing::info!(provider = transport.name(), "email accepted");
                }
                result
            }
            Err(_) => Err(TransportError::Timeout {
                provider: transport.name(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

fn build_transport(
    config: &AppConfig,
    provider: EmailProvider,
) -> Result<Arc<dyn EmailTransport>, ConfigError> {
    match provider {
        EmailProvider::Postmark => {
            let token = config
                .postmark_server_token
                .clone()
                .ok_or_else(|| ConfigError::MissingEnvVar("POSTMARK_SERVER_TOKEN".to_string()))?;
            Ok(Arc::new(PostmarkTransport::new(&config.postmark_base_url, token)))
        }
        EmailProvider::SendGrid => {
            let key = config
                .sendgrid_api_key
                .clone()
                .ok_or_else(|| ConfigError::MissingEnvVar("SENDGRID_API_KEY".to_string()))?;
            Ok(Arc::new(SendGridTransport::new(&config.sendgrid_base_url, key)))
        }
    }
}
