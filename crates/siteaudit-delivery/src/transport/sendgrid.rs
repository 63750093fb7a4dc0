use async_trait::async_trait;
use serde::Serialize;

use super::{clip, EmailTransport, OutgoingEmail, Sender};
use crate::error::TransportError;

const PROVIDER: &str = "sendgrid";

/// SendGrid's v3 `POST /v3/mail/send` API.
pub struct SendGridTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct MailSend<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 2],
    tracking_settings: TrackingSettings,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct TrackingSettings {
    click_tracking: ClickTracking,
}

#[derive(Serialize)]
struct ClickTracking {
    enable: bool,
    enable_text: bool,
}

impl SendGridTransport {
    #[must_use]
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl EmailTransport for SendGridTransport {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn send(
        &self,
        sender: &Sender,
        email: &OutgoingEmail,
    ) -> Result<Option<String>, TransportError> {
        let name = sender.name.trim();
        let body = MailSend {
            personalizations: [Personalization {
                to: [Address {
                    email: &email.to,
                    name: None,
                }],
            }],
            from: Address {
                email: &sender.address,
                name: (!name.is_empty()).then_some(name),
            },
            subject: &email.subject,
            // text/plain must precede text/html.
            content: [
                Content {
                    kind: "text/plain",
                    value: &email.text,
                },
                Content {
                    kind: "text/html",
                    value: &email.html,
                },
            ],
            tracking_settings: TrackingSettings {
                click_tracking: ClickTracking {
                    enable: false,
                    enable_text: false,
                },
            },
        };

        let response = self
            .http
            .post(format!("{}/v3/mail/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected {
                provider: PROVIDER,
                status: status.as_u16(),
                detail: clip(&text),
            });
        }

        Ok(response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }
}
