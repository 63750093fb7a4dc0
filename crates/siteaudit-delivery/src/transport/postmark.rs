use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{clip, EmailTransport, OutgoingEmail, Sender};
use crate::error::TransportError;

const PROVIDER: &str = "postmark";

/// Postmark's `POST /email` API.
pub struct PostmarkTransport {
    http: reqwest::Client,
    base_url: String,
    server_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkEmail<'a> {
    from: String,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    message_stream: &'static str,
    track_links: &'static str,
    track_opens: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PostmarkResponse {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    message: String,
    #[serde(rename = "MessageID", default)]
    message_id: Option<String>,
}

impl PostmarkTransport {
    #[must_use]
    pub fn new(base_url: &str, server_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            server_token: server_token.into(),
        }
    }
}

#[async_trait]
impl EmailTransport for PostmarkTransport {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn send(
        &self,
        sender: &Sender,
        email: &OutgoingEmail,
    ) -> Result<Option<String>, TransportError> {
        let body = PostmarkEmail {
            from: sender.mailbox(),
            to: &email.to,
            subject: &email.subject,
            html_body: &email.html,
            text_body: &email.text,
            message_stream: "outbound",
            track_links: "None",
            track_opens: false,
        };

        let response = self
            .http
            .post(format!("{}/email", self.base_url))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header("X-Postmark-Server-Token", &self.server_token)
            .json(&body)
            .send()
            .await
            .map_err(|source| TransportError::Http {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let parsed: Option<PostmarkResponse> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            return Err(TransportError::Rejected {
                provider: PROVIDER,
                status: status.as_u16(),
                detail: parsed.map_or_else(|| clip(&text), |p| p.message),
            });
        }
        match parsed {
            Some(p) if p.error_code != 0 => Err(TransportError::Rejected {
                provider: PROVIDER,
                status: status.as_u16(),
                detail: format!("error code {}: {}", p.error_code, p.message),
            }),
            Some(p) => Ok(p.message_id),
            None => Ok(None),
        }
    }
}
