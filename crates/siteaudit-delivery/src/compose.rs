//! Customer emails: the finished report and the failure apology.

use siteaudit_core::AuditJob;
use uuid::Uuid;

use crate::render::html_escape;
use crate::transport::OutgoingEmail;

/// Link to the hosted report, carrying the audit's access token.
#[must_use]
pub fn report_link(base_url: &str, audit_id: Uuid, access_token: &str) -> String {
    format!(
        "{}/reports/{audit_id}?token={}",
        base_url.trim_end_matches('/'),
        access_token.trim()
    )
}

#[must_use]
pub fn report_email(job: &AuditJob, html: String, text: String) -> OutgoingEmail {
    OutgoingEmail {
        to: job.customer_email.clone(),
        subject: format!("Your website audit for {} is ready", display_host(&job.url)),
        html,
        text,
    }
}

/// Apology sent when an audit fails. Never includes internal error text.
#[must_use]
pub fn apology_email(job: &AuditJob) -> OutgoingEmail {
    let site = display_host(&job.url);
    let greeting = job
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(|| "Hi,".to_string(), |n| format!("Hi {n},"));

    let text = format!(
        "{greeting}\n\n\
         We ran into a problem while preparing the website audit for {site}, \
         and we're sorry for the delay.\n\n\
         Our team has been notified and will follow up shortly. \
         You don't need to do anything. If you have questions, just reply to this email.\n"
    );
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<body style="margin:0;padding:24px;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;color:#1a1a1a;">
<p>{greeting}</p>
<p>We ran into a problem while preparing the website audit for <strong>{site}</strong>, and we're sorry for the delay.</p>
<p>Our team has been notified and will follow up shortly. You don't need to do anything. If you have questions, just reply to this email.</p>
</body>
</html>"#,
        greeting = html_escape(&greeting),
        site = html_escape(&site),
    );

    OutgoingEmail {
        to: job.customer_email.clone(),
        subject: format!("An update on your website audit for {site}"),
        html,
        text,
    }
}

/// `https://www.acme.example/path` → `www.acme.example`.
fn display_host(url: &str) -> String {
    let rest = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest);
    rest.split(['/', '?', '#'])
        .next()
        .filter(|h| !h.is_empty())
        .unwrap_or(url)
        .to_string()
}
