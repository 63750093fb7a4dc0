use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use siteaudit_delivery::{
    DeliveryError, DeliveryGateway, EmailTransport, OutgoingEmail, Sender, TransportError,
};

enum Behavior {
    Accept,
    Reject,
    Hang,
}

struct Fake {
    name: &'static str,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl Fake {
    fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailTransport for Fake {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(
        &self,
        _sender: &Sender,
        _email: &OutgoingEmail,
    ) -> Result<Option<String>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Accept => Ok(Some(format!("{}-id", self.name))),
            Behavior::Reject => Err(TransportError::Rejected {
                provider: self.name,
                status: 500,
                detail: format!("{} is down", self.name),
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(None)
            }
        }
    }
}

fn sender() -> Sender {
    Sender {
        address: "reports@siteaudit.example".to_string(),
        name: "Site Audit".to_string(),
    }
}

fn email() -> OutgoingEmail {
    OutgoingEmail {
        to: "owner@acme.example".to_string(),
        subject: "Your audit".to_string(),
        html: "<p>report</p>".to_string(),
        text: "report".to_string(),
    }
}

#[tokio::test]
async fn healthy_primary_is_used_alone() {
    let primary = Fake::new("postmark", Behavior::Accept);
    let secondary = Fake::new("sendgrid", Behavior::Accept);
    let gateway = DeliveryGateway::new(primary.clone(), sender(), Duration::from_secs(30))
        .with_fallback(secondary.clone(), true);

    let receipt = gateway.send(&email()).await.unwrap();

    assert_eq!(receipt.provider, "postmark");
    assert_eq!(receipt.message_id.as_deref(), Some("postmark-id"));
    assert!(!receipt.used_fallback);
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn failing_primary_falls_back_once() {
    let primary = Fake::new("postmark", Behavior::Reject);
    let secondary = Fake::new("sendgrid", Behavior::Accept);
    let gateway = DeliveryGateway::new(primary.clone(), sender(), Duration::from_secs(30))
        .with_fallback(secondary.clone(), true);

    let receipt = gateway.send(&email()).await.unwrap();

    assert_eq!(receipt.provider, "sendgrid");
    assert!(receipt.used_fallback);
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
}

#[tokio::test]
async fn both_failing_names_both_causes() {
    let primary = Fake::new("postmark", Behavior::Reject);
    let secondary = Fake::new("sendgrid", Behavior::Reject);
    let gateway = DeliveryGateway::new(primary, sender(), Duration::from_secs(30))
        .with_fallback(secondary.clone(), true);

    let err = gateway.send(&email()).await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("postmark is down"), "{message}");
    assert!(message.contains("sendgrid is down"), "{message}");
    assert!(matches!(err, DeliveryError::AllTransportsFailed { .. }));
    assert_eq!(secondary.calls(), 1);
}

#[tokio::test]
async fn disabled_fallback_reports_primary_failure() {
    let primary = Fake::new("postmark", Behavior::Reject);
    let secondary = Fake::new("sendgrid", Behavior::Accept);
    let gateway = DeliveryGateway::new(primary, sender(), Duration::from_secs(30))
        .with_fallback(secondary.clone(), false);

    let err = gateway.send(&email()).await.unwrap_err();

    assert!(matches!(err, DeliveryError::PrimaryFailed(_)), "got: {err:?}");
    assert_eq!(secondary.calls(), 0);
}

#[tokio::test]
async fn hung_primary_times_out_then_falls_back() {
    let primary = Fake::new("postmark", Behavior::Hang);
    let secondary = Fake::new("sendgrid", Behavior::Accept);
    let gateway = DeliveryGateway::new(primary, sender(), Duration::from_millis(50))
        .with_fallback(secondary, true);

    let receipt = gateway.send(&email()).await.unwrap();
    assert_eq!(receipt.provider, "sendgrid");
}

#[tokio::test]
async fn no_secondary_means_primary_failed() {
    let primary = Fake::new("sendgrid", Behavior::Hang);
    let gateway = DeliveryGateway::new(primary, sender(), Duration::from_millis(20));

    let err = gateway.send(&email()).await.unwrap_err();
    assert!(
        matches!(
            err,
            DeliveryError::PrimaryFailed(TransportError::Timeout { provider: "sendgrid", .. })
        ),
        "got: {err:?}"
    );
}
