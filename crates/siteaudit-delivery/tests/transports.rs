use serde_json::json;
use siteaudit_delivery::{
    EmailTransport, OutgoingEmail, PostmarkTransport, SendGridTransport, Sender, TransportError,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

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
async fn postmark_posts_email_with_link_tracking_off() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/email"))
        .and(header("X-Postmark-Server-Token", "pm-token"))
        .and(body_partial_json(json!({
            "From": "Site Audit <reports@siteaudit.example>",
            "To": "owner@acme.example",
            "HtmlBody": "<p>report</p>",
            "TextBody": "report",
            "TrackLinks": "None",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "To": "owner@acme.example",
            "MessageID": "pm-123",
            "ErrorCode": 0,
            "Message": "OK"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = PostmarkTransport::new(&server.uri(), "pm-token");
    let id = transport.send(&sender(), &email()).await.unwrap();
    assert_eq!(id.as_deref(), Some("pm-123"));
}

#[tokio::test]
async fn postmark_error_code_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/email"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "ErrorCode": 300,
            "Message": "Invalid 'To' address"
        })))
        .mount(&server)
        .await;

    let transport = PostmarkTransport::new(&server.uri(), "pm-token");
    let err = transport.send(&sender(), &email()).await.unwrap_err();
    assert!(
        matches!(err, TransportError::Rejected { status: 422, ref detail, .. } if detail.contains("Invalid 'To'")),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn sendgrid_posts_mail_send_with_click_tracking_off() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("authorization", "Bearer sg-key"))
        .and(body_partial_json(json!({
            "personalizations": [{"to": [{"email": "owner@acme.example"}]}],
            "from": {"email": "reports@siteaudit.example", "name": "Site Audit"},
            "subject": "Your audit",
            "tracking_settings": {"click_tracking": {"enable": false}},
        })))
        .respond_with(ResponseTemplate::new(202).insert_header("X-Message-Id", "sg-456"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = SendGridTransport::new(&server.uri(), "sg-key");
    let id = transport.send(&sender(), &email()).await.unwrap();
    assert_eq!(id.as_deref(), Some("sg-456"));
}

#[tokio::test]
async fn sendgrid_server_error_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let transport = SendGridTransport::new(&server.uri(), "sg-key");
    let err = transport.send(&sender(), &email()).await.unwrap_err();
    assert!(
        matches!(err, TransportError::Rejected { provider: "sendgrid", status: 503, ref detail } if detail == "maintenance"),
        "got: {err:?}"
    );
}
