//! Report rendering and email delivery with provider failover.

pub mod compose;
pub mod error;
pub mod gateway;
pub mod render;
pub mod transport;

pub use compose::{apology_email, report_email, report_link};
pub use error::{DeliveryError, TransportError};
pub use gateway::{DeliveryGateway, DeliveryReceipt};
pub use render::{render_html, render_plaintext, ReportHeader};
pub use transport::{
    EmailTransport, OutgoingEmail, PostmarkTransport, Sender, SendGridTransport,
};
