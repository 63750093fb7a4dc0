//! Runs one audit end to end and keeps its record in step.

pub mod controller;
pub mod error;

pub use controller::{AuditOutcome, AuditPipeline};
pub use error::{PipelineError, Stage};
