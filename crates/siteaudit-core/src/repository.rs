//! Contract for the external audit store.
//!
//! Every write is an idempotent upsert keyed by audit id, so overlapping or
//! repeated invocations for the same audit converge.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::audit::{AuditJob, AuditStatus, ErrorEnvelope, RawAuditResult};
use crate::results::ModuleResult;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("audit {0} not found")]
    NotFound(Uuid),

    #[error("audit {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: AuditStatus,
        to: AuditStatus,
    },

    #[error("audit {id} has invalid stored data: {reason}")]
    Corrupt { id: Uuid, reason: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Loads an audit and its enabled modules.
    async fn load_audit(&self, id: Uuid) -> Result<AuditJob, RepositoryError>;

    async fn update_status(&self, id: Uuid, status: AuditStatus) -> Result<(), RepositoryError>;

    /// Upserts one row per module, keyed by `(audit id, module key)`.
    async fn save_module_results(
        &self,
        id: Uuid,
        results: &[ModuleResult],
    ) -> Result<(), RepositoryError>;

    async fn save_raw_results(
        &self,
        id: Uuid,
        raw: &RawAuditResult,
    ) -> Result<(), RepositoryError>;

    async fn save_formatted_report(
        &self,
        id: Uuid,
        html: &str,
        plaintext: &str,
    ) -> Result<(), RepositoryError>;

    async fn mark_email_sent(&self, id: Uuid, sent_at: DateTime<Utc>)
        -> Result<(), RepositoryError>;

    /// Persists the error log and moves the audit to `failed`.
    async fn record_failure(
        &self,
        id: Uuid,
        envelope: &ErrorEnvelope,
    ) -> Result<(), RepositoryError>;
}
