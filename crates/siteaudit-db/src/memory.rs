//! In-process [`AuditRepository`] for tests and dry runs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use siteaudit_core::{
    AuditJob, AuditRepository, AuditStatus, ErrorEnvelope, ModuleResult, RawAuditResult,
    RepositoryError,
};
use uuid::Uuid;

use crate::transition_allowed;

/// Everything written for one audit.
#[derive(Debug, Clone)]
pub struct StoredAudit {
    pub job: AuditJob,
    /// Every status the audit has been moved to, oldest first.
    pub status_history: Vec<AuditStatus>,
    pub module_results: Vec<ModuleResult>,
    pub raw_result: Option<RawAuditResult>,
    pub report_html: Option<String>,
    pub report_plaintext: Option<String>,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub error_log: Option<ErrorEnvelope>,
}

#[derive(Debug, Default)]
pub struct MemoryAuditRepository {
    audits: Mutex<HashMap<Uuid, StoredAudit>>,
}

impl MemoryAuditRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an audit, replacing any existing record with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Backend`] if the store's lock is poisoned.
    pub fn insert(&self, job: AuditJob) -> Result<(), RepositoryError> {
        let stored = StoredAudit {
            status_history: vec![job.status],
            job,
            module_results: Vec::new(),
            raw_result: None,
            report_html: None,
            report_plaintext: None,
            email_sent_at: None,
            error_log: None,
        };
        self.lock()?.insert(stored.job.id, stored);
        Ok(())
    }

    /// Copy of the stored record.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<StoredAudit> {
        self.lock().ok()?.get(&id).cloned()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, StoredAudit>>, RepositoryError> {
        self.audits
            .lock()
            .map_err(|_| RepositoryError::Backend("memory store lock poisoned".to_string()))
    }

    fn with_audit<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut StoredAudit) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut audits = self.lock()?;
        let audit = audits.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        f(audit)
    }
}

fn transition(audit: &mut StoredAudit, to: AuditStatus) -> Result<(), RepositoryError> {
    let from = audit.job.status;
    if !transition_allowed(from, to) {
        return Err(RepositoryError::InvalidTransition {
            id: audit.job.id,
            from,
            to,
        });
    }
    audit.job.status = to;
    audit.status_history.push(to);
    Ok(())
}

#[async_trait]
impl AuditRepository for MemoryAuditRepository {
    async fn load_audit(&self, id: Uuid) -> Result<AuditJob, RepositoryError> {
        self.with_audit(id, |audit| Ok(audit.job.clone()))
    }

    async fn update_status(&self, id: Uuid, status: AuditStatus) -> Result<(), RepositoryError> {
        self.with_audit(id, |audit| transition(audit, status))
    }

    async fn save_module_results(
        &self,
        id: Uuid,
        results: &[ModuleResult],
    ) -> Result<(), RepositoryError> {
        self.with_audit(id, |audit| {
            for result in results {
                match audit
                    .module_results
                    .iter_mut()
                    .find(|r| r.module_key == result.module_key)
                {
                    Some(existing) => *existing = result.clone(),
                    None => audit.module_results.push(result.clone()),
                }
            }
            Ok(())
        })
    }

    async fn save_raw_results(
        &self,
        id: Uuid,
        raw: &RawAuditResult,
    ) -> Result<(), RepositoryError> {
        self.with_audit(id, |audit| {
            audit.raw_result = Some(raw.clone());
            Ok(())
        })
    }

    async fn save_formatted_report(
        &self,
        id: Uuid,
        html: &str,
        plaintext: &str,
    ) -> Result<(), RepositoryError> {
        self.with_audit(id, |audit| {
            audit.report_html = Some(html.to_string());
            audit.report_plaintext = Some(plaintext.to_string());
            Ok(())
        })
    }

    async fn mark_email_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.with_audit(id, |audit| {
            audit.email_sent_at = Some(sent_at);
            Ok(())
        })
    }

    async fn record_failure(
        &self,
        id: Uuid,
        envelope: &ErrorEnvelope,
    ) -> Result<(), RepositoryError> {
        self.with_audit(id, |audit| {
            transition(audit, AuditStatus::Failed)?;
            audit.error_log = Some(envelope.clone());
            Ok(())
        })
    }
}
