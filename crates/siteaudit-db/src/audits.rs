//! Postgres implementation of [`AuditRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use siteaudit_core::{
    AuditJob, AuditRepository, AuditStatus, ErrorEnvelope, ModuleKey, ModuleResult,
    RawAuditResult, RepositoryError,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::transition_allowed;

/// A row from the `audits` table, limited to the columns the pipeline reads.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub url: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub competitor_url: Option<String>,
    pub access_token: String,
    pub status: String,
}

#[derive(Clone)]
pub struct PgAuditRepository {
    pool: PgPool,
}

impl PgAuditRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_status(&self, id: Uuid) -> Result<AuditStatus, RepositoryError> {
        let raw: Option<String> =
            sqlx::query_scalar::<_, String>("SELECT status FROM audits WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        let raw = raw.ok_or(RepositoryError::NotFound(id))?;
        AuditStatus::parse(&raw).ok_or_else(|| RepositoryError::Corrupt {
            id,
            reason: format!("unknown status \"{raw}\""),
        })
    }

    /// Explains a guarded `UPDATE` that touched no rows.
    async fn rejected_update(&self, id: Uuid, to: AuditStatus) -> RepositoryError {
        match self.current_status(id).await {
            Ok(from) => RepositoryError::InvalidTransition { id, from, to },
            Err(e) => e,
        }
    }
}

fn backend(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Backend(e.to_string())
}

fn to_json<T: serde::Serialize>(id: Uuid, value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value).map_err(|e| RepositoryError::Corrupt {
        id,
        reason: e.to_string(),
    })
}

/// Statuses an audit may be in for an update to `to` to apply.
fn allowed_sources(to: AuditStatus) -> Vec<String> {
    [
        AuditStatus::Pending,
        AuditStatus::Running,
        AuditStatus::GeneratingReport,
        AuditStatus::Completed,
        AuditStatus::Failed,
    ]
    .into_iter()
    .filter(|from| transition_allowed(*from, to))
    .map(|s| s.as_str().to_string())
    .collect()
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn load_audit(&self, id: Uuid) -> Result<AuditJob, RepositoryError> {
        let row = sqlx::query_as::<_, AuditRow>(
            "SELECT id, url, customer_email, customer_name, competitor_url, access_token, status \
             FROM audits WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(RepositoryError::NotFound(id))?;

        let keys: Vec<String> = sqlx::query_scalar::<_, String>(
            "SELECT module_key FROM audit_modules WHERE audit_id = $1 ORDER BY position, module_key",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let modules = keys
            .iter()
            .map(|k| {
                ModuleKey::parse(k).ok_or_else(|| RepositoryError::Corrupt {
                    id,
                    reason: format!("unknown module key \"{k}\""),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let status = AuditStatus::parse(&row.status).ok_or_else(|| RepositoryError::Corrupt {
            id,
            reason: format!("unknown status \"{}\"", row.status),
        })?;

        Ok(AuditJob {
            id: row.id,
            url: row.url,
            customer_email: row.customer_email,
            customer_name: row.customer_name,
            competitor_url: row.competitor_url,
            modules,
            access_token: row.access_token,
            status,
        })
    }

    async fn update_status(&self, id: Uuid, status: AuditStatus) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE audits SET status = $1, updated_at = NOW() \
             WHERE id = $2 AND status = ANY($3)",
        )
        .bind(status.as_str())
        .bind(id)
        .bind(allowed_sources(status))
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_update(id, status).await);
        }
        tracing::debug!(audit_id = %id, status = %status, "audit status updated");
        Ok(())
    }

    async fn save_module_results(
        &self,
        id: Uuid,
        results: &[ModuleResult],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        for result in results {
            sqlx::query(
                "INSERT INTO audit_module_results \
                     (audit_id, module_key, score, summary, issues, evidence) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (audit_id, module_key) DO UPDATE SET \
                     score      = EXCLUDED.score, \
                     summary    = EXCLUDED.summary, \
                     issues     = EXCLUDED.issues, \
                     evidence   = EXCLUDED.evidence, \
                     updated_at = NOW()",
            )
            .bind(id)
            .bind(result.module_key.as_str())
            .bind(i16::from(result.score))
            .bind(&result.summary)
            .bind(to_json(id, &result.issues)?)
            .bind(to_json(id, &result.evidence)?)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }
        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn save_raw_results(
        &self,
        id: Uuid,
        raw: &RawAuditResult,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE audits SET raw_result_json = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(to_json(id, raw)?)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn save_formatted_report(
        &self,
        id: Uuid,
        html: &str,
        plaintext: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE audits \
             SET formatted_report_html = $1, formatted_report_plaintext = $2, updated_at = NOW() \
             WHERE id = $3",
        )
        .bind(html)
        .bind(plaintext)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn mark_email_sent(
        &self,
        id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE audits SET email_sent_at = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(sent_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn record_failure(
        &self,
        id: Uuid,
        envelope: &ErrorEnvelope,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE audits SET status = 'failed', error_log = $1, updated_at = NOW() \
             WHERE id = $2 AND status <> 'completed'",
        )
        .bind(to_json(id, envelope)?)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(self.rejected_update(id, AuditStatus::Failed).await);
        }
        tracing::debug!(audit_id = %id, error = %envelope.error_name, "audit failure recorded");
        Ok(())
    }
}
