//! The audit state machine: `pending → running → generating_report →
//! completed`, with any failure moving the audit to `failed`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use siteaudit_checks::{run_modules, run_modules_with, CheckContext, CheckSettings, ModuleRunner};
use siteaudit_core::{AppConfig, AuditJob, AuditRepository, AuditStatus, ErrorEnvelope};
use siteaudit_delivery::{
    apology_email, render_html, render_plaintext, report_email, report_link, DeliveryGateway,
    ReportHeader,
};
use siteaudit_fetcher::{RateLimiter, SiteFetcher};
use siteaudit_narrative::{NarrativeSynthesizer, OpenAiTextGenerator, SynthesisInput};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{PipelineError, Stage};

/// What a successful invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    Completed {
        overall_score: u8,
        modules: usize,
        degraded_modules: usize,
        delivered_via: &'static str,
        used_fallback: bool,
    },
    /// The audit was already completed; nothing was re-run or re-sent.
    AlreadyCompleted,
}

pub struct AuditPipeline {
    repo: Arc<dyn AuditRepository>,
    fetcher: Arc<SiteFetcher>,
    settings: Arc<CheckSettings>,
    synthesizer: NarrativeSynthesizer,
    gateway: DeliveryGateway,
    report_base_url: String,
    runner: Option<ModuleRunner>,
}

impl AuditPipeline {
    #[must_use]
    pub fn new(
        repo: Arc<dyn AuditRepository>,
        fetcher: Arc<SiteFetcher>,
        settings: Arc<CheckSettings>,
        synthesizer: NarrativeSynthesizer,
        gateway: DeliveryGateway,
        report_base_url: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            fetcher,
            settings,
            synthesizer,
            gateway,
            report_base_url: report_base_url.into(),
            runner: None,
        }
    }

    /// Wires every collaborator from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Fetch`] if the HTTP client cannot be built,
    /// or [`PipelineError::Config`] if an email provider lacks credentials.
    pub fn from_config(
        config: &AppConfig,
        repo: Arc<dyn AuditRepository>,
    ) -> Result<Self, PipelineError> {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
            config.fetch_min_host_interval_ms,
        )));
        let fetcher = Arc::new(SiteFetcher::new(
            config.fetch_timeout_secs,
            &config.fetch_user_agent,
            limiter,
        )?);
        let generator = OpenAiTextGenerator::new(config.llm_api_key.clone(), config.llm_model.clone())
            .with_base_url(config.llm_base_url.clone());
        let synthesizer = NarrativeSynthesizer::new(
            Arc::new(generator),
            config.llm_timeout_secs,
            config.llm_temperature,
        );
        let gateway = DeliveryGateway::from_config(config)?;

        Ok(Self::new(
            repo,
            fetcher,
            Arc::new(CheckSettings::from_config(config)),
            synthesizer,
            gateway,
            config.report_base_url.clone(),
        ))
    }

    /// Replaces the module runner used by the aggregator.
    #[must_use]
    pub fn with_module_runner(mut self, runner: ModuleRunner) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Runs the audit `audit_id` to completion.
    ///
    /// Audits already `completed` are left untouched. On any failure after
    /// the audit is loaded, an [`ErrorEnvelope`] is persisted with status
    /// `failed` and one apology email is attempted before the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] that stopped the run.
    pub async fn run(&self, audit_id: Uuid) -> Result<AuditOutcome, PipelineError> {
        let span = tracing::info_span!("audit", audit_id = %audit_id);
        async move {
            let job = self.repo.load_audit(audit_id).await?;
            if job.status == AuditStatus::Completed {
                tracing::info!("audit already completed; skipping");
                return Ok(AuditOutcome::AlreadyCompleted);
            }

            let started = Instant::now();
            match self.execute(&job).await {
                Ok(outcome) => {
                    tracing::info!(
                        elapsed_ms = started.elapsed().as_millis(),
                        "audit completed"
                    );
                    Ok(outcome)
                }
                Err((stage, err)) => {
                    tracing::error!(stage = %stage, error = %err, "audit failed");
                    self.fail(&job, stage, &err).await;
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, job: &AuditJob) -> Result<AuditOutcome, (Stage, PipelineError)> {
        self.repo
            .update_status(job.id, AuditStatus::Running)
            .await
            .map_err(at(Stage::Start))?;

        let snapshot = self.fetcher.fetch(&job.url).await.map_err(at(Stage::Fetch))?;
        tracing::info!(final_url = %snapshot.final_url, "site fetched");

        let ctx = CheckContext::new(
            Arc::new(snapshot),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.settings),
        )
        .with_competitor(job.competitor_url.clone());
        let aggregate = match &self.runner {
            Some(runner) => run_modules_with(&ctx, &job.modules, Arc::clone(runner)).await,
            None => run_modules(&ctx, &job.modules).await,
        };

        let degraded_modules = aggregate.modules.iter().filter(|m| m.is_degraded()).count();
        let raw = aggregate.into_raw(&job.url);
        tracing::info!(
            overall_score = raw.overall_score,
            modules = raw.modules.len(),
            degraded = degraded_modules,
            "modules finished"
        );

        self.repo
            .save_module_results(job.id, &raw.modules)
            .await
            .map_err(at(Stage::PersistResults))?;
        self.repo
            .save_raw_results(job.id, &raw)
            .await
            .map_err(at(Stage::PersistResults))?;
        self.repo
            .update_status(job.id, AuditStatus::GeneratingReport)
            .await
            .map_err(at(Stage::PersistResults))?;

        let report = self
            .synthesizer
            .synthesize(SynthesisInput {
                url: &job.url,
                overall_score: raw.overall_score,
                customer_name: job.customer_name.as_deref(),
                purchased: &job.modules,
                results: &raw.modules,
            })
            .await
            .map_err(at(Stage::Synthesize))?;

        let header = ReportHeader {
            site_url: job.url.clone(),
            overall_score: raw.overall_score,
            report_url: report_link(&self.report_base_url, job.id, &job.access_token),
            customer_name: job.customer_name.clone(),
        };
        let html = render_html(&header, &report);
        let text = render_plaintext(&header, &report);
        self.repo
            .save_formatted_report(job.id, &html, &text)
            .await
            .map_err(at(Stage::PersistReport))?;

        let receipt = self
            .gateway
            .send(&report_email(job, html, text))
            .await
            .map_err(at(Stage::Deliver))?;

        self.repo
            .mark_email_sent(job.id, chrono::Utc::now())
            .await
            .map_err(at(Stage::Finalize))?;
        self.repo
            .update_status(job.id, AuditStatus::Completed)
            .await
            .map_err(at(Stage::Finalize))?;

        Ok(AuditOutcome::Completed {
            overall_score: raw.overall_score,
            modules: raw.modules.len(),
            degraded_modules,
            delivered_via: receipt.provider,
            used_fallback: receipt.used_fallback,
        })
    }

    /// Records the failure and tells the customer, best effort.
    async fn fail(&self, job: &AuditJob, stage: Stage, err: &PipelineError) {
        let envelope = ErrorEnvelope::capture(err.kind(), stage.as_str(), err);
        if let Err(record_err) = self.repo.record_failure(job.id, &envelope).await {
            tracing::error!(error = %record_err, "failed to record audit failure");
        }

        match self.gateway.send(&apology_email(job)).await {
            Ok(receipt) => tracing::info!(provider = receipt.provider, "apology email sent"),
            Err(send_err) => tracing::warn!(error = %send_err, "apology email could not be sent"),
        }
    }
}

fn at<E: Into<PipelineError>>(stage: Stage) -> impl FnOnce(E) -> (Stage, PipelineError) {
    move |e| (stage, e.into())
}
