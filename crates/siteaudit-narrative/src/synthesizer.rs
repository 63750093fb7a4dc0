//! Report synthesis: prompt, generate under a deadline, extract, repair.

use std::sync::Arc;
use std::time::Duration;

use siteaudit_core::{ModuleKey, ModuleResult, NarrativeReport, MAX_LLM_TIMEOUT_SECS};

use crate::error::SynthesisError;
use crate::extract::extract_report;
use crate::generator::{GenerationRequest, TextGenerator};
use crate::prompt::build_messages;
use crate::repair::{ensure_complete, repair_report};

/// Everything the synthesizer needs to know about one audit.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub url: &'a str,
    pub overall_score: u8,
    pub customer_name: Option<&'a str>,
    /// Purchased modules in purchase order.
    pub purchased: &'a [ModuleKey],
    pub results: &'a [ModuleResult],
}

const MIN_DEADLINE: Duration = Duration::from_secs(1);

/// Keeps a deadline within 1 s to 150 s.
fn bounded(deadline: Duration) -> Duration {
    deadline.clamp(MIN_DEADLINE, Duration::from_secs(MAX_LLM_TIMEOUT_SECS))
}

pub struct NarrativeSynthesizer {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
    temperature: f32,
}

impl NarrativeSynthesizer {
    /// The deadline is clamped to 1 s to 150 s.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, timeout_secs: u64, temperature: f32) -> Self {
        Self {
            generator,
            timeout: bounded(Duration::from_secs(timeout_secs)),
            temperature,
        }
    }

    /// Overrides the deadline with sub-second precision, clamped like
    /// [`NarrativeSynthesizer::new`].
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = bounded(timeout);
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Produces a report covering exactly `input.purchased`.
    ///
    /// # Errors
    ///
    /// - [`SynthesisError::Timeout`]: the generator missed the deadline.
    /// - [`SynthesisError::Generation`]: the generator call failed.
    /// - [`SynthesisError::Unparsable`]: no JSON object could be extracted.
    /// - [`SynthesisError::Incomplete`]: repair could not produce an entry
    ///   for every purchased module.
    pub async fn synthesize(
        &self,
        input: SynthesisInput<'_>,
    ) -> Result<NarrativeReport, SynthesisError> {
        let request = GenerationRequest {
            messages: build_messages(
                input.url,
                input.overall_score,
                input.customer_name,
                input.purchased,
                input.results,
            ),
            temperature: self.temperature,
        };

        let text = match tokio::time::timeout(self.timeout, self.generator.generate(&request)).await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    url = input.url,
                    timeout_secs = self.timeout.as_secs(),
                    "text generation deadline elapsed"
                );
                return Err(SynthesisError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let Some(mut report) = extract_report(&text) else {
            tracing::warn!(url = input.url, chars = text.len(), "generated text held no report JSON");
            return Err(SynthesisError::Unparsable);
        };

        let outcome = repair_report(&mut report, input.purchased, input.results);
        if !outcome.dropped.is_empty() || !outcome.synthesized.is_empty() {
            tracing::info!(
                url = input.url,
                renamed = outcome.renamed,
                dropped = ?outcome.dropped,
                synthesized = ?outcome.synthesized,
                "repaired narrative report"
            );
        }
        ensure_complete(&report, input.purchased)?;
        Ok(report)
    }
}
