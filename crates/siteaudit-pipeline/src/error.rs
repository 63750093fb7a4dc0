use siteaudit_core::{ConfigError, RepositoryError};
use siteaudit_delivery::DeliveryError;
use siteaudit_fetcher::FetchError;
use siteaudit_narrative::SynthesisError;
use thiserror::Error;

/// Where in the pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Fetch,
    PersistResults,
    Synthesize,
    PersistReport,
    Deliver,
    Finalize,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Fetch => "fetch",
            Stage::PersistResults => "persist_results",
            Stage::Synthesize => "synthesize",
            Stage::PersistReport => "persist_report",
            Stage::Deliver => "deliver",
            Stage::Finalize => "finalize",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl PipelineError {
    /// Error kind recorded as `errorName` in the failure envelope.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "ConfigError",
            PipelineError::Repository(_) => "RepositoryError",
            PipelineError::Fetch(_) => "FetchError",
            PipelineError::Synthesis(_) => "SynthesisError",
            PipelineError::Delivery(_) => "DeliveryError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_the_wrapped_error() {
        let err = PipelineError::from(SynthesisError::Unparsable);
        assert_eq!(err.kind(), "SynthesisError");
        assert_eq!(err.to_string(), SynthesisError::Unparsable.to_string());

        let err = PipelineError::from(FetchError::NotFound {
            url: "https://acme.example/".to_string(),
        });
        assert_eq!(err.kind(), "FetchError");
    }
}
