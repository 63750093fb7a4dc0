//! Shared domain types, configuration, and the audit repository contract.

pub mod app_config;
pub mod audit;
pub mod config;
pub mod modules;
pub mod narrative;
pub mod repository;
pub mod results;

use thiserror::Error;

pub use app_config::{AppConfig, EmailProvider};
pub use audit::{AuditJob, AuditStatus, ErrorEnvelope, PageAnalysis, RawAuditResult};
pub use config::{load_app_config, load_app_config_from_env, MAX_LLM_TIMEOUT_SECS};
pub use modules::ModuleKey;
pub use narrative::{NarrativeIssue, NarrativeModule, NarrativeReport};
pub use repository::{AuditRepository, RepositoryError};
pub use results::{
    overall_score, AuditIssue, Evidence, IssueEvidence, ModuleResult, ScoreBand, Severity,
    MAX_SCORE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
