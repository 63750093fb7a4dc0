//! The ten check modules and the aggregator that runs them.
//!
//! Each module inspects a shared [`SiteSnapshot`](siteaudit_fetcher::SiteSnapshot)
//! and returns a scored [`ModuleResult`](siteaudit_core::ModuleResult).
//! [`run_modules`] fans out one task per purchased module and converts
//! failures into degraded results so one broken check never sinks the audit.

pub mod aggregate;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod modules;

mod jsonld;
mod page;
mod scorecard;

#[cfg(test)]
mod test_support;

pub use aggregate::{page_analysis, run_modules, run_modules_with, AggregateResult, ModuleRunner};
pub use context::{CheckContext, CheckSettings, LocalSignalSettings};
pub use dispatch::run_check;
pub use error::ModuleError;
