use siteaudit_core::{ModuleKey, ModuleResult};

use crate::context::CheckContext;
use crate::error::ModuleError;
use crate::modules::{
    accessibility, competitors, crawl_health, local_seo, mobile, onpage_seo, performance,
    schema_markup, security, social,
};

/// Runs one module against the context.
///
/// # Errors
///
/// Propagates the module's [`ModuleError`]; page-only modules never fail.
pub async fn run_check(key: ModuleKey, ctx: &CheckContext) -> Result<ModuleResult, ModuleError> {
    let snapshot = ctx.snapshot.as_ref();
    let result = match key {
        ModuleKey::Performance => performance::check(snapshot),
        ModuleKey::CrawlHealth => crawl_health::check(ctx).await?,
        ModuleKey::OnPage => onpage_seo::check(snapshot),
        ModuleKey::Mobile => mobile::check(snapshot),
        ModuleKey::LocalBusiness => local_seo::check(snapshot, &ctx.settings.local),
        ModuleKey::Accessibility => accessibility::check(snapshot),
        ModuleKey::Security => security::check(snapshot),
        ModuleKey::SchemaMarkup => schema_markup::check(snapshot, &ctx.settings.local),
        ModuleKey::Social => social::check(snapshot),
        ModuleKey::Competitors => competitors::check(ctx).await?,
    };
    Ok(result)
}
