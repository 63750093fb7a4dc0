mod check;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use siteaudit_core::ModuleKey;
use siteaudit_pipeline::{AuditOutcome, AuditPipeline};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "siteaudit-cli")]
#[command(about = "Run website audits from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline for a stored audit.
    Run {
        /// Audit id.
        audit_id: Uuid,
    },
    /// Fetch a page, run the check modules, and print the raw result JSON.
    Check {
        url: String,
        /// Comma-separated module keys (default: every module).
        #[arg(long, value_delimiter = ',')]
        modules: Vec<String>,
        /// Competitor site for the comparison module.
        #[arg(long)]
        competitor: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { audit_id } => {
            let config = siteaudit_core::load_app_config()?;
            init_tracing(&config.log_level)?;

            let pool = siteaudit_db::connect_and_migrate(&config).await?;
            let repo = Arc::new(siteaudit_db::PgAuditRepository::new(pool));
            let pipeline = AuditPipeline::from_config(&config, repo)?;

            match pipeline.run(audit_id).await? {
                AuditOutcome::Completed {
                    overall_score,
                    modules,
                    degraded_modules,
                    delivered_via,
                    used_fallback,
                } => println!(
                    "audit {audit_id} completed: score {overall_score}, {modules} modules \
                     ({degraded_modules} degraded), emailed via {delivered_via}{}",
                    if used_fallback { " (fallback)" } else { "" }
                ),
                AuditOutcome::AlreadyCompleted => {
                    println!("audit {audit_id} was already completed");
                }
            }
        }
        Commands::Check {
            url,
            modules,
            competitor,
        } => {
            let config = siteaudit_core::load_app_config_from_env().ok();
            let log_level = config.as_ref().map_or("info", |c| c.log_level.as_str());
            init_tracing(log_level)?;
            if config.is_none() {
                tracing::debug!("full configuration unavailable; using check defaults");
            }

            let keys = parse_modules(&modules)?;
            let raw = check::run(config.as_ref(), &url, &keys, competitor).await?;
            println!("{}", serde_json::to_string_pretty(&raw)?);
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Resolves `--modules` values by storage key or display name.
fn parse_modules(raw: &[String]) -> anyhow::Result<Vec<ModuleKey>> {
    if raw.iter().all(|m| m.trim().is_empty()) {
        return Ok(ModuleKey::ALL.to_vec());
    }
    raw.iter()
        .map(String::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            ModuleKey::parse(m)
                .or_else(|| ModuleKey::from_display_name(m))
                .ok_or_else(|| anyhow::anyhow!("unknown module \"{m}\""))
        })
        .collect()
}
