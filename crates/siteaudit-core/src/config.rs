use crate::app_config::{AppConfig, EmailProvider};
use crate::ConfigError;

/// Upper bound on the text-generation deadline.
pub const MAX_LLM_TIMEOUT_SECS: u64 = 150;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can pass a `HashMap` lookup.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        match lookup(var) {
            Ok(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(ConfigError::MissingEnvVar(var.to_string())),
        }
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_flag = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Ok(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got \"{raw}\""),
            }),
            Err(_) => Ok(default),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let log_level = or_default("SITEAUDIT_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("SITEAUDIT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SITEAUDIT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_num("SITEAUDIT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let fetch_timeout_secs = parse_num("SITEAUDIT_FETCH_TIMEOUT_SECS", "15")?;
    let fetch_user_agent = or_default(
        "SITEAUDIT_FETCH_USER_AGENT",
        "Mozilla/5.0 (compatible; SiteAuditBot/0.1; +https://siteaudit.invalid/bot)",
    );
    let fetch_min_host_interval_ms = parse_num("SITEAUDIT_FETCH_MIN_HOST_INTERVAL_MS", "0")?;
    let robots_timeout_secs = parse_num("SITEAUDIT_ROBOTS_TIMEOUT_SECS", "5")?;
    let link_check_timeout_secs = parse_num("SITEAUDIT_LINK_CHECK_TIMEOUT_SECS", "3")?;
    let link_sample_size = parse_usize("SITEAUDIT_LINK_SAMPLE_SIZE", "5")?;
    let competitor_timeout_secs = parse_num("SITEAUDIT_COMPETITOR_TIMEOUT_SECS", "10")?;

    let local_address_proximity_chars =
        parse_usize("SITEAUDIT_LOCAL_ADDRESS_PROXIMITY_CHARS", "100")?;
    let local_missing_address_penalty =
        parse_u32("SITEAUDIT_LOCAL_MISSING_ADDRESS_PENALTY", "25")?;
    let local_partial_address_penalty =
        parse_u32("SITEAUDIT_LOCAL_PARTIAL_ADDRESS_PENALTY", "10")?;
    let local_missing_phone_penalty = parse_u32("SITEAUDIT_LOCAL_MISSING_PHONE_PENALTY", "20")?;
    let local_entity_suffix_override = parse_flag("SITEAUDIT_LOCAL_ENTITY_SUFFIX_OVERRIDE", true)?;

    let llm_api_key = require("SITEAUDIT_LLM_API_KEY")?;
    let llm_base_url = or_default("SITEAUDIT_LLM_BASE_URL", "https://api.openai.com/v1");
    let llm_model = or_default("SITEAUDIT_LLM_MODEL", "gpt-4o-mini");
    let llm_temperature = {
        let raw = or_default("SITEAUDIT_LLM_TEMPERATURE", "0.4");
        raw.trim()
            .parse::<f32>()
            .ok()
            .filter(|t| (0.0..=2.0).contains(t))
            .ok_or_else(|| ConfigError::InvalidEnvVar {
                var: "SITEAUDIT_LLM_TEMPERATURE".to_string(),
                reason: format!("expected a number between 0 and 2, got \"{raw}\""),
            })?
    };
    let llm_timeout_secs = parse_num("SITEAUDIT_LLM_TIMEOUT_SECS", "150")?;
    if llm_timeout_secs == 0 || llm_timeout_secs > MAX_LLM_TIMEOUT_SECS {
        return Err(ConfigError::InvalidEnvVar {
            var: "SITEAUDIT_LLM_TIMEOUT_SECS".to_string(),
            reason: format!("must be between 1 and {MAX_LLM_TIMEOUT_SECS} seconds"),
        });
    }

    let email_primary = parse_provider(
        "SITEAUDIT_EMAIL_PRIMARY",
        &or_default("SITEAUDIT_EMAIL_PRIMARY", "postmark"),
    )?
    .ok_or_else(|| ConfigError::InvalidEnvVar {
        var: "SITEAUDIT_EMAIL_PRIMARY".to_string(),
        reason: "a primary email provider is required".to_string(),
    })?;
    let email_secondary = parse_provider(
        "SITEAUDIT_EMAIL_SECONDARY",
        &or_default("SITEAUDIT_EMAIL_SECONDARY", "sendgrid"),
    )?;
    if email_secondary == Some(email_primary) {
        return Err(ConfigError::InvalidEnvVar {
            var: "SITEAUDIT_EMAIL_SECONDARY".to_string(),
            reason: "secondary provider must differ from the primary".to_string(),
        });
    }
    let email_fallback_enabled = parse_flag("SITEAUDIT_EMAIL_FALLBACK_ENABLED", true)?;
    let email_timeout_secs = parse_num("SITEAUDIT_EMAIL_TIMEOUT_SECS", "30")?;
    let email_from_address = require("SITEAUDIT_EMAIL_FROM_ADDRESS")?;
    let email_from_name = or_default("SITEAUDIT_EMAIL_FROM_NAME", "Site Audit Team");

    let postmark_server_token = lookup("POSTMARK_SERVER_TOKEN")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let postmark_base_url = or_default("POSTMARK_BASE_URL", "https://api.postmarkapp.com");
    let sendgrid_api_key = lookup("SENDGRID_API_KEY")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let sendgrid_base_url = or_default("SENDGRID_BASE_URL", "https://api.sendgrid.com");

    let credential_var = |provider: EmailProvider| match provider {
        EmailProvider::Postmark => ("POSTMARK_SERVER_TOKEN", postmark_server_token.is_some()),
        EmailProvider::SendGrid => ("SENDGRID_API_KEY", sendgrid_api_key.is_some()),
    };
    let (primary_var, primary_present) = credential_var(email_primary);
    if !primary_present {
        return Err(ConfigError::MissingEnvVar(primary_var.to_string()));
    }
    if let (Some(secondary), true) = (email_secondary, email_fallback_enabled) {
        let (secondary_var, secondary_present) = credential_var(secondary);
        if !secondary_present {
            return Err(ConfigError::MissingEnvVar(secondary_var.to_string()));
        }
    }

    let report_base_url = or_default("SITEAUDIT_REPORT_BASE_URL", "http://localhost:3000")
        .trim_end_matches('/')
        .to_string();

    Ok(AppConfig {
        database_url,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        fetch_timeout_secs,
        fetch_user_agent,
        fetch_min_host_interval_ms,
        robots_timeout_secs,
        link_check_timeout_secs,
        link_sample_size,
        competitor_timeout_secs,
        local_address_proximity_chars,
        local_missing_address_penalty,
        local_partial_address_penalty,
        local_missing_phone_penalty,
        local_entity_suffix_override,
        llm_api_key,
        llm_base_url,
        llm_model,
        llm_temperature,
        llm_timeout_secs,
        email_primary,
        email_secondary,
        email_fallback_enabled,
        email_timeout_secs,
        email_from_address,
        email_from_name,
        postmark_server_token,
        postmark_base_url,
        sendgrid_api_key,
        sendgrid_base_url,
        report_base_url,
    })
}

/// Parse a provider name. `"none"` (or empty) means "no provider".
fn parse_provider(var: &str, raw: &str) -> Result<Option<EmailProvider>, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "postmark" => Ok(Some(EmailProvider::Postmark)),
        "sendgrid" => Ok(Some(EmailProvider::SendGrid)),
        "" | "none" => Ok(None),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("unknown email provider \"{other}\""),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
