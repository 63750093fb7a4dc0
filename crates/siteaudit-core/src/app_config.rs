/// Which HTTP email API a transport slot uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProvider {
    Postmark,
    SendGrid,
}

impl std::fmt::Display for EmailProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailProvider::Postmark => write!(f, "postmark"),
            EmailProvider::SendGrid => write!(f, "sendgrid"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub fetch_min_host_interval_ms: u64,
    pub robots_timeout_secs: u64,
    pub link_check_timeout_secs: u64,
    pub link_sample_size: usize,
    pub competitor_timeout_secs: u64,
    pub local_address_proximity_chars: usize,
    pub local_missing_address_penalty: u32,
    pub local_partial_address_penalty: u32,
    pub local_missing_phone_penalty: u32,
    pub local_entity_suffix_override: bool,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout_secs: u64,
    pub email_primary: EmailProvider,
    pub email_secondary: Option<EmailProvider>,
    pub email_fallback_enabled: bool,
    pub email_timeout_secs: u64,
    pub email_from_address: String,
    pub email_from_name: String,
    pub postmark_server_token: Option<String>,
    pub postmark_base_url: String,
    pub sendgrid_api_key: Option<String>,
    pub sendgrid_base_url: String,
    pub report_base_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field("fetch_min_host_interval_ms", &self.fetch_min_host_interval_ms)
            .field("robots_timeout_secs", &self.robots_timeout_secs)
            .field("link_check_timeout_secs", &self.link_check_timeout_secs)
            .field("link_sample_size", &self.link_sample_size)
            .field("competitor_timeout_secs", &self.competitor_timeout_secs)
            .field(
                "local_address_proximity_chars",
                &self.local_address_proximity_chars,
            )
            .field(
                "local_missing_address_penalty",
                &self.local_missing_address_penalty,
            )
            .field(
                "local_partial_address_penalty",
                &self.local_partial_address_penalty,
            )
            .field(
                "local_missing_phone_penalty",
                &self.local_missing_phone_penalty,
            )
            .field(
                "local_entity_suffix_override",
                &self.local_entity_suffix_override,
            )
            .field("llm_api_key", &"[redacted]")
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("llm_temperature", &self.llm_temperature)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("email_primary", &self.email_primary)
            .field("email_secondary", &self.email_secondary)
            .field("email_fallback_enabled", &self.email_fallback_enabled)
            .field("email_timeout_secs", &self.email_timeout_secs)
            .field("email_from_address", &self.email_from_address)
            .field("email_from_name", &self.email_from_name)
            .field(
                "postmark_server_token",
                &self.postmark_server_token.as_ref().map(|_| "[redacted]"),
            )
            .field("postmark_base_url", &self.postmark_base_url)
            .field(
                "sendgrid_api_key",
                &self.sendgrid_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("sendgrid_base_url", &self.sendgrid_base_url)
            .field("report_base_url", &self.report_base_url)
            .finish()
    }
}
