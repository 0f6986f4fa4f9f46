//! Environment-driven configuration
//!
//! All secrets come from the environment (loaded from `.env` in the
//! binary). Missing optional integrations disable the matching feature
//! instead of failing startup.

use crate::budget::DEFAULT_WEEKLY_LIMIT;
use crate::qr::QrConfig;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Groq API key. `None` disables Tier 1 entirely.
    pub groq_api_key: Option<String>,
    /// Administrative kill switch for the model path, independent of
    /// whether a key is present.
    pub model_enabled: bool,
    pub weekly_limit: i64,
    pub search_api_key: Option<String>,
    pub search_cse_id: Option<String>,
    pub qr: QrConfig,
    pub reminder_file: String,
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let groq_api_key = non_empty("GROQ_API_KEY");
        if groq_api_key.is_none() {
            warn!("GROQ_API_KEY not set, model interpreter disabled");
        }

        let model_enabled = std::env::var("MODEL_DISABLED")
            .map(|v| v != "1" && v.to_lowercase() != "true")
            .unwrap_or(true);

        let weekly_limit = non_empty("WEEKLY_LIMIT")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_WEEKLY_LIMIT);

        let search_api_key = non_empty("GOOGLE_SEARCH_API_KEY");
        let search_cse_id = non_empty("GOOGLE_CSE_ID");
        if search_api_key.is_some() != search_cse_id.is_some() {
            warn!("search needs both GOOGLE_SEARCH_API_KEY and GOOGLE_CSE_ID, disabling");
        }

        let reminder_file =
            non_empty("REMINDER_FILE").unwrap_or_else(|| "reminders.json".to_string());

        info!(
            model_enabled,
            weekly_limit,
            search_configured = search_api_key.is_some() && search_cse_id.is_some(),
            "configuration loaded"
        );

        Self {
            groq_api_key,
            model_enabled,
            weekly_limit,
            search_api_key,
            search_cse_id,
            qr: QrConfig::from_env(),
            reminder_file,
        }
    }

    pub fn search_credentials(&self) -> Option<(String, String)> {
        match (&self.search_api_key, &self.search_cse_id) {
            (Some(key), Some(cse)) => Some((key.clone(), cse.clone())),
            _ => None,
        }
    }
}
