use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use std::env;
use std::time::Duration;
use validator::Validate;

use crate::google::ServiceAccountKey;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub notion_api_key: String,
    #[validate(length(min = 1))]
    pub notion_page_id: String,
    #[validate(length(min = 1))]
    pub openai_api_key: String,
    #[validate(length(min = 1))]
    pub openai_model: String,
    /// `None` when GOOGLE_CREDENTIALS is missing or unreadable; the calendar
    /// source then reports itself unavailable
    pub google_credentials: Option<ServiceAccountKey>,
    #[validate(length(min = 1))]
    pub calendar_id: String,
    pub capture_database_id: Option<String>,
    pub goals_database_id: Option<String>,
    pub checklist_page_id: Option<String>,
    pub timezone: Tz,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| get(name).with_context(|| format!("{} must be set", name));

        let google_credentials = match get("GOOGLE_CREDENTIALS") {
            Some(raw) => match ServiceAccountKey::from_json(&raw) {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::warn!("Google setup error: {} - calendar disabled", e);
                    None
                }
            },
            None => {
                tracing::info!("GOOGLE_CREDENTIALS not set - calendar disabled");
                None
            }
        };

        let timezone = get("TIMEZONE")
            .unwrap_or_else(|| "Asia/Kolkata".to_string())
            .parse::<Tz>()
            .map_err(|e| anyhow!("TIMEZONE must be an IANA zone name: {}", e))?;

        let http_timeout_secs: u64 = get("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "15".to_string())
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a valid number")?;

        let max_attempts: u32 = get("RETRY_MAX_ATTEMPTS")
            .unwrap_or_else(|| "3".to_string())
            .parse()
            .context("RETRY_MAX_ATTEMPTS must be a valid number")?;

        let base_delay_secs: u64 = get("RETRY_BASE_DELAY_SECS")
            .unwrap_or_else(|| "3".to_string())
            .parse()
            .context("RETRY_BASE_DELAY_SECS must be a valid number")?;

        let config = Self {
            notion_api_key: required("NOTION_API_KEY")?,
            notion_page_id: required("NOTION_PAGE_ID")?,
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            google_credentials,
            calendar_id: get("GOOGLE_CALENDAR_ID").unwrap_or_else(|| "primary".to_string()),
            capture_database_id: get("CAPTURE_DATABASE_ID"),
            goals_database_id: get("GOALS_DATABASE_ID"),
            checklist_page_id: get("CHECKLIST_PAGE_ID"),
            timezone,
            http_timeout: Duration::from_secs(http_timeout_secs),
            retry: RetryPolicy::linear(max_attempts, Duration::from_secs(base_delay_secs)),
        };

        config.validate().context("Invalid configuration")?;

        Ok(config)
    }

    /// Database ids the briefing cannot run without.
    pub fn briefing_databases(&self) -> Result<(&str, &str)> {
        let captures = self
            .capture_database_id
            .as_deref()
            .context("CAPTURE_DATABASE_ID must be set for the briefing")?;
        let goals = self
            .goals_database_id
            .as_deref()
            .context("GOALS_DATABASE_ID must be set for the briefing")?;
        Ok((captures, goals))
    }
}
