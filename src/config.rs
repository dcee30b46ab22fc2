use std::env;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@fixify.com";
pub const DEFAULT_TICKET_URL_BASE: &str = "https://fixify-admin.web.app/tickets";
pub const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_bot_token: Option<String>,
    pub fallback_recipient: Option<String>,
    pub firestore: FirestoreConfig,
    pub admin_email: String,
    pub ticket_url_base: String,
    pub http_timeout: Duration,
    pub log_json: bool,
}

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: Option<String>,
    pub database: String,
    pub access_token: Option<String>,
    pub emulator_host: Option<String>,
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let http_timeout = match read("FIXIFY_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    AppError::Configuration(format!(
                        "FIXIFY_HTTP_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
                    ))
                })?;
                if secs == 0 {
                    return Err(AppError::Configuration(
                        "FIXIFY_HTTP_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let log_json = read("FIXIFY_LOG_JSON")
            .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            // Secrets are kept raw; the dispatcher cleans them before use.
            slack_bot_token: lookup("SLACK_BOT_TOKEN"),
            fallback_recipient: lookup("SLACK_USER_ID"),
            firestore: FirestoreConfig {
                project_id: read("FIRESTORE_PROJECT_ID"),
                database: read("FIRESTORE_DATABASE")
                    .unwrap_or_else(|| DEFAULT_FIRESTORE_DATABASE.to_string()),
                access_token: read("FIRESTORE_ACCESS_TOKEN"),
                emulator_host: read("FIRESTORE_EMULATOR_HOST"),
            },
            admin_email: read("FIXIFY_ADMIN_EMAIL")
                .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
            ticket_url_base: read("FIXIFY_TICKET_URL_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_TICKET_URL_BASE.to_string()),
            http_timeout,
            log_json,
        })
    }

    pub fn ticket_url(&self, ticket_id: &str) -> String {
        format!("{}/{}", self.ticket_url_base, ticket_id)
    }
}
