use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:4567/api";
pub const DEFAULT_DISMISS_LABEL: &str = "OK";
pub const DEFAULT_NOTIFICATION_DURATION_MS: u64 = 6000;

const CONFIG_FILE: &str = "todo-list";
const ENV_PREFIX: &str = "TODO_LIST";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration")]
    CannotLoad(#[from] config::ConfigError),
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base of the API; the todos resource lives at `{api_url}/todos`
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub notification: NotificationConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default = "default_dismiss_label")]
    pub dismiss_label: String,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_ms: None,
            notification: NotificationConfig::default(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dismiss_label: default_dismiss_label(),
            duration_ms: default_duration_ms(),
        }
    }
}

impl NotificationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl ClientConfig {
    /// Loads configuration from an optional `todo-list.toml` and the environment.
    ///
    /// Environment variables use the `TODO_LIST` prefix and `__` between
    /// nested keys, e.g. `TODO_LIST__NOTIFICATION__DURATION_MS=3000`.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_dismiss_label() -> String {
    DEFAULT_DISMISS_LABEL.to_string()
}

fn default_duration_ms() -> u64 {
    DEFAULT_NOTIFICATION_DURATION_MS
}
