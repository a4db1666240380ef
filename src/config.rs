//! Console configuration loaded from defaults, an optional `console.toml` and the environment.
//!
//! Precedence: env vars > `.env` file > `console.toml` > defaults. Environment variables use
//! the `CONSOLE` prefix and `__` as separator, e.g. `CONSOLE_API__BASE_URL`.

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;

use crate::i18n::Locale;

/// Load the configuration
pub fn load() -> Result<ConsoleConfig, ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    defaults()?
        // Optional config file
        .add_source(config::File::with_name("console").required(false))
        // Environment variables (CONSOLE_API__BASE_URL, CONSOLE_QUERY__DEBOUNCE_MS, etc.)
        .add_source(
            config::Environment::with_prefix("CONSOLE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("api.base_url", "")?
        .set_default("api.version", "/api/v1")?
        .set_default("query.members_per_page", 20)?
        .set_default("query.cards_per_page", 20)?
        .set_default("query.debounce_ms", 500)?
        .set_default("query.card_stats_interval_secs", 30)?
        .set_default("locale", "en")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub query: QueryConfig,
    /// Language of the notifications
    pub locale: Locale,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ApiConfig {
    /// Backend origin, e.g. `https://members.example.org`
    pub base_url: String,
    /// Port of the API gateway when it is reached directly
    pub gateway_port: Option<u16>,
    /// Versioned base path
    pub version: String,
}

impl ApiConfig {
    /// Base URL every endpoint path is appended to
    ///
    /// Without an origin this is only the versioned path, for deployments where a reverse proxy
    /// routes the API.
    pub fn full_url(&self) -> String {
        let origin = self.base_url.trim_end_matches('/');
        match (origin, self.gateway_port) {
            ("", _) => self.version.clone(),
            (origin, Some(port)) => format!("{origin}:{port}{}", self.version),
            (origin, None) => format!("{origin}{}", self.version),
        }
    }

    pub fn is_absolute(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    pub members_per_page: u32,
    pub cards_per_page: u32,
    /// Search input debounce in milliseconds
    pub debounce_ms: u64,
    pub card_stats_interval_secs: u64,
}
