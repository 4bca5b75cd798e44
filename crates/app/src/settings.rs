//! Handles settings for the application. Configuration is written in
//! `settings.toml`.
//!
//! Optional sections disable the corresponding subsystem: no `[telegram]`
//! means no bot, no `[server]` means no HTTP API, no extraction credential
//! means the deterministic fallback parser only.

use config::{Config, ConfigError, File};
use serde::Deserialize;

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite { path: String },
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct Extraction {
    pub dashscope_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub database: Database,
    pub server: Option<Server>,
    pub telegram: Option<Telegram>,
    pub extraction: Option<Extraction>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
