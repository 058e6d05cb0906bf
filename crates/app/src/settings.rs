//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and from `SUMA__*` environment variables, e.g.
//! `SUMA__SERVER__PORT=9000` or `SUMA__IDENTITY__API_KEY=...`.
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    pub timezone: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            timezone: engine::DEFAULT_TIMEZONE.name().to_string(),
        }
    }
}

impl App {
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::Message(format!("unknown timezone: {}", self.timezone)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: Database,
}

fn default_port() -> u16 {
    8001
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    Remote,
    Static,
    #[default]
    Disabled,
}

#[derive(Debug, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub mode: IdentityMode,
    pub api_key: Option<String>,
    pub lookup_url: Option<String>,
    pub timeout_secs: u64,
    pub tokens: Vec<StaticToken>,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            mode: IdentityMode::Disabled,
            api_key: None,
            lookup_url: None,
            timeout_secs: 10,
            tokens: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub identity: Identity,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("SUMA").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
