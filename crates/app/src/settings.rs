//! Settings for the application, read from `settings.toml` and `FUEL_*`
//! environment variables (`FUEL_DATABASE__URL`, `FUEL_SERVER__PORT`, ...).
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Parser)]
#[command(name = "fuel_estimator", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    /// Seconds before an untouched form session is dropped.
    pub session_idle_secs: u64,
    pub max_sessions: usize,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            session_idle_secs: 30 * 60,
            max_sessions: 10_000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Database {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub anonymous_user: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            anonymous_user: "anonymous".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub database: Database,
    pub identity: Identity,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        Self::from_path(args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH))
    }

    fn from_path(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("FUEL").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Usable database URL, or the reason the store will run degraded.
    pub fn database_url(&self) -> Result<&str, String> {
        match self.database.url.as_deref().map(str::trim) {
            None | Some("") => Err("no database url configured".to_string()),
            Some(url) if url.starts_with("sqlite:") => Ok(url),
            Some(url) => Err(format!("unsupported database url: {url}")),
        }
    }

    /// `None` when anonymous sessions are disabled.
    pub fn anonymous_user(&self) -> Option<String> {
        let user = self.identity.anonymous_user.trim();
        (!user.is_empty()).then(|| user.to_string())
    }
}
