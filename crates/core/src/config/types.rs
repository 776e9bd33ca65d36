use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub irc: IrcConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// API tokens and the user each one acts as (api_key method only).
    #[serde(default)]
    pub tokens: HashMap<String, u32>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("orpheum.db")
}

/// Site-wide settings used when building links and routing notifications.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_url")]
    pub site_url: String,
    /// Polls created in this forum are announced on the moderation channel.
    #[serde(default)]
    pub staff_forum_id: Option<u32>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            staff_forum_id: None,
        }
    }
}

fn default_site_url() -> String {
    "https://localhost".to_string()
}

/// IRC relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IrcConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Address of the bot's raw relay socket (e.g. "127.0.0.1:51010")
    #[serde(default)]
    pub relay_addr: Option<String>,
    #[serde(default = "default_mod_channel")]
    pub mod_channel: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            relay_addr: None,
            mod_channel: default_mod_channel(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_mod_channel() -> String {
    "#mod".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub site: SiteConfig,
    pub irc: IrcConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub tokens_configured: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                tokens_configured: config.auth.tokens.len(),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            site: config.site.clone(),
            irc: config.irc.clone(),
        }
    }
}
