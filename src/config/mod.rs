//! Configuration management
//!
//! Configuration is loaded from `config.yml` and then overridden by
//! environment variables. Every field has a default, so a missing or empty
//! file yields a runnable development setup (in-memory storage, log mailer,
//! no human verification).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub leads: LeadConfig,
    #[serde(default)]
    pub turnstile: TurnstileConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based admin auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Directory holding the built single-page app
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a reverse proxy that overwrites these headers.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            static_dir: default_static_dir(),
            trust_forwarded_headers: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("dist/public")
}

/// Public identity of the site, used for SEO tags and the sitemap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Absolute base URL without trailing slash
    #[serde(default = "default_site_url")]
    pub url: String,
    #[serde(default = "default_site_image")]
    pub default_image: String,
    #[serde(default = "default_twitter_handle")]
    pub twitter_handle: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            url: default_site_url(),
            default_image: default_site_image(),
            twitter_handle: default_twitter_handle(),
        }
    }
}

fn default_site_name() -> String {
    "ZeengoCorp Innovations Pvt. Ltd.".to_string()
}

fn default_site_url() -> String {
    "https://zeengocorp.com".to_string()
}

fn default_site_image() -> String {
    "/attached_assets/logo.png".to_string()
}

fn default_twitter_handle() -> String {
    "@zeengocorp".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub driver: DatabaseDriver,
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/venture-site.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    #[default]
    Sqlite,
    Mysql,
}

/// Which storage backend holds users, posts, contacts and subscribers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub driver: StorageDriver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// Process-local maps, lost on restart
    #[default]
    Memory,
    /// SQL database from `database`
    Database,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

/// Lead-capture pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadConfig {
    #[serde(default)]
    pub profile: DeploymentProfile,
    /// Submissions allowed per client IP within the window
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: usize,
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_seconds: i64,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            profile: DeploymentProfile::default(),
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_seconds: default_rate_limit_window(),
        }
    }
}

fn default_rate_limit_max() -> usize {
    5
}

fn default_rate_limit_window() -> i64 {
    60
}

/// How lead submissions are finished.
///
/// `Server` persists every accepted submission and answers 201 with the
/// stored record. `Edge` stores nothing, answers 200 with a status message,
/// and refuses token-less submissions when a verification secret is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentProfile {
    #[default]
    Server,
    Edge,
}

/// Cloudflare Turnstile configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnstileConfig {
    /// Verification is skipped entirely when no secret is configured
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
}

impl Default for TurnstileConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            verify_url: default_verify_url(),
        }
    }
}

fn default_verify_url() -> String {
    "https://challenges.cloudflare.com/turnstile/v0/siteverify".to_string()
}

/// Outgoing notification mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub driver: MailDriver,
    #[serde(default = "default_recipient")]
    pub recipient: String,
    #[serde(default = "default_sender")]
    pub sender: String,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default)]
    pub sendgrid_api_key: Option<String>,
    #[serde(default = "default_sendgrid_url")]
    pub sendgrid_url: String,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            driver: MailDriver::default(),
            recipient: default_recipient(),
            sender: default_sender(),
            sender_name: default_sender_name(),
            sendgrid_api_key: None,
            sendgrid_url: default_sendgrid_url(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
        }
    }
}

fn default_recipient() -> String {
    "contact@zeengocorp.com".to_string()
}

fn default_sender() -> String {
    "no-reply@zeengocorp.com".to_string()
}

fn default_sender_name() -> String {
    "ZeengoCorp Website".to_string()
}

fn default_sendgrid_url() -> String {
    "https://api.sendgrid.com/v3/mail/send".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MailDriver {
    /// Write notifications to the log only
    #[default]
    Log,
    Sendgrid,
    Smtp,
}

/// Admin account seeded at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// File-based content configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_posts_dir")]
    pub posts_dir: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            posts_dir: default_posts_dir(),
        }
    }
}

fn default_posts_dir() -> PathBuf {
    PathBuf::from("content/posts")
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file.
    ///
    /// A missing or empty file yields the defaults; invalid YAML is an error
    /// carrying the line and column.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file, then apply environment overrides.
    ///
    /// Recognised variables:
    /// - `VENTURE_SITE_SERVER_HOST`, `VENTURE_SITE_SERVER_PORT`,
    ///   `VENTURE_SITE_SERVER_CORS_ORIGIN`, `VENTURE_SITE_SERVER_STATIC_DIR`,
    ///   `VENTURE_SITE_SERVER_TRUST_FORWARDED_HEADERS`
    /// - `VENTURE_SITE_SITE_URL`
    /// - `VENTURE_SITE_DATABASE_DRIVER`, `VENTURE_SITE_DATABASE_URL`
    /// - `DATABASE_URL` (also switches storage to the database)
    /// - `VENTURE_SITE_STORAGE_DRIVER`
    /// - `VENTURE_SITE_LEADS_PROFILE`
    /// - `TURNSTILE_SECRET_KEY`
    /// - `SENDGRID_API_KEY` (also selects the sendgrid driver when the driver is `log`)
    /// - `RECIPIENT_EMAIL`, `SENDER_EMAIL`
    /// - `VENTURE_SITE_ADMIN_USERNAME`, `VENTURE_SITE_ADMIN_PASSWORD`
    /// - `VENTURE_SITE_CONTENT_POSTS_DIR`
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("VENTURE_SITE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("VENTURE_SITE_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("VENTURE_SITE_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(dir) = std::env::var("VENTURE_SITE_SERVER_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(dir);
        }
        if let Ok(trust) = std::env::var("VENTURE_SITE_SERVER_TRUST_FORWARDED_HEADERS") {
            if let Ok(trust) = trust.parse::<bool>() {
                self.server.trust_forwarded_headers = trust;
            }
        }
        if let Ok(url) = std::env::var("VENTURE_SITE_SITE_URL") {
            self.site.url = url.trim_end_matches('/').to_string();
        }

        if let Ok(driver) = std::env::var("VENTURE_SITE_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {}
            }
        }
        if let Ok(url) = std::env::var("VENTURE_SITE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if url.starts_with("mysql://") {
                self.database.driver = DatabaseDriver::Mysql;
            }
            self.database.url = url;
            self.storage.driver = StorageDriver::Database;
        }
        if let Ok(driver) = std::env::var("VENTURE_SITE_STORAGE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "memory" => self.storage.driver = StorageDriver::Memory,
                "database" => self.storage.driver = StorageDriver::Database,
                _ => {}
            }
        }

        if let Ok(profile) = std::env::var("VENTURE_SITE_LEADS_PROFILE") {
            match profile.to_lowercase().as_str() {
                "server" => self.leads.profile = DeploymentProfile::Server,
                "edge" => self.leads.profile = DeploymentProfile::Edge,
                _ => {}
            }
        }
        if let Ok(secret) = std::env::var("TURNSTILE_SECRET_KEY") {
            if !secret.is_empty() {
                self.turnstile.secret_key = Some(secret);
            }
        }

        if let Ok(key) = std::env::var("SENDGRID_API_KEY") {
            if !key.is_empty() {
                self.mail.sendgrid_api_key = Some(key);
                if self.mail.driver == MailDriver::Log {
                    self.mail.driver = MailDriver::Sendgrid;
                }
            }
        }
        if let Ok(recipient) = std::env::var("RECIPIENT_EMAIL") {
            self.mail.recipient = recipient;
        }
        if let Ok(sender) = std::env::var("SENDER_EMAIL") {
            self.mail.sender = sender;
        }

        if let Ok(username) = std::env::var("VENTURE_SITE_ADMIN_USERNAME") {
            self.admin.username = Some(username);
        }
        if let Ok(password) = std::env::var("VENTURE_SITE_ADMIN_PASSWORD") {
            self.admin.password = Some(password);
        }
        if let Ok(dir) = std::env::var("VENTURE_SITE_CONTENT_POSTS_DIR") {
            self.content.posts_dir = PathBuf::from(dir);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
