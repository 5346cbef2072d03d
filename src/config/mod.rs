use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Handed out when a webinar has no meeting URL of its own.
    #[serde(default = "default_meeting_url")]
    pub default_meeting_url: String,

    #[serde(default = "default_meeting_session_hours")]
    pub meeting_session_hours: i64,
}

/// Source adapter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Sleep for each platform's rate limit before producing its catalog.
    #[serde(default = "default_true")]
    pub simulate_delay: bool,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    #[serde(default = "default_cache_window_mins")]
    pub cache_window_mins: i64,

    #[serde(default = "default_enabled_sources")]
    pub enabled_sources: Vec<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// Scheduler and background scrape queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Local hour (0-23) of the daily update.
    #[serde(default = "default_daily_hour")]
    pub daily_hour: u32,

    /// User-triggered scrapes regenerate content only above this many new webinars.
    #[serde(default = "default_user_trigger_threshold")]
    pub user_trigger_threshold: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Read endpoints publish scrape jobs to the background queue.
    #[serde(default = "default_true")]
    pub background_scrapes: bool,
}

/// SEO content configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub build_hook_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_listicles_per_run")]
    pub listicles_per_run: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_meeting_url() -> String {
    "https://meet.google.com/pnz-piqy-vvx".to_string()
}
fn default_meeting_session_hours() -> i64 {
    24
}
fn default_jitter_ms() -> u64 {
    250
}
fn default_cache_window_mins() -> i64 {
    60
}
fn default_enabled_sources() -> Vec<String> {
    crate::scraper::Platform::ALL
        .iter()
        .map(|p| p.name().to_string())
        .collect()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/webinars.duckdb")
}
fn default_true() -> bool {
    true
}
fn default_daily_hour() -> u32 {
    6
}
fn default_user_trigger_threshold() -> usize {
    5
}
fn default_queue_capacity() -> usize {
    64
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_listicles_per_run() -> usize {
    3
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            default_meeting_url: default_meeting_url(),
            meeting_session_hours: default_meeting_session_hours(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            simulate_delay: true,
            jitter_ms: default_jitter_ms(),
            cache_window_mins: default_cache_window_mins(),
            enabled_sources: default_enabled_sources(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            run_migrations: true,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_hour: default_daily_hour(),
            user_trigger_threshold: default_user_trigger_threshold(),
            queue_capacity: default_queue_capacity(),
            background_scrapes: true,
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            build_hook_url: None,
            timeout_secs: default_timeout_secs(),
            listicles_per_run: default_listicles_per_run(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            scraper: ScraperConfig::default(),
            storage: StorageConfig::default(),
            scheduler: SchedulerConfig::default(),
            content: ContentConfig::default(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("WEBINAR_HUB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("scraper.enabled_sources")
                    .try_parsing(true),
            )
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize()?;
        app_cfg.validate()?;
        Ok(app_cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.scheduler.daily_hour > 23 {
            anyhow::bail!("scheduler.daily_hour must be 0-23, got {}", self.scheduler.daily_hour);
        }
        if self.scheduler.queue_capacity == 0 {
            anyhow::bail!("scheduler.queue_capacity must be at least 1");
        }
        if let Some(hook) = &self.content.build_hook_url {
            url::Url::parse(hook)
                .map_err(|e| anyhow::anyhow!("content.build_hook_url {:?}: {}", hook, e))?;
        }
        Ok(())
    }

    /// Configuration for tests: no artificial delays, in-process defaults.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let mut cfg = Self::default();
        cfg.scraper.simulate_delay = false;
        cfg.scraper.jitter_ms = 0;
        cfg
    }
}
