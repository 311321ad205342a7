//! Configuration loading
//!
//! Settings are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. `ticket-desk.yaml` in the data directory (optional)
//! 3. `TICKET_DESK__<SECTION>__<KEY>` environment variables

use crate::error::Result;
use crate::rate_limit::RateLimitPolicy;
use crate::store::StoreOptions;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory
    pub data_dir: Option<PathBuf>,
}

/// Page sizes, report sizes and retry budgets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub user_stats_limit: usize,
    pub recent_tickets_limit: usize,
    pub overdue_preview_limit: usize,
    pub max_conflict_retries: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            user_stats_limit: 10,
            recent_tickets_limit: 5,
            overdue_preview_limit: 5,
            max_conflict_retries: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: usize,
    pub window_secs: u64,
    pub capacity: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests: 60,
            window_secs: 60,
            capacity: 10_000,
        }
    }
}

impl RateLimitConfig {
    pub const fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            max_requests: self.max_requests,
            window: Duration::from_secs(self.window_secs),
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub const FILE_NAME: &'static str = "ticket-desk.yaml";
    pub const ENV_PREFIX: &'static str = "TICKET_DESK";

    /// Platform data directory, falling back to `.ticket-desk` in the
    /// working directory when no home directory is available
    pub fn default_data_dir() -> PathBuf {
        ProjectDirs::from("", "", "ticket-desk")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".ticket-desk"))
    }

    /// Load configuration for a data directory
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::File::from(data_dir.join(Self::FILE_NAME))
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(Self::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let mut loaded: Self = settings.try_deserialize()?;
        if loaded.storage.data_dir.is_none() {
            loaded.storage.data_dir = Some(data_dir.to_path_buf());
        }
        Ok(loaded)
    }

    /// Load configuration from the default data directory
    pub fn load_or_default() -> Result<Self> {
        Self::load(&Self::default_data_dir())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            default_page_size: self.limits.default_page_size,
            max_page_size: self.limits.max_page_size,
            user_stats_limit: self.limits.user_stats_limit,
            recent_tickets_limit: self.limits.recent_tickets_limit,
            overdue_preview_limit: self.limits.overdue_preview_limit,
            max_conflict_retries: self.limits.max_conflict_retries,
        }
    }
}
