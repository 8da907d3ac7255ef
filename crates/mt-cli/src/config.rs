//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use mt_core::{AllocationConfig, PctScheduledFormula};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Project holding the work sessions.
    pub namespace: String,

    /// Work period length in minutes.
    pub work_period_minutes: u32,

    /// Break length in minutes.
    pub break_period_minutes: u32,

    /// Scheduled-fraction arithmetic used for priorities.
    pub pct_scheduled: PctScheduledFormula,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("namespace", &self.namespace)
            .field("work_period_minutes", &self.work_period_minutes)
            .field("break_period_minutes", &self.break_period_minutes)
            .field("pct_scheduled", &self.pct_scheduled)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let allocation = AllocationConfig::default();
        Self {
            database_path: data_dir.join("mt.db"),
            namespace: "Life".to_string(),
            work_period_minutes: allocation.work_period_minutes,
            break_period_minutes: allocation.break_period_minutes,
            pct_scheduled: allocation.pct_scheduled,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (MT_*)
        figment = figment.merge(Env::prefixed("MT_"));

        figment.extract()
    }

    /// Allocation settings for a scheduling run.
    pub const fn allocation(&self) -> AllocationConfig {
        AllocationConfig {
            work_period_minutes: self.work_period_minutes,
            break_period_minutes: self.break_period_minutes,
            pct_scheduled: self.pct_scheduled,
        }
    }
}

/// Returns the platform-specific config directory for mt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mt"))
}

/// Returns the platform-specific data directory for mt.
///
/// On Linux: `~/.local/share/mt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("mt"))
}
