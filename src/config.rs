//! Settings file and environment loading.
//!
//! Settings come from three layers, later layers winning: built-in
//! defaults, `~/.config/gastop/config.toml`, then `GASTOP_*` environment
//! variables. Command-line flags override all of them in `main`.
//!
//! ```toml
//! interval = "2s"
//! stall_threshold_minutes = 30
//! feed_lines = 8
//!
//! [paths]
//! gt_binary = "gt"
//! town_root = "/home/joe/gastown"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::model::parse_duration;
use crate::registry::RegistryConfig;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Poll interval as a duration string ("1500ms", "2s").
    pub interval: String,
    /// Missed polls an absent workspace is retained as terminated.
    pub grace_cycles: u32,
    /// Minutes without activity before a working session counts as
    /// stalled. Zero disables the activity rule.
    pub stall_threshold_minutes: u64,
    /// Rows of the lifecycle feed panel.
    pub feed_lines: usize,
    pub show_feed: bool,
    /// Redraw ceiling in frames per second.
    pub frame_rate: u32,
    pub paths: Paths,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Paths {
    /// The Gas Town CLI binary to shell out to.
    pub gt_binary: String,
    /// Town root directory; auto-detected when unset.
    pub town_root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval: "1500ms".to_string(),
            grace_cycles: 1,
            stall_threshold_minutes: 30,
            feed_lines: 8,
            show_feed: true,
            frame_rate: 30,
            paths: Paths::default(),
        }
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            gt_binary: "gt".to_string(),
            town_root: None,
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Result<Duration> {
        parse_duration(&self.interval)
            .with_context(|| format!("bad interval {:?} in settings", self.interval))
    }

    pub fn stall_threshold(&self) -> Duration {
        Duration::from_secs(self.stall_threshold_minutes * 60)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            grace_cycles: self.grace_cycles,
            stall_threshold: self.stall_threshold(),
        }
    }
}

/// Default settings file location, if a config directory exists.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gastop").join("config.toml"))
}

/// Load settings from the default location plus the environment.
/// A missing settings file is not an error.
pub fn load() -> Result<Settings> {
    let mut builder = Config::builder();
    if let Some(path) = config_path() {
        builder = builder.add_source(File::from(path).required(false));
    }
    let config = builder
        .add_source(Environment::with_prefix("GASTOP").try_parsing(true))
        .build()
        .context("loading settings")?;
    config.try_deserialize().context("reading settings")
}

/// Load settings from an explicit file plus the environment.
pub fn load_from(path: &Path) -> Result<Settings> {
    let config = Config::builder()
        .add_source(File::from(path.to_path_buf()))
        .add_source(Environment::with_prefix("GASTOP").try_parsing(true))
        .build()
        .with_context(|| format!("loading settings from {}", path.display()))?;
    config.try_deserialize().context("reading settings")
}
