//! Configuration module for the WaveScope streaming core
//!
//! This module holds the tuning knobs of the log-to-waveform pipeline and
//! their persistence:
//! - Named defaults for every rate, window, and capacity constant
//! - [`PipelineConfig`] with TOML load/save support
//! - The platform-appropriate configuration file location
//!
//! # Config Location
//!
//! The pipeline configuration is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.hxyulin.wavescope-rs/pipeline.toml`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.wavescope-rs/pipeline.toml`
//! - **Windows**: `%APPDATA%\dev.hxyulin.wavescope-rs\pipeline.toml`
//!
//! # Example
//!
//! ```ignore
//! use wavescope_rs::config::PipelineConfig;
//!
//! let config = PipelineConfig::load_or_default();
//! assert_eq!(config.target_fps, 15);
//! ```

use crate::error::{Result, ResultExt, WavescopeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.hxyulin.wavescope-rs";

/// Pipeline configuration filename
pub const CONFIG_FILE: &str = "pipeline.toml";

/// Default maximum sink update rate in frames per second
pub const DEFAULT_TARGET_FPS: u32 = 15;

/// Default maximum number of events folded per tick
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Default lookback window when matching the last seen event id
pub const DEFAULT_LOOKBACK: usize = 50;

/// Default auto-follow viewport width in samples
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Idle samples appended on both lanes after each event
pub const IDLE_GAP_SAMPLES: usize = 4;

/// Default tick source rate in Hz (stands in for a display-refresh callback)
pub const DEFAULT_TICK_HZ: u32 = 60;

/// Default session log capacity in events
pub const DEFAULT_LOG_CAPACITY: usize = 5000;

/// Capacity of the bounded channel behind a [`ChannelSink`](crate::pipeline::ChannelSink)
pub const SINK_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the pipeline command channel
pub const CMD_CHANNEL_CAPACITY: usize = 256;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        WavescopeError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            WavescopeError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the pipeline configuration file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Pipeline Configuration ====================

/// Tuning knobs of the log-to-waveform streaming pipeline
///
/// Every field has a named default, so a partial TOML file only overrides
/// the values it mentions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum sink update rate; ticks arriving faster are throttled
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// Maximum number of pending events folded per accepted tick
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Auto-follow viewport width in samples
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// How many log entries the follower scans back for its last seen id
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    /// Idle samples appended on both lanes after each event
    #[serde(default = "default_idle_gap")]
    pub idle_gap_samples: usize,

    /// Tick source rate driving the scheduler thread
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,

    /// Session log capacity in events before front truncation
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

fn default_target_fps() -> u32 {
    DEFAULT_TARGET_FPS
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_lookback() -> usize {
    DEFAULT_LOOKBACK
}

fn default_idle_gap() -> usize {
    IDLE_GAP_SAMPLES
}

fn default_tick_hz() -> u32 {
    DEFAULT_TICK_HZ
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            chunk_size: default_chunk_size(),
            window_size: default_window_size(),
            lookback: default_lookback(),
            idle_gap_samples: default_idle_gap(),
            tick_hz: default_tick_hz(),
            log_capacity: default_log_capacity(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration values
    pub fn validate(&self) -> Result<()> {
        if self.target_fps == 0 {
            return Err(WavescopeError::Config(
                "target_fps must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(WavescopeError::Config(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.window_size == 0 {
            return Err(WavescopeError::Config(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.lookback == 0 {
            return Err(WavescopeError::Config(
                "lookback must be at least 1".to_string(),
            ));
        }
        if self.tick_hz == 0 {
            return Err(WavescopeError::Config(
                "tick_hz must be at least 1".to_string(),
            ));
        }
        if self.log_capacity == 0 {
            return Err(WavescopeError::Config(
                "log_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Minimum interval between two accepted scheduler ticks
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.target_fps))
    }

    /// Interval of the tick source driving the scheduler thread
    pub fn tick_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_hz))
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: PipelineConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Save the configuration to the default location, creating the app
    /// data directory if needed. Returns the path written.
    pub fn save_default(&self) -> Result<PathBuf> {
        let dir = ensure_app_data_dir()?;
        let path = dir.join(CONFIG_FILE);
        self.save(&path)?;
        Ok(path)
    }

    /// Load the configuration from the default location, falling back to
    /// defaults when the file is missing or unreadable
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load pipeline config, using defaults: {}", e);
                Self::default()
            }
        }
    }
}
