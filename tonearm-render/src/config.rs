//! Render harness configuration
//!
//! TOML-backed settings for the simulation harness (`render-sim`). Every
//! key has a default, so an empty or missing file yields a working
//! configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Settings for the simulation harness
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Source sample rate in Hz
    pub sample_rate: u32,
    /// Source channel count
    pub channel_count: u16,
    /// Frames per encoded access unit produced by the source
    pub packet_frames: u64,
    /// Simulated sink buffer capacity in frames
    pub sink_buffer_frames: u64,
    /// Scheduler tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// Length of the generated tone in seconds
    pub duration_secs: f64,
    /// Initial sink volume (0.0 silence, 1.0 unity)
    pub volume: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channel_count: 2,
            packet_frames: 1_024,
            sink_buffer_frames: 8_192,
            tick_interval_ms: 10,
            duration_secs: 2.0,
            volume: 1.0,
        }
    }
}

impl RenderConfig {
    /// Load configuration
    ///
    /// With an explicit path the file must exist and parse. Without one,
    /// `$CONFIG_DIR/tonearm/render.toml` is used if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
            debug!(path = %path.display(), "no config file, using defaults");
        }
        Ok(Self::default())
    }

    /// Parse configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| {
            Error::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "loaded render config");
        Ok(config)
    }

    /// Platform config-directory location for the harness config
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tonearm").join("render.toml"))
    }

    /// Total frames of tone the source should generate
    pub fn total_frames(&self) -> u64 {
        (self.duration_secs * self.sample_rate as f64) as u64
    }
}
