//! Runtime configuration, persisted as JSON

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::display::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::game::{GameConfig, MAX_TONE_HZ, MIN_TONE_HZ};

pub const DEFAULT_CONFIG_PATH: &str = "backbuffer.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What happens to the logical frame buffer when the window changes size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Keep the logical size and scale it to the window on present
    #[default]
    Stretch,
    /// Reallocate the frame buffer at the window size
    Match,
}

/// Reaction to the device queue running dry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnderrunPolicy {
    /// End the session
    #[default]
    Terminate,
    /// Log and keep going
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub resize_mode: ResizeMode,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "backbuffer".to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            vsync: true,
            resize_mode: ResizeMode::Stretch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    pub sample_rate: u32,
    pub periods_per_second: u32,
    pub volume: u16,
    /// Periods of silence queued before playback starts
    pub prefill_periods: u32,
    /// The loop waits while more than this many periods are queued
    pub max_queued_periods: u32,
    pub underrun_policy: UnderrunPolicy,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_rate: 48000,
            periods_per_second: 60,
            volume: 3000,
            prefill_periods: 2,
            max_queued_periods: 4,
            underrun_policy: UnderrunPolicy::Terminate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub audio: AudioConfig,
    pub game: GameConfig,
}

impl Config {
    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load config from a JSON file. Missing sections and fields take their
    /// defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Reject anything that would hand the core an invalid buffer or the
    /// device an impossible format. Runs before any window is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.window;
        if w.width == 0 || w.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be at least 1x1, got {}x{}",
                w.width, w.height
            )));
        }

        let a = &self.audio;
        if a.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be positive".into()));
        }
        if a.periods_per_second == 0 || a.periods_per_second > a.sample_rate {
            return Err(ConfigError::Invalid(format!(
                "periods_per_second must be between 1 and {}",
                a.sample_rate
            )));
        }
        if a.volume > i16::MAX as u16 {
            return Err(ConfigError::Invalid(format!(
                "volume must be at most {}",
                i16::MAX
            )));
        }
        if a.max_queued_periods == 0 || a.prefill_periods > a.max_queued_periods {
            return Err(ConfigError::Invalid(
                "max_queued_periods must be positive and at least prefill_periods".into(),
            ));
        }

        let g = &self.game;
        if !(MIN_TONE_HZ..=MAX_TONE_HZ).contains(&g.tone_hz) {
            return Err(ConfigError::Invalid(format!(
                "tone_hz must be between {} and {}",
                MIN_TONE_HZ, MAX_TONE_HZ
            )));
        }
        if g.tone_hz >= a.sample_rate as f32 / 2.0 {
            return Err(ConfigError::Invalid(format!(
                "tone_hz {} is above the Nyquist limit for {} Hz",
                g.tone_hz, a.sample_rate
            )));
        }
        if !g.scroll_speed.is_finite() || !g.tone_step_hz.is_finite() {
            return Err(ConfigError::Invalid(
                "scroll_speed and tone_step_hz must be finite".into(),
            ));
        }
        Ok(())
    }
}
