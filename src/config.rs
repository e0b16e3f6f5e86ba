use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::display::DisplayOptions;
use crate::picking::mapping::{Delay, TimeUnit};
use crate::picking::pick::PickIndexMode;

/// Environment variable pointing at the settings file.
pub const CONFIG_ENV: &str = "RUSTY_PICKER_CONFIG";
/// Settings file used when the environment variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "rusty-picker.json";

/// How the central plot lays out the gather.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotLayout {
    /// Every trace side by side, time growing downward.
    #[default]
    Gather,
    /// One small plot per trace, time along x.
    Traces,
}

// ---------------------------------------------------------------------------
// Viewer settings
// ---------------------------------------------------------------------------

/// Persisted viewer settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub display: DisplayOptions,
    pub time_unit: TimeUnit,
    pub delay: Delay,
    /// Force this sampling rate (Hz) instead of the file's.
    pub sampling_rate_override: Option<f64>,
    pub pick_index_mode: PickIndexMode,
    /// Round picked times to the nearest sample.
    pub snap_to_sample: bool,
    pub window_size: [f32; 2],
    pub layout: PlotLayout,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            display: DisplayOptions::default(),
            time_unit: TimeUnit::default(),
            delay: Delay::default(),
            sampling_rate_override: None,
            pick_index_mode: PickIndexMode::default(),
            snap_to_sample: false,
            window_size: [1200.0, 700.0],
            layout: PlotLayout::default(),
        }
    }
}

impl ViewerConfig {
    /// Where settings are read from and saved to.
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Read settings from `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
    }

    /// Like [`ViewerConfig::load`] but falls back to defaults on error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Ignoring settings: {e:#}");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serializing settings")?;
        std::fs::write(path, text).with_context(|| format!("writing settings {}", path.display()))?;
        log::info!("Saved settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picking::mapping::DelayUnit;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ViewerConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(cfg, ViewerConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(
            &path,
            r#"{"time_unit": "seconds", "pick_index_mode": "interpolated", "delay": {"enabled": true, "value": 2.5, "unit": "ms"}, "layout": "traces"}"#,
        )
        .unwrap();
        let cfg = ViewerConfig::load(&path).unwrap();
        assert_eq!(cfg.time_unit, TimeUnit::Seconds);
        assert_eq!(cfg.pick_index_mode, PickIndexMode::Interpolated);
        assert_eq!(cfg.delay.unit, DelayUnit::Ms);
        assert_eq!(cfg.layout, PlotLayout::Traces);
        assert_eq!(cfg.display, DisplayOptions::default());
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let cfg = ViewerConfig {
            snap_to_sample: true,
            sampling_rate_override: Some(2000.0),
            ..ViewerConfig::default()
        };
        cfg.save(&path).unwrap();
        assert_eq!(ViewerConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ViewerConfig::load(&path).is_err());
        assert_eq!(ViewerConfig::load_or_default(&path), ViewerConfig::default());
    }
}
