//! Board configuration.

use crate::board::{
    DEFAULT_COLS, DEFAULT_FONT_SCALE, DEFAULT_ROWS, MAX_GRID_DIMENSION, slot_count,
};
use crate::export::EXPORT_SCALE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// A named grid size offered as a one-click choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPreset {
    /// Button label, columns first (e.g. `"2x3"`).
    pub label: String,
    pub rows: usize,
    pub cols: usize,
}

impl GridPreset {
    pub fn new(label: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self {
            label: label.into(),
            rows,
            cols,
        }
    }

    /// Tooltip describing the preset.
    pub fn description(&self) -> String {
        format!("Set grid to {} columns x {} rows", self.cols, self.rows)
    }
}

/// Allowed range for the label font scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontScaleRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
}

impl Default for FontScaleRange {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 2.0,
            step: 0.1,
            default: DEFAULT_FONT_SCALE,
        }
    }
}

impl FontScaleRange {
    /// Clamp and snap a value onto the range.
    pub fn snap(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).clamp(self.min, self.max)
    }
}

/// Board settings, all optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
    pub font_scale: FontScaleRange,
    pub presets: Vec<GridPreset>,
    /// Output pixels per page pixel for exports.
    pub export_scale: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            font_scale: FontScaleRange::default(),
            presets: vec![GridPreset::new("2x3", 3, 2), GridPreset::new("3x4", 4, 3)],
            export_scale: EXPORT_SCALE,
        }
    }
}

impl BoardConfig {
    /// Parse a JSON override. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings make sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if slot_count(self.rows, self.cols).is_none() {
            return Err(ConfigError::Invalid(format!(
                "grid must be between 1x1 and {max}x{max}, got {}x{}",
                self.rows,
                self.cols,
                max = MAX_GRID_DIMENSION
            )));
        }
        if let Some(preset) = self
            .presets
            .iter()
            .find(|p| slot_count(p.rows, p.cols).is_none())
        {
            return Err(ConfigError::Invalid(format!(
                "preset '{}' has an invalid grid {}x{}",
                preset.label, preset.rows, preset.cols
            )));
        }
        let range = &self.font_scale;
        if !(range.min > 0.0 && range.min <= range.default && range.default <= range.max) {
            return Err(ConfigError::Invalid(format!(
                "font scale range {}..{} (default {}) is invalid",
                range.min, range.max, range.default
            )));
        }
        if !(self.export_scale.is_finite() && self.export_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "export scale {} must be positive",
                self.export_scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BoardConfig::default();
        assert_eq!((config.rows, config.cols), (4, 3));
        assert_eq!(config.presets.len(), 2);
        assert_eq!(config.presets[0].label, "2x3");
        assert_eq!((config.presets[0].rows, config.presets[0].cols), (3, 2));
        assert_eq!(config.font_scale.min, 0.5);
        assert_eq!(config.font_scale.max, 2.0);
        assert_eq!(config.export_scale, 4.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = BoardConfig::from_json(r#"{"rows": 2, "export_scale": 2.0}"#).unwrap();
        assert_eq!(config.rows, 2);
        assert_eq!(config.cols, 3);
        assert_eq!(config.export_scale, 2.0);
        assert_eq!(config.presets, BoardConfig::default().presets);
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            BoardConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            BoardConfig::from_json(r#"{"cols": 0}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BoardConfig::from_json(r#"{"rows": 9223372036854775807, "cols": 3}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BoardConfig::from_json(
                r#"{"presets": [{"label": "huge", "rows": 1000, "cols": 1000}]}"#
            ),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BoardConfig::from_json(r#"{"font_scale": {"min": 0.0}}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_font_scale_snap() {
        let range = FontScaleRange::default();
        assert!((range.snap(1.23) - 1.2).abs() < 1e-5);
        assert_eq!(range.snap(0.1), 0.5);
        assert_eq!(range.snap(5.0), 2.0);
    }

    #[test]
    fn test_preset_description() {
        let preset = GridPreset::new("3x4", 4, 3);
        assert_eq!(preset.description(), "Set grid to 3 columns x 4 rows");
    }
}
