//! Construction-time scene configuration
//!
//! Everything here is fixed once a scene is built. Configs can be stored as
//! JSON alongside the presets that use them.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Bounds;
use crate::consts::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Balance scale geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Pivot point of the beam
    pub fulcrum: Vec2,
    pub beam_width: f32,
    /// Maximum tilt (radians)
    pub max_angle: f32,
    /// Weight difference at which the beam is fully tilted
    pub max_weight: i64,
    pub plate_diameter: f32,
    /// Distance from the beam end up to the plate
    pub plate_support_height: f32,
    /// How far in from the beam ends the plates hang
    pub plate_x_inset: f32,
    pub grid_rows: usize,
    pub grid_columns: usize,
    /// Gap between the plate surface and the bottom of its grid
    pub grid_y_offset: f32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            fulcrum: Vec2::new(512.0, 500.0),
            beam_width: BEAM_WIDTH,
            max_angle: MAX_ANGLE,
            max_weight: MAX_WEIGHT,
            plate_diameter: PLATE_DIAMETER,
            plate_support_height: PLATE_SUPPORT_HEIGHT,
            plate_x_inset: PLATE_X_INSET,
            grid_rows: GRID_ROWS,
            grid_columns: GRID_COLUMNS,
            grid_y_offset: GRID_Y_OFFSET,
        }
    }
}

/// Everything a scene needs at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub scale: ScaleConfig,

    // === Terms ===
    pub small_term_diameter: f32,
    /// Diameter of a term produced by combining like terms
    pub big_term_diameter: f32,
    /// Largest numerator/denominator allowed on the scale
    pub max_integer: i64,

    // === Behavior ===
    /// `None` when the scene has no lock control; otherwise its initial state
    pub locked: Option<bool>,
    /// All like terms share one cell per creator (otherwise one cell per term)
    pub combine_like_terms: bool,
    /// Releasing a term this far below its plate returns it to the toolbox
    pub return_to_toolbox_dy: f32,
    /// Term motion speed (units/second)
    pub animation_speed: f32,
    /// Where terms may be dragged
    pub drag_bounds: Bounds,
    pub number_of_snapshots: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            scale: ScaleConfig::default(),
            small_term_diameter: SMALL_TERM_DIAMETER,
            big_term_diameter: BIG_TERM_DIAMETER,
            max_integer: MAX_INTEGER,
            locked: Some(false),
            combine_like_terms: false,
            return_to_toolbox_dy: RETURN_TO_TOOLBOX_DY,
            animation_speed: ANIMATION_SPEED,
            drag_bounds: Bounds::new(Vec2::ZERO, Vec2::new(1024.0, 768.0)),
            number_of_snapshots: NUMBER_OF_SNAPSHOTS,
        }
    }
}

impl SceneConfig {
    /// Config for scenes that combine like terms (no lock control)
    pub fn combining() -> Self {
        Self {
            combine_like_terms: true,
            locked: None,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scale = &self.scale;
        if scale.grid_rows == 0 || scale.grid_columns == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must have at least one cell, got {}x{}",
                scale.grid_rows, scale.grid_columns
            )));
        }
        if scale.max_weight <= 0 {
            return Err(ConfigError::Invalid(format!(
                "max_weight must be positive, got {}",
                scale.max_weight
            )));
        }
        if !(scale.max_angle > 0.0 && scale.max_angle < std::f32::consts::FRAC_PI_2) {
            return Err(ConfigError::Invalid(format!(
                "max_angle must be in (0, π/2), got {}",
                scale.max_angle
            )));
        }
        if scale.plate_diameter <= 0.0 || scale.beam_width <= 0.0 {
            return Err(ConfigError::Invalid(
                "plate_diameter and beam_width must be positive".to_string(),
            ));
        }
        if self.max_integer <= 0 {
            return Err(ConfigError::Invalid(format!(
                "max_integer must be positive, got {}",
                self.max_integer
            )));
        }
        if self.animation_speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "animation_speed must be positive, got {}",
                self.animation_speed
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        SceneConfig::default().validate().unwrap();
        SceneConfig::combining().validate().unwrap();
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SceneConfig::from_json(r#"{"scale": {"grid_rows": 1, "grid_columns": 1}, "locked": true}"#)
            .unwrap();
        assert_eq!(config.scale.grid_rows, 1);
        assert_eq!(config.scale.beam_width, BEAM_WIDTH);
        assert_eq!(config.locked, Some(true));
        assert_eq!(config.max_integer, MAX_INTEGER);
    }

    #[test]
    fn test_rejects_empty_grid() {
        let err = SceneConfig::from_json(r#"{"scale": {"grid_rows": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_json_roundtrip_keeps_lock_absence() {
        let config = SceneConfig::combining();
        let back = SceneConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.locked, None);
    }
}
