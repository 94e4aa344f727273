//! Equality Explorer - balance-scale model for equation balancing
//!
//! Core modules:
//! - `model`: Terms, term creators, grids, plates and the balance scale
//! - `drag`: Drag-and-combine protocol (combine-like-terms and separate-cells variants)
//! - `config`: Construction-time scene configuration
//! - `presets`: Ready-made scenes matching the simulation's screens
//! - `view`: Factory contract for the presentation layer

pub mod config;
pub mod drag;
pub mod error;
pub mod model;
pub mod presets;
pub mod view;

pub use config::{ConfigError, ScaleConfig, SceneConfig};
pub use error::{ModelError, ModelResult};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Model constants
pub mod consts {
    /// Largest magnitude allowed for any numerator or denominator on the scale
    pub const MAX_INTEGER: i64 = 1_000_000_000;

    /// Term motion speed (view units per second)
    pub const ANIMATION_SPEED: f32 = 400.0;

    /// Number of snapshot slots
    pub const NUMBER_OF_SNAPSHOTS: usize = 5;

    /// Term diameters: normal, and after like terms have been combined
    pub const SMALL_TERM_DIAMETER: f32 = 45.0;
    pub const BIG_TERM_DIAMETER: f32 = 55.0;

    /// Balance scale defaults
    pub const BEAM_WIDTH: f32 = 450.0;
    pub const MAX_ANGLE: f32 = 10.0 * std::f32::consts::PI / 180.0; // radians
    pub const MAX_WEIGHT: i64 = 30;
    pub const PLATE_DIAMETER: f32 = 300.0;
    pub const PLATE_SUPPORT_HEIGHT: f32 = 50.0;
    pub const PLATE_X_INSET: f32 = 45.0;
    pub const GRID_ROWS: usize = 6;
    pub const GRID_COLUMNS: usize = 6;
    pub const GRID_Y_OFFSET: f32 = 1.0;

    /// Releasing a term this far below its plate sends it back to the toolbox
    pub const RETURN_TO_TOOLBOX_DY: f32 = 60.0;
}

/// Axis-aligned rectangle in view coordinates (y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub const EVERYTHING: Self = Self {
        min: Vec2::splat(f32::NEG_INFINITY),
        max: Vec2::splat(f32::INFINITY),
    };

    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive on all edges
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Nearest point inside the bounds
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}

/// Rotate a vector by `angle` radians (positive angles turn +x toward +y)
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}
