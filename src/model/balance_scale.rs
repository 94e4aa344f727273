//! Balance scale: two plates on a beam that tilts toward the heavier side

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::fraction::Fraction;
use super::plate::Plate;
use super::term::TermPool;
use crate::config::ScaleConfig;
use crate::rotate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "left",
            Side::Right => "right",
        })
    }
}

#[derive(Debug, Clone)]
pub struct BalanceScale {
    pub fulcrum: Vec2,
    pub beam_width: f32,
    pub max_angle: f32,
    /// Weight difference at which the tilt saturates
    pub max_weight: Fraction,
    pub plate_x_inset: f32,
    left: Plate,
    right: Plate,
    angle: f32,
}

impl BalanceScale {
    pub fn new(config: &ScaleConfig) -> Self {
        let plate = |side| {
            Plate::new(
                side,
                config.plate_diameter,
                config.plate_support_height,
                config.grid_rows,
                config.grid_columns,
                config.grid_y_offset,
            )
        };
        Self {
            fulcrum: config.fulcrum,
            beam_width: config.beam_width,
            max_angle: config.max_angle,
            max_weight: Fraction::from_integer(config.max_weight.max(1)),
            plate_x_inset: config.plate_x_inset,
            left: plate(Side::Left),
            right: plate(Side::Right),
            angle: 0.0,
        }
    }

    pub fn plate(&self, side: Side) -> &Plate {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn plate_mut(&mut self, side: Side) -> &mut Plate {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Current tilt in radians; positive when the right side is heavier
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Tilt for a pair of weights. Exactly zero when they are equal.
    pub fn angle_for(&self, left_weight: Fraction, right_weight: Fraction) -> f32 {
        let difference = right_weight - left_weight;
        if difference.is_zero() {
            return 0.0;
        }
        if difference.abs() >= self.max_weight {
            return self.max_angle * difference.signum() as f32;
        }
        let ratio = (difference.to_f64() / self.max_weight.to_f64()).clamp(-1.0, 1.0);
        (ratio * self.max_angle as f64) as f32
    }

    /// Recompute the angle from the plates' weights, moving the plates if it changed
    pub fn update(&mut self, left_weight: Fraction, right_weight: Fraction, terms: &mut TermPool) {
        let angle = self.angle_for(left_weight, right_weight);
        if angle != self.angle {
            log::debug!(
                "scale angle {:.4} -> {:.4} (left={}, right={})",
                self.angle,
                angle,
                left_weight,
                right_weight
            );
        }
        self.angle = angle;
        self.update_plate_positions(terms);
    }

    /// Plate positions are a pure function of the angle
    pub fn plate_position(&self, side: Side) -> Vec2 {
        let arm = self.beam_width / 2.0 - self.plate_x_inset;
        let support = Vec2::new(0.0, -self.left.support_height);
        let right_end = self.fulcrum + rotate(Vec2::new(arm, 0.0), self.angle);
        match side {
            Side::Right => right_end + support,
            // The beam pivots on the fulcrum, so the left end is the right end mirrored through it
            Side::Left => 2.0 * self.fulcrum - right_end + support,
        }
    }

    fn update_plate_positions(&mut self, terms: &mut TermPool) {
        let right = self.plate_position(Side::Right);
        let left = self.plate_position(Side::Left);
        self.right.set_position(right, terms);
        self.left.set_position(left, terms);
    }
}
