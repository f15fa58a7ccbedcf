// src/settings.rs

use crate::error::PhysicsError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_GRAVITY: f64 = 2.5;
pub const DEFAULT_RESTITUTION: f64 = 0.9;
pub const DEFAULT_DRAG_THRESHOLD: f64 = 0.03;
pub const DEFAULT_FLOOR_Y: f64 = -0.76;
pub const DEFAULT_MAX_TIME_STEP: f64 = 1.0 / 20.0;
pub const DEFAULT_BOUNCE_SPEED_THRESHOLD: f64 = 0.1;

/// Tuning constants for a [`PhysicsBody`](crate::body::PhysicsBody).
///
/// The defaults reproduce the bouncing-sphere demo: a slow, non-physical
/// gravity chosen for visual pacing, a mostly elastic floor and heavy
/// horizontal drag so the ball comes to rest along x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Magnitude of the downward gravitational acceleration.
    pub gravity: f64,
    /// Fraction of normal speed kept after hitting the floor, in `[0, 1]`.
    pub restitution: f64,
    /// Per-axis quadratic drag coefficients.
    pub drag_coefficients: Vector3<f64>,
    /// Below this |v.x| the horizontal velocity snaps to zero.
    pub drag_threshold: f64,
    /// Height of the horizontal floor plane.
    pub floor_y: f64,
    /// Upper bound for a single frame's time step.
    pub max_time_step: f64,
    /// Floor contacts slower than this are resting contact, not bounces.
    pub bounce_speed_threshold: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        PhysicsSettings {
            gravity: DEFAULT_GRAVITY,
            restitution: DEFAULT_RESTITUTION,
            drag_coefficients: Vector3::new(1.0, 0.1, 0.1),
            drag_threshold: DEFAULT_DRAG_THRESHOLD,
            floor_y: DEFAULT_FLOOR_Y,
            max_time_step: DEFAULT_MAX_TIME_STEP,
            bounce_speed_threshold: DEFAULT_BOUNCE_SPEED_THRESHOLD,
        }
    }
}

impl PhysicsSettings {
    /// Same settings with drag switched off on every axis.
    pub fn without_drag(self) -> Self {
        PhysicsSettings {
            drag_coefficients: Vector3::zeros(),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), PhysicsError> {
        let scalars = [
            ("gravity", self.gravity),
            ("restitution", self.restitution),
            ("drag_threshold", self.drag_threshold),
            ("floor_y", self.floor_y),
            ("max_time_step", self.max_time_step),
            ("bounce_speed_threshold", self.bounce_speed_threshold),
        ];
        if let Some((name, value)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PhysicsError::invalid(format!(
                "{} must be finite, got {}",
                name, value
            )));
        }
        if self.gravity < 0.0 {
            return Err(PhysicsError::invalid(format!(
                "gravity must be non-negative, got {}",
                self.gravity
            )));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(PhysicsError::invalid(format!(
                "restitution must lie in [0, 1], got {}",
                self.restitution
            )));
        }
        if self
            .drag_coefficients
            .iter()
            .any(|c| !c.is_finite() || *c < 0.0)
        {
            return Err(PhysicsError::invalid(format!(
                "drag coefficients must be finite and non-negative, got {:?}",
                self.drag_coefficients
            )));
        }
        if self.drag_threshold < 0.0 {
            return Err(PhysicsError::invalid(format!(
                "drag_threshold must be non-negative, got {}",
                self.drag_threshold
            )));
        }
        if self.bounce_speed_threshold < 0.0 {
            return Err(PhysicsError::invalid(format!(
                "bounce_speed_threshold must be non-negative, got {}",
                self.bounce_speed_threshold
            )));
        }
        if self.max_time_step <= 0.0 {
            return Err(PhysicsError::invalid(format!(
                "max_time_step must be positive, got {}",
                self.max_time_step
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, PhysicsError> {
        let settings: PhysicsSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PhysicsError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
