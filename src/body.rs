// src/body.rs

use crate::error::PhysicsError;
use crate::settings::PhysicsSettings;
use log::{debug, warn};
use nalgebra::Vector3;
use std::fmt;

/// A point mass falling under gravity onto a horizontal floor.
///
/// `acceleration` only accumulates forces between the start of a step and the
/// integration at its end; it is zero again whenever [`update`](Self::update)
/// returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBody {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
    mass: f64,
    settings: PhysicsSettings,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        PhysicsBody {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
            mass: 1.0,
            settings: PhysicsSettings::default(),
        }
    }
}

impl PhysicsBody {
    pub fn new(
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        acceleration: Vector3<f64>,
        mass: f64,
    ) -> Result<Self, PhysicsError> {
        Self::with_settings(
            position,
            velocity,
            acceleration,
            mass,
            PhysicsSettings::default(),
        )
    }

    pub fn with_settings(
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        acceleration: Vector3<f64>,
        mass: f64,
        settings: PhysicsSettings,
    ) -> Result<Self, PhysicsError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(PhysicsError::invalid(format!(
                "mass must be positive and finite, got {}",
                mass
            )));
        }
        settings.validate()?;
        Ok(PhysicsBody {
            position,
            velocity,
            acceleration,
            mass,
            settings,
        })
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    /// Accumulates `force / mass` into this step's acceleration.
    pub fn apply_force(&mut self, force: Vector3<f64>) {
        self.acceleration += force / self.mass;
    }

    /// Quadratic drag, `-c * |v| * v` per axis.
    ///
    /// The x axis is special-cased: at or below the drag threshold its
    /// velocity snaps to zero instead of receiving a force, so horizontal
    /// motion actually stops rather than creeping forever.
    pub fn apply_resistance(&mut self, coefficients: Vector3<f64>) {
        if self.velocity.x.abs() > self.settings.drag_threshold {
            let drag_x = -coefficients.x * self.velocity.x.abs() * self.velocity.x;
            self.apply_force(Vector3::new(drag_x, 0.0, 0.0));
        } else {
            self.velocity.x = 0.0;
        }

        let drag_yz = Vector3::new(
            0.0,
            -coefficients.y * self.velocity.y.abs() * self.velocity.y,
            -coefficients.z * self.velocity.z.abs() * self.velocity.z,
        );
        self.apply_force(drag_yz);
    }

    /// Reflects velocity about the plane with the given normal, losing
    /// `1 - restitution` of the normal speed, then lifts the body back onto
    /// the floor if it had sunk below it.
    pub fn bounce(&mut self, surface_normal: Vector3<f64>) {
        let Some(n) = surface_normal.try_normalize(f64::EPSILON) else {
            warn!("ignoring bounce against degenerate normal {:?}", surface_normal);
            return;
        };
        let restitution = self.settings.restitution;
        self.velocity -= (1.0 + restitution) * self.velocity.dot(&n) * n;
        if self.position.y <= self.settings.floor_y {
            self.position.y = self.settings.floor_y;
        }
        debug!(
            "bounce at x={:.3}, outgoing velocity {:?}",
            self.position.x, self.velocity
        );
    }

    /// True when the body is at or below the floor and still heading into it.
    pub fn is_contacting_floor(&self) -> bool {
        self.position.y <= self.settings.floor_y && self.velocity.y < 0.0
    }

    /// Advances one frame: floor collision, gravity, drag, then integration.
    pub fn update(&mut self, delta_time: f64) {
        if self.is_contacting_floor() {
            self.bounce(Vector3::y());
        }

        let gravity = Vector3::new(0.0, -self.settings.gravity, 0.0);
        self.apply_force(gravity * self.mass);
        self.apply_resistance(self.settings.drag_coefficients);

        self.integrate(delta_time);
    }

    fn integrate(&mut self, dt: f64) {
        self.position += self.velocity * dt + self.acceleration * (0.5 * dt * dt);
        self.velocity += self.acceleration * dt;
        self.acceleration = Vector3::zeros();
    }

    pub fn reset(&mut self, position: Vector3<f64>, velocity: Vector3<f64>) {
        self.position = position;
        self.velocity = velocity;
        self.acceleration = Vector3::zeros();
        debug!("body reset to p={:?}, v={:?}", position, velocity);
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    /// Gravitational potential energy measured from the floor plane.
    pub fn potential_energy(&self) -> f64 {
        self.mass * self.settings.gravity * (self.position.y - self.settings.floor_y)
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy()
    }
}

impl fmt::Display for PhysicsBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PhysicsBody(m={:.3}, p=[{:.4}, {:.4}, {:.4}], v=[{:.4}, {:.4}, {:.4}])",
            self.mass,
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z
        )
    }
}
