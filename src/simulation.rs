// src/simulation.rs

use crate::body::PhysicsBody;
use crate::controls::{help_text, Command, Flow, SceneState};
use crate::error::PhysicsError;
use crate::settings::PhysicsSettings;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use nalgebra::Vector3;
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use std::time::Instant;

pub const DEMO_ASPECT: f64 = 1200.0 / 600.0;
pub const DEMO_OBJECT_SIZE: f64 = 0.48;
pub const DEMO_FRAME_RATE: f64 = 120.0;

/// Top-left corner of a view that is two units tall, inset by half the object.
pub fn launch_position(aspect: f64, object_size: f64) -> Vector3<f64> {
    let half_height = 1.0;
    let half_width = half_height * aspect;
    let half_object = object_size / 2.0;
    Vector3::new(-half_width + half_object, half_height - half_object, 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
}

impl Default for Launch {
    fn default() -> Self {
        Launch {
            position: launch_position(DEMO_ASPECT, DEMO_OBJECT_SIZE),
            velocity: Vector3::new(0.5, 0.0, 0.0),
        }
    }
}

/// Wall-clock frame timer producing clamped time steps.
#[derive(Debug, Clone)]
pub struct FrameClock {
    previous: Instant,
    max_step: f64,
}

impl FrameClock {
    pub fn new(max_step: f64) -> Self {
        FrameClock {
            previous: Instant::now(),
            max_step,
        }
    }

    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.previous).as_secs_f64();
        self.previous = now;
        elapsed.min(self.max_step)
    }
}

/// Owns the bouncing body together with everything the frame loop used to
/// keep in globals: launch conditions, counters, recorded history and the
/// presentation toggles.
#[derive(Debug, Clone)]
pub struct Simulation {
    body: PhysicsBody,
    launch: Launch,
    pub scene: SceneState,
    pub frame: usize,
    pub time: f64,
    pub bounces: usize,
    recording: bool,
    pub times: Vec<f64>,
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
    pub total_energy: Vec<f64>,
    pub energy_thresholds: Vec<f64>,
    pub energy_lost_at: HashMap<OrderedFloat<f64>, Option<f64>>,
    initial_energy: f64,
}

impl Simulation {
    pub fn new(launch: Launch, mass: f64, settings: PhysicsSettings) -> Result<Self, PhysicsError> {
        let body = PhysicsBody::with_settings(
            launch.position,
            launch.velocity,
            Vector3::zeros(),
            mass,
            settings,
        )?;
        let energy_thresholds = vec![0.1, 0.25, 0.5, 0.75, 0.9];
        let energy_lost_at = energy_thresholds
            .iter()
            .map(|&t| (OrderedFloat(t), None))
            .collect();
        let mut simulation = Self {
            body,
            launch,
            scene: SceneState::default(),
            frame: 0,
            time: 0.0,
            bounces: 0,
            recording: false,
            times: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            total_energy: Vec::new(),
            energy_thresholds,
            energy_lost_at,
            initial_energy: body.total_energy(),
        };
        if simulation.initial_energy <= 0.0 {
            warn!(
                "launch energy {:.4} is not positive, energy-loss thresholds stay unset",
                simulation.initial_energy
            );
        }
        simulation.record_state();
        Ok(simulation)
    }

    /// Builder form of [`set_recording`](Self::set_recording).
    pub fn with_recording(mut self, recording: bool) -> Self {
        self.recording = recording;
        self
    }

    pub fn demo() -> Result<Self, PhysicsError> {
        Self::new(Launch::default(), 1.0, PhysicsSettings::default())
    }

    pub fn body(&self) -> &PhysicsBody {
        &self.body
    }

    pub fn position(&self) -> Vector3<f64> {
        self.body.position
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.body.velocity
    }

    pub fn launch(&self) -> &Launch {
        &self.launch
    }

    pub fn settings(&self) -> &PhysicsSettings {
        self.body.settings()
    }

    pub fn initial_energy(&self) -> f64 {
        self.initial_energy
    }

    /// Toggles per-frame history. Off by default so a long-lived interactive
    /// context only ever holds the launch snapshot; offline runs that export
    /// or compare trajectories switch it on. Counters keep running either way.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Advances the body by one frame. `dt` is clamped to
    /// `[0, max_time_step]`; anything that is not a number counts as zero.
    pub fn step(&mut self, dt: f64) {
        let max_step = self.settings().max_time_step;
        let dt = if dt.is_nan() || dt < 0.0 {
            warn!("frame {}: discarding invalid time step {}", self.frame, dt);
            0.0
        } else if dt > max_step {
            debug!("frame {}: clamping time step {:.4} to {:.4}", self.frame, dt, max_step);
            max_step
        } else {
            dt
        };

        if self.body.is_contacting_floor()
            && -self.body.velocity.y > self.settings().bounce_speed_threshold
        {
            self.bounces += 1;
        }
        self.body.update(dt);
        self.scene.advance_spin(dt);
        self.frame += 1;
        self.time += dt;
        self.track_energy_loss();
        if self.recording {
            self.record_state();
        }
    }

    /// Runs `frames` fixed steps offline, returning wall-clock seconds spent.
    pub fn run(&mut self, frames: usize, dt: f64) -> f64 {
        let start = Instant::now();
        let pb = ProgressBar::new(frames as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(format!("Simulating {} frames", frames));
        for frame in 0..frames {
            self.step(dt);
            if frame % 100 == 0 {
                pb.set_position(frame as u64);
            }
        }
        pb.finish_and_clear();
        let elapsed = start.elapsed().as_secs_f64();
        info!(
            "simulated {:.2}s in {} frames ({} bounces), final {}",
            self.time, self.frame, self.bounces, self.body
        );
        elapsed
    }

    pub fn reinitialize(&mut self) {
        self.body.reset(self.launch.position, self.launch.velocity);
        info!("reinitialized at {:?}", self.launch.position);
    }

    pub fn clear_history(&mut self) {
        self.frame = 0;
        self.time = 0.0;
        self.bounces = 0;
        self.times.clear();
        self.positions.clear();
        self.velocities.clear();
        self.total_energy.clear();
        self.initial_energy = self.body.total_energy();
        for val in self.energy_lost_at.values_mut() {
            *val = None;
        }
        self.record_state();
    }

    pub fn apply(&mut self, command: Command) -> Flow {
        match command {
            Command::Quit => return Flow::Quit,
            Command::Reinitialize => self.reinitialize(),
            Command::Help => info!("\n{}", help_text()),
            other => self.scene.apply(other),
        }
        Flow::Continue
    }

    fn record_state(&mut self) {
        self.times.push(self.time);
        self.positions.push(self.body.position);
        self.velocities.push(self.body.velocity);
        self.total_energy.push(self.body.total_energy());
    }

    /// Only meaningful against a positive launch energy; a launch at or below
    /// the floor leaves every threshold unset.
    fn track_energy_loss(&mut self) {
        if self.initial_energy <= 0.0 {
            return;
        }
        let lost = self.initial_energy - self.body.total_energy();
        for &t in &self.energy_thresholds {
            if let Some(val) = self.energy_lost_at.get_mut(&OrderedFloat(t)) {
                if val.is_none() && lost > t * self.initial_energy {
                    *val = Some(self.time);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{Shading, Tint};
    use approx::assert_relative_eq;

    #[test]
    fn demo_launch_is_top_left_of_the_view() {
        let p = launch_position(DEMO_ASPECT, DEMO_OBJECT_SIZE);
        assert_relative_eq!(p, Vector3::new(-1.76, 0.76, 0.0), epsilon = 1e-12);
        let launch = Launch::default();
        assert_eq!(launch.velocity, Vector3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn step_clamps_large_and_invalid_time_steps() {
        let mut sim = Simulation::demo().unwrap();
        sim.step(1.0);
        assert_relative_eq!(sim.time, 0.05, epsilon = 1e-12);
        sim.step(-0.5);
        sim.step(f64::NAN);
        assert_relative_eq!(sim.time, 0.05, epsilon = 1e-12);
        assert_eq!(sim.frame, 3);
        assert!(sim.position().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn clamped_step_matches_explicit_max_step() {
        let mut a = Simulation::demo().unwrap();
        let mut b = Simulation::demo().unwrap();
        a.step(0.5);
        b.step(0.05);
        assert_eq!(a.position(), b.position());
        assert_eq!(a.velocity(), b.velocity());
    }

    #[test]
    fn run_records_every_frame_and_counts_bounces() {
        let mut sim = Simulation::demo().unwrap().with_recording(true);
        sim.run(1200, 1.0 / DEMO_FRAME_RATE);
        assert_eq!(sim.frame, 1200);
        assert_eq!(sim.positions.len(), 1201);
        assert_eq!(sim.times.len(), sim.total_energy.len());
        assert!(sim.bounces >= 1);
        assert_eq!(sim.body().acceleration, Vector3::zeros());
    }

    #[test]
    fn energy_loss_thresholds_fill_in_order() {
        let mut sim = Simulation::demo().unwrap();
        sim.run(120 * 30, 1.0 / DEMO_FRAME_RATE);
        let first = sim.energy_lost_at[&OrderedFloat(0.1)].unwrap();
        let half = sim.energy_lost_at[&OrderedFloat(0.5)].unwrap();
        assert!(first <= half);
        assert!(sim.body().total_energy() < sim.initial_energy());
    }

    #[test]
    fn launch_below_the_floor_leaves_energy_thresholds_unset() {
        let launch = Launch {
            position: Vector3::new(0.0, -1.0, 0.0),
            velocity: Vector3::zeros(),
        };
        let mut sim = Simulation::new(launch, 1.0, PhysicsSettings::default()).unwrap();
        assert!(sim.initial_energy() < 0.0);
        sim.run(120 * 5, 1.0 / DEMO_FRAME_RATE);
        assert!(sim.energy_lost_at.values().all(|v| v.is_none()));
    }

    #[test]
    fn energy_thresholds_stay_unset_without_real_loss() {
        let settings = PhysicsSettings {
            restitution: 1.0,
            ..PhysicsSettings::default().without_drag()
        };
        let launch = Launch {
            position: Vector3::new(0.0, 0.0, 0.0),
            velocity: Vector3::zeros(),
        };
        let mut sim = Simulation::new(launch, 1.0, settings).unwrap();
        sim.run(60, 1.0 / DEMO_FRAME_RATE);
        assert!(sim.energy_lost_at.values().all(|v| v.is_none()));
    }

    #[test]
    fn bounce_count_stops_once_the_ball_settles() {
        let dt = 1.0 / DEMO_FRAME_RATE;
        let mut sim = Simulation::demo().unwrap();
        sim.run(120 * 40, dt);
        let settled = sim.bounces;
        assert!(settled >= 10);
        sim.run(120 * 40, dt);
        assert_eq!(sim.bounces, settled);
    }

    #[test]
    fn interactive_session_keeps_history_bounded() {
        let mut sim = Simulation::demo().unwrap();
        assert!(!sim.is_recording());
        for _ in 0..120 * 60 * 10 {
            sim.step(1.0 / DEMO_FRAME_RATE);
        }
        assert_eq!(sim.frame, 120 * 60 * 10);
        assert_eq!(sim.positions.len(), 1);
        assert_eq!(sim.times.len(), 1);
        assert_eq!(sim.velocities.len(), 1);
        assert_eq!(sim.total_energy.len(), 1);

        sim.set_recording(true);
        sim.step(1.0 / DEMO_FRAME_RATE);
        assert_eq!(sim.positions.len(), 2);
    }

    #[test]
    fn reinitialize_command_restores_launch() {
        let mut sim = Simulation::demo().unwrap();
        sim.run(500, 1.0 / DEMO_FRAME_RATE);
        assert_ne!(sim.position(), sim.launch().position);
        assert_eq!(sim.apply(Command::Reinitialize), Flow::Continue);
        assert_eq!(sim.position(), sim.launch().position);
        assert_eq!(sim.velocity(), sim.launch().velocity);
        assert_eq!(sim.frame, 500);
    }

    #[test]
    fn clear_history_restarts_bookkeeping() {
        let mut sim = Simulation::demo().unwrap();
        sim.run(600, 1.0 / DEMO_FRAME_RATE);
        sim.reinitialize();
        sim.clear_history();
        assert_eq!(sim.frame, 0);
        assert_eq!(sim.bounces, 0);
        assert_eq!(sim.positions, vec![sim.launch().position]);
        assert!(sim.energy_lost_at.values().all(|v| v.is_none()));
    }

    #[test]
    fn presentation_commands_do_not_touch_physics() {
        let mut sim = Simulation::demo().unwrap();
        let before = *sim.body();
        sim.apply(Command::ToggleColor);
        sim.apply(Command::ToggleShading);
        sim.apply(Command::Help);
        assert_eq!(*sim.body(), before);
        assert_eq!(sim.scene.tint, Tint::Brown);
        assert_eq!(sim.scene.shading, Shading::Phong);
        assert_eq!(sim.apply(Command::Quit), Flow::Quit);
    }

    #[test]
    fn independent_simulations_do_not_interact() {
        let mut a = Simulation::demo().unwrap();
        let b = Simulation::demo().unwrap();
        a.run(100, 0.01);
        assert_eq!(b.position(), b.launch().position);
    }

    #[test]
    fn frame_clock_never_exceeds_max_step() {
        let mut clock = FrameClock::new(0.05);
        std::thread::sleep(std::time::Duration::from_millis(60));
        assert_eq!(clock.tick(), 0.05);
        let dt = clock.tick();
        assert!((0.0..0.05).contains(&dt));
    }
}
