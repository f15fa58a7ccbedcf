use crate::error::PhysicsError;
use crate::settings::PhysicsSettings;
use crate::simulation::{Launch, Simulation};
use chrono::Utc;
use itertools::izip;
use log::info;
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::Serialize;
use std::error::Error;
use std::path::Path;

#[derive(Serialize)]
struct ExperimentRecord {
    date: String,
    label: String,
    mass: f64,
    gravity: f64,
    restitution: f64,
    drag_coefficients: String,
    floor_y: f64,
    initial_position: String,
    initial_velocity: String,
    frames: usize,
    simulated_time: f64,
    bounces: usize,
    final_position: String,
    initial_energy: f64,
    final_energy: f64,
    energy_thresholds: String,
    execution_duration: f64,
    notes: String,
}

#[derive(Serialize)]
struct TrajectoryRow {
    frame: usize,
    time: f64,
    x: f64,
    y: f64,
    z: f64,
    vx: f64,
    vy: f64,
    vz: f64,
    energy: f64,
}

fn fmt_vec(v: &Vector3<f64>) -> String {
    format!("[{}, {}, {}]", v.x, v.y, v.z)
}

/// Appends one summary row for a finished run; the header is only written
/// when the file is new.
pub fn export_experiment(
    sim: &Simulation,
    label: &str,
    execution_duration: f64,
    notes: &str,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    let settings = sim.settings();
    let mut energy_thresholds_vec: Vec<(f64, Option<f64>)> = sim
        .energy_lost_at
        .iter()
        .map(|(k, v)| (k.into_inner(), *v))
        .collect();
    energy_thresholds_vec
        .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let energy_thresholds_json = serde_json::to_string(&energy_thresholds_vec)?;

    let record = ExperimentRecord {
        date: Utc::now().to_rfc3339(),
        label: label.to_string(),
        mass: sim.body().mass(),
        gravity: settings.gravity,
        restitution: settings.restitution,
        drag_coefficients: fmt_vec(&settings.drag_coefficients),
        floor_y: settings.floor_y,
        initial_position: fmt_vec(&sim.launch().position),
        initial_velocity: fmt_vec(&sim.launch().velocity),
        frames: sim.frame,
        simulated_time: sim.time,
        bounces: sim.bounces,
        final_position: fmt_vec(&sim.position()),
        initial_energy: sim.initial_energy(),
        final_energy: sim.body().total_energy(),
        energy_thresholds: energy_thresholds_json,
        execution_duration,
        notes: notes.to_string(),
    };

    let file_exists = path.exists();
    let file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    wtr.serialize(record)?;
    wtr.flush()?;
    info!("appended experiment '{}' to {}", label, path.display());
    Ok(())
}

pub fn export_trajectory(sim: &Simulation, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)?;
    for (frame, (time, p, v, energy)) in izip!(
        &sim.times,
        &sim.positions,
        &sim.velocities,
        &sim.total_energy
    )
    .enumerate()
    {
        wtr.serialize(TrajectoryRow {
            frame,
            time: *time,
            x: p.x,
            y: p.y,
            z: p.z,
            vx: v.x,
            vy: v.y,
            vz: v.z,
            energy: *energy,
        })?;
    }
    wtr.flush()?;
    info!(
        "wrote {} trajectory rows to {}",
        sim.positions.len(),
        path.display()
    );
    Ok(())
}

/// Per-frame distance between two recorded runs of equal length.
pub fn trajectory_deviance(a: &Simulation, b: &Simulation) -> Result<Vec<f64>, PhysicsError> {
    if a.positions.len() != b.positions.len() {
        return Err(PhysicsError::invalid(format!(
            "trajectories differ in length: {} vs {}",
            a.positions.len(),
            b.positions.len()
        )));
    }
    Ok(izip!(&a.positions, &b.positions)
        .map(|(p, q)| (p - q).norm())
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub launch_speed: f64,
    pub final_position: Vector3<f64>,
    pub bounces: usize,
    /// Simulated time at which horizontal motion stopped, if it did.
    pub horizontal_rest_time: Option<f64>,
}

/// Runs one independent simulation per launch speed, in parallel.
pub fn sweep_launch_speeds(
    settings: PhysicsSettings,
    launch_position: Vector3<f64>,
    speeds: &[f64],
    frames: usize,
    dt: f64,
) -> Result<Vec<SweepResult>, PhysicsError> {
    speeds
        .par_iter()
        .map(|&speed| -> Result<SweepResult, PhysicsError> {
            let launch = Launch {
                position: launch_position,
                velocity: Vector3::new(speed, 0.0, 0.0),
            };
            let mut sim = Simulation::new(launch, 1.0, settings)?;
            let mut horizontal_rest_time = None;
            for _ in 0..frames {
                sim.step(dt);
                if horizontal_rest_time.is_none() && sim.velocity().x == 0.0 {
                    horizontal_rest_time = Some(sim.time);
                }
            }
            Ok(SweepResult {
                launch_speed: speed,
                final_position: sim.position(),
                bounces: sim.bounces,
                horizontal_rest_time,
            })
        })
        .collect()
}
