use log::{info, LevelFilter};
use rebound::experiment::{export_experiment, export_trajectory, sweep_launch_speeds};
use rebound::sensitivity::{perturb_launch, DivergenceEstimator};
use rebound::simulation::DEMO_FRAME_RATE;
use rebound::{Launch, PhysicsSettings, Simulation};
use simple_logger::SimpleLogger;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let settings = match std::env::args().nth(1) {
        Some(path) => {
            info!("loading settings from {}", path);
            PhysicsSettings::from_json_file(path)?
        }
        None => PhysicsSettings::default(),
    };

    let dt = 1.0 / DEMO_FRAME_RATE;
    let frames = (10.0 * DEMO_FRAME_RATE) as usize;
    let launch = Launch::default();

    let mut nominal = Simulation::new(launch, 1.0, settings)?.with_recording(true);
    let duration = nominal.run(frames, dt);

    std::fs::create_dir_all("experiment_data")?;
    export_trajectory(&nominal, "experiment_data/trajectory.csv")?;
    export_experiment(
        &nominal,
        "demo",
        duration,
        "default launch from the top left corner",
        "experiment_data/experiments.csv",
    )?;

    let speeds: Vec<f64> = (1..=8).map(|i| 0.25 * i as f64).collect();
    for result in sweep_launch_speeds(settings, launch.position, &speeds, frames * 4, dt)? {
        info!(
            "launch speed {:.2}: {} bounces, final x {:.3}, horizontal rest at {}",
            result.launch_speed,
            result.bounces,
            result.final_position.x,
            result
                .horizontal_rest_time
                .map_or("never".to_string(), |t| format!("{:.2}s", t))
        );
    }

    let mut perturbed =
        Simulation::new(perturb_launch(&launch, 1e-6)?, 1.0, settings)?.with_recording(true);
    perturbed.run(frames, dt);
    let rate = DivergenceEstimator::new(&nominal, &perturbed)?.divergence_rate()?;
    info!("mean divergence rate of a 1e-6 launch perturbation: {:.4} 1/s", rate);

    Ok(())
}
