use crate::error::PhysicsError;
use crate::simulation::{Launch, Simulation};
use nalgebra::Vector3;
use rand::Rng;
use rand_distr::Uniform;

/// Jitters every launch component by a uniform offset in `[-threshold, threshold]`.
pub fn perturb_launch(launch: &Launch, threshold: f64) -> Result<Launch, PhysicsError> {
    let range = Uniform::new_inclusive(-threshold, threshold)
        .map_err(|e| PhysicsError::invalid(format!("bad perturbation {}: {}", threshold, e)))?;
    let mut rng = rand::rng();
    let pos_perturbation =
        Vector3::new(rng.sample(&range), rng.sample(&range), rng.sample(&range));
    let vel_perturbation =
        Vector3::new(rng.sample(&range), rng.sample(&range), rng.sample(&range));
    Ok(Launch {
        position: launch.position + pos_perturbation,
        velocity: launch.velocity + vel_perturbation,
    })
}

/// Compares two recorded runs that started from nearby launch conditions.
pub struct DivergenceEstimator<'a> {
    nominal: &'a Simulation,
    perturbed: &'a Simulation,
}

impl<'a> DivergenceEstimator<'a> {
    pub fn new(nominal: &'a Simulation, perturbed: &'a Simulation) -> Result<Self, PhysicsError> {
        if nominal.positions.len() != perturbed.positions.len() {
            return Err(PhysicsError::invalid(format!(
                "runs recorded {} and {} frames",
                nominal.positions.len(),
                perturbed.positions.len()
            )));
        }
        if nominal.positions.len() < 2 {
            return Err(PhysicsError::invalid("need at least two recorded frames"));
        }
        Ok(DivergenceEstimator { nominal, perturbed })
    }

    pub fn separations(&self) -> Vec<f64> {
        self.nominal
            .positions
            .iter()
            .zip(&self.perturbed.positions)
            .map(|(p, q)| (p - q).norm())
            .collect()
    }

    /// Mean exponential growth rate of the separation, `ln(d_k / d_0) / t_k`.
    ///
    /// A negative rate means the launch error is absorbed as the ball settles
    /// (drag and restitution pull both runs to the same resting x). A positive
    /// rate means small launch errors shift bounce timing enough that the runs
    /// are still apart, so trajectories from that launch should not be trusted
    /// beyond the separation implied by the launch tolerance.
    pub fn divergence_rate(&self) -> Result<f64, PhysicsError> {
        let separations = self.separations();
        let initial_sep = separations[0];
        if initial_sep <= 0.0 {
            return Err(PhysicsError::invalid(
                "initial separation must be greater than zero",
            ));
        }

        let rates: Vec<f64> = separations
            .iter()
            .zip(&self.nominal.times)
            .skip(1)
            .filter(|(sep, t)| **sep > 0.0 && **t > 0.0)
            .map(|(sep, t)| (sep / initial_sep).ln() / t)
            .collect();
        if rates.is_empty() {
            return Ok(f64::NEG_INFINITY);
        }
        Ok(rates.iter().sum::<f64>() / rates.len() as f64)
    }
}
