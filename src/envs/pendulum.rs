use std::f32::consts::PI;

use ndarray::{Array1, Array2, ArrayD, ArrayView2, Axis, IxDyn};
use rand::distributions::{Distribution, Uniform};

use crate::config::EnvConfig;
use crate::core::{GymError, Internal, LaneField, Metrics, Result, SimulationCore, SimulationState};
use crate::envs::{check_action, check_seeds, episode_over, f32_field};
use crate::utils::rng::rng_from_seed;

/// Batched pendulum swing-up.
/// State per lane: angle (theta, radians), angular velocity (theta_dot)
/// Action: one value in [-1, 1], scaled to a torque in [-max_torque, max_torque]
/// Reward: -(theta_norm^2 + 0.1 * theta_dot^2 + 0.001 * torque^2), summed over substeps
/// Episode: no natural termination; done once step_count reaches episode_length
#[derive(Clone, Debug)]
pub struct Pendulum {
    batch_size: usize,
    episode_length: u32,
    action_repeat: u32,

    // constants
    g: f32,
    m: f32,
    l: f32,
    max_speed: f32,
    max_torque: f32,
    dt: f32,
}

impl Pendulum {
    pub fn new(config: &EnvConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            batch_size: config.batch_size,
            episode_length: config.episode_length,
            action_repeat: config.action_repeat,
            g: 10.0,
            m: 1.0,
            l: 1.0,
            max_speed: 8.0,
            max_torque: 2.0,
            dt: 0.05,
        })
    }

    fn observe(theta: &Array1<f32>, theta_dot: &Array1<f32>) -> Array2<f32> {
        Array2::from_shape_fn((theta.len(), 3), |(i, j)| match j {
            0 => theta[i].cos(),
            1 => theta[i].sin(),
            _ => theta_dot[i],
        })
    }

    #[inline]
    fn angle_normalize(x: f32) -> f32 {
        ((x + PI) % (2.0 * PI) + (2.0 * PI)) % (2.0 * PI) - PI
    }

    fn state(
        &self,
        theta: Array1<f32>,
        theta_dot: Array1<f32>,
        rng: ArrayD<u64>,
        step_count: Array1<u32>,
        costs: [Array1<f32>; 3],
    ) -> SimulationState {
        let [angle, velocity, ctrl] = costs;
        let reward = -(&angle + &velocity + &ctrl);
        let done = step_count.mapv(|s| episode_over(s, self.episode_length));
        let mut metrics = Metrics::new();
        metrics.insert("reward_angle".into(), -angle);
        metrics.insert("reward_velocity".into(), -velocity);
        metrics.insert("reward_ctrl".into(), -ctrl);

        let observation = Self::observe(&theta, &theta_dot);
        let mut internal = Internal::new();
        internal.insert("theta".into(), LaneField::F32(theta.into_dyn()));
        internal.insert("theta_dot".into(), LaneField::F32(theta_dot.into_dyn()));
        internal.insert("rng".into(), LaneField::U64(rng));
        SimulationState { observation, reward, done, step_count, metrics, internal }
    }
}

impl SimulationCore for Pendulum {
    fn batch_size(&self) -> usize { self.batch_size }
    fn action_size(&self) -> usize { 1 }

    fn reset(&self, seeds: &[u64]) -> Result<SimulationState> {
        check_seeds(seeds, self.batch_size)?;
        // theta ~ U[-pi, pi], theta_dot ~ U[-1, 1]
        let u_theta = Uniform::new_inclusive(-PI, PI);
        let u_vel = Uniform::new_inclusive(-1.0f32, 1.0f32);
        let mut theta = Array1::zeros(self.batch_size);
        let mut theta_dot = Array1::zeros(self.batch_size);
        for (i, &seed) in seeds.iter().enumerate() {
            let mut rng = rng_from_seed(seed);
            theta[i] = u_theta.sample(&mut rng);
            theta_dot[i] = u_vel.sample(&mut rng);
        }
        let rng = ArrayD::from_shape_vec(IxDyn(&[seeds.len()]), seeds.to_vec())
            .map_err(|e| GymError::Other(e.to_string()))?;
        let zeros = || Array1::zeros(self.batch_size);
        Ok(self.state(theta, theta_dot, rng, Array1::zeros(self.batch_size), [zeros(), zeros(), zeros()]))
    }

    fn transition(&self, state: &SimulationState, action: ArrayView2<f32>) -> Result<SimulationState> {
        check_action(action, self.batch_size, 1)?;
        let mut theta = f32_field(state, "theta")?.clone().into_dimensionality::<ndarray::Ix1>()
            .map_err(|e| GymError::Simulation(e.to_string()))?;
        let mut theta_dot = f32_field(state, "theta_dot")?.clone().into_dimensionality::<ndarray::Ix1>()
            .map_err(|e| GymError::Simulation(e.to_string()))?;
        let rng = crate::envs::u64_field(state, "rng")?.clone();

        let (g, m, l, dt) = (self.g, self.m, self.l, self.dt);
        let mut cost_angle = Array1::zeros(self.batch_size);
        let mut cost_velocity = Array1::zeros(self.batch_size);
        let mut cost_ctrl = Array1::zeros(self.batch_size);
        let torques = action.index_axis(Axis(1), 0).mapv(|a| a.clamp(-1.0, 1.0) * self.max_torque);

        for i in 0..self.batch_size {
            let torque = torques[i];
            for _ in 0..self.action_repeat {
                // theta_ddot = (3g/(2l)) * sin(theta) + (3/(m l^2)) * u
                let theta_ddot = (3.0 * g / (2.0 * l)) * theta[i].sin() + (3.0 / (m * l * l)) * torque;
                theta_dot[i] = (theta_dot[i] + theta_ddot * dt).clamp(-self.max_speed, self.max_speed);
                theta[i] = Self::angle_normalize(theta[i] + theta_dot[i] * dt);

                cost_angle[i] += theta[i] * theta[i];
                cost_velocity[i] += 0.1 * theta_dot[i] * theta_dot[i];
                cost_ctrl[i] += 0.001 * torque * torque;
            }
        }

        let step_count = state.step_count.mapv(|s| s + self.action_repeat);
        Ok(self.state(theta, theta_dot, rng, step_count, [cost_angle, cost_velocity, cost_ctrl]))
    }
}
