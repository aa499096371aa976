//! Two-link planar reacher driven by angle actuators.
//!
//! Each joint is servoed towards a commanded angle; the action in `[-1, 1]` is mapped
//! linearly onto the joint's angle limits. A target is placed uniformly at random in a
//! disc of radius 0.2 just above the ground plane, and the reward is the negative
//! distance from the arm tip to that target.

use std::f32::consts::PI;

use ndarray::{Array1, Array2, ArrayD, ArrayView2, Ix2, IxDyn};
use rand::distributions::{Distribution, Uniform};
use rand::RngCore;

use crate::config::EnvConfig;
use crate::core::{GymError, Internal, LaneField, Metrics, Result, SimulationCore, SimulationState};
use crate::envs::{check_action, check_seeds, episode_over, f32_field, u64_field};
use crate::utils::rng::rng_from_seed;

const UPPER_ARM: f32 = 0.1;
const FOREARM: f32 = 0.11;
const TARGET_RADIUS: f32 = 0.2;
const HEIGHT: f32 = 0.01;
const DT: f32 = 0.02;
/// Fraction of the remaining angle error closed per second by the servos.
const SERVO_RATE: f32 = 10.0;

pub const OBSERVATION_SIZE: usize = 11;

#[derive(Clone, Debug)]
pub struct ReacherAngle {
    batch_size: usize,
    episode_length: u32,
    action_repeat: u32,
    min_angle: [f32; 2],
    range_angle: [f32; 2],
}

impl ReacherAngle {
    pub fn new(config: &EnvConfig) -> Result<Self> {
        config.validate()?;
        let limits = [(-PI, PI), (-PI, PI)];
        Ok(Self {
            batch_size: config.batch_size,
            episode_length: config.episode_length,
            action_repeat: config.action_repeat,
            min_angle: limits.map(|(lo, _)| lo),
            range_angle: limits.map(|(lo, hi)| hi - lo),
        })
    }

    fn tip(angles: [f32; 2]) -> [f32; 3] {
        let [a0, a1] = angles;
        [
            UPPER_ARM * a0.cos() + FOREARM * (a0 + a1).cos(),
            UPPER_ARM * a0.sin() + FOREARM * (a0 + a1).sin(),
            HEIGHT,
        ]
    }

    /// Observation row: cos/sin of both joints, target xy, tip velocity xy, tip-to-target.
    fn observe_lane(angles: [f32; 2], target: [f32; 3], tip_velocity: [f32; 2]) -> [f32; OBSERVATION_SIZE] {
        let tip = Self::tip(angles);
        [
            angles[0].cos(),
            angles[1].cos(),
            angles[0].sin(),
            angles[1].sin(),
            target[0],
            target[1],
            tip_velocity[0],
            tip_velocity[1],
            tip[0] - target[0],
            tip[1] - target[1],
            tip[2] - target[2],
        ]
    }

    fn random_target(rng: &mut impl RngCore) -> [f32; 3] {
        let unit = Uniform::new(0.0f32, 1.0);
        // sqrt keeps the samples uniform over the disc's area
        let dist = TARGET_RADIUS * unit.sample(rng).sqrt();
        let ang = 2.0 * PI * unit.sample(rng);
        [dist * ang.cos(), dist * ang.sin(), HEIGHT]
    }

    fn lanes_2d(field: &ArrayD<f32>, name: &str) -> Result<Array2<f32>> {
        field.clone().into_dimensionality::<Ix2>().map_err(|e| GymError::Simulation(format!("{name}: {e}")))
    }
}

impl SimulationCore for ReacherAngle {
    fn batch_size(&self) -> usize { self.batch_size }
    fn action_size(&self) -> usize { 2 }

    fn reset(&self, seeds: &[u64]) -> Result<SimulationState> {
        check_seeds(seeds, self.batch_size)?;
        let b = self.batch_size;
        let mut observation = Array2::zeros((b, OBSERVATION_SIZE));
        let mut target = Array2::zeros((b, 3));
        let mut rng_state = Vec::with_capacity(b);
        for (i, &seed) in seeds.iter().enumerate() {
            let mut rng = rng_from_seed(seed);
            let t = Self::random_target(&mut rng);
            rng_state.push(rng.next_u64());
            target.row_mut(i).assign(&ndarray::arr1(&t));
            observation.row_mut(i).assign(&ndarray::arr1(&Self::observe_lane([0.0, 0.0], t, [0.0, 0.0])));
        }

        let mut metrics = Metrics::new();
        metrics.insert("rewardDist".into(), Array1::zeros(b));
        metrics.insert("rewardCtrl".into(), Array1::zeros(b));
        let mut internal = Internal::new();
        internal.insert("joint_angle".into(), LaneField::F32(Array2::<f32>::zeros((b, 2)).into_dyn()));
        internal.insert("target".into(), LaneField::F32(target.into_dyn()));
        internal.insert(
            "rng".into(),
            LaneField::U64(ArrayD::from_shape_vec(IxDyn(&[b]), rng_state).map_err(|e| GymError::Other(e.to_string()))?),
        );
        Ok(SimulationState {
            observation,
            reward: Array1::zeros(b),
            done: Array1::zeros(b),
            step_count: Array1::zeros(b),
            metrics,
            internal,
        })
    }

    fn transition(&self, state: &SimulationState, action: ArrayView2<f32>) -> Result<SimulationState> {
        check_action(action, self.batch_size, 2)?;
        let b = self.batch_size;
        let mut angles = Self::lanes_2d(f32_field(state, "joint_angle")?, "joint_angle")?;
        let target = Self::lanes_2d(f32_field(state, "target")?, "target")?;
        let rng = u64_field(state, "rng")?.clone();

        let substeps = self.action_repeat;
        let alpha = 1.0 - (-SERVO_RATE * DT).exp();
        let mut observation = Array2::zeros((b, OBSERVATION_SIZE));
        let mut reward = Array1::zeros(b);

        for i in 0..b {
            let commanded = [0, 1].map(|j| {
                let a = action[[i, j]].clamp(-1.0, 1.0);
                self.min_angle[j] + self.range_angle[j] * ((a + 1.0) / 2.0)
            });
            let before = Self::tip([angles[[i, 0]], angles[[i, 1]]]);
            for _ in 0..substeps {
                for j in 0..2 {
                    angles[[i, j]] += alpha * (commanded[j] - angles[[i, j]]);
                }
            }
            let lane_angles = [angles[[i, 0]], angles[[i, 1]]];
            let after = Self::tip(lane_angles);
            let elapsed = DT * substeps as f32;
            let velocity = [(after[0] - before[0]) / elapsed, (after[1] - before[1]) / elapsed];
            let lane_target = [target[[i, 0]], target[[i, 1]], target[[i, 2]]];
            let obs = Self::observe_lane(lane_angles, lane_target, velocity);
            // tip-to-target is the last three entries
            reward[i] = -obs[8..].iter().map(|v| v * v).sum::<f32>().sqrt();
            observation.row_mut(i).assign(&ndarray::arr1(&obs));
        }

        let step_count = state.step_count.mapv(|s| s + self.action_repeat);
        let done = step_count.mapv(|s| episode_over(s, self.episode_length));
        let mut metrics = Metrics::new();
        metrics.insert("rewardDist".into(), reward.clone());
        metrics.insert("rewardCtrl".into(), Array1::zeros(b));
        let mut internal = Internal::new();
        internal.insert("joint_angle".into(), LaneField::F32(angles.into_dyn()));
        internal.insert("target".into(), LaneField::F32(target.into_dyn()));
        internal.insert("rng".into(), LaneField::U64(rng));

        Ok(SimulationState { observation, reward, done, step_count, metrics, internal })
    }
}
