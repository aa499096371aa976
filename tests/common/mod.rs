// Scripted simulation core shared by the integration tests.
#![allow(dead_code)]

use std::cell::Cell;

use lockstep_gym::{GymError, Internal, LaneField, Metrics, Result, SimulationCore, SimulationState};
use ndarray::{Array1, Array2, ArrayD, ArrayView2, Axis, IxDyn};

/// Replays a fixed script of per-lane done flags and rewards, one row per call.
///
/// Observations advance by 1 per step and step counts by 1, so fresh and recycled lanes
/// are easy to tell apart. Initial observations and the `u64` "lane_id" internal field come
/// from `lane_ids` rather than the wrapper's seeds, so a test can permute lanes. The action
/// is folded into an `f32` internal field. With `bonus` set, a second metric `bonus`
/// (twice the reward) is reported.
pub struct ScriptedCore {
    pub lane_ids: Vec<u64>,
    pub done: Vec<Vec<f32>>,
    pub reward: Vec<Vec<f32>>,
    pub bonus: bool,
    pub calls: Cell<usize>,
}

impl ScriptedCore {
    pub fn new(done: Vec<Vec<f32>>, reward: Vec<Vec<f32>>) -> Self {
        let lanes = done.first().map(Vec::len).unwrap_or(0);
        Self { lane_ids: (0..lanes as u64).collect(), done, reward, bonus: true, calls: Cell::new(0) }
    }

    pub fn reward_only(done: Vec<Vec<f32>>, reward: Vec<Vec<f32>>) -> Self {
        Self { bonus: false, ..Self::new(done, reward) }
    }

    pub fn with_lane_ids(mut self, lane_ids: Vec<u64>) -> Self {
        self.lane_ids = lane_ids;
        self
    }
}

impl SimulationCore for ScriptedCore {
    fn batch_size(&self) -> usize { self.lane_ids.len() }
    fn action_size(&self) -> usize { 2 }

    fn reset(&self, seeds: &[u64]) -> Result<SimulationState> {
        let b = self.lane_ids.len();
        if seeds.len() != b {
            return Err(GymError::LaneCount { field: "seeds".into(), expected: b, actual: seeds.len() });
        }
        let ids = &self.lane_ids;
        let mut internal = Internal::new();
        internal.insert("lane_id".into(), LaneField::U64(ArrayD::from_shape_vec(IxDyn(&[b]), ids.clone()).unwrap()));
        internal.insert("phase".into(), LaneField::F32(ArrayD::zeros(IxDyn(&[b, 2]))));
        let mut metrics = Metrics::new();
        if self.bonus {
            metrics.insert("bonus".into(), Array1::zeros(b));
        }
        Ok(SimulationState {
            observation: Array2::from_shape_fn((b, 3), |(i, j)| -((ids[i] * 3 + j as u64) as f32)),
            reward: Array1::zeros(b),
            done: Array1::zeros(b),
            step_count: Array1::zeros(b),
            metrics,
            internal,
        })
    }

    fn transition(&self, state: &SimulationState, action: ArrayView2<f32>) -> Result<SimulationState> {
        let t = self.calls.get();
        self.calls.set(t + 1);
        let done = self.done.get(t).ok_or_else(|| GymError::Simulation(format!("script exhausted at {t}")))?;
        let reward = Array1::from(self.reward[t].clone());
        let mut internal = state.internal.clone();
        if let Some(LaneField::F32(phase)) = internal.get_mut("phase") {
            *phase = &*phase + &action.to_owned().into_dyn();
        }
        let mut metrics = Metrics::new();
        if self.bonus {
            metrics.insert("bonus".into(), reward.mapv(|r| 2.0 * r));
        }
        Ok(SimulationState {
            observation: &state.observation + 1.0,
            reward,
            done: Array1::from(done.clone()),
            step_count: state.step_count.mapv(|s| s + 1),
            metrics,
            internal,
        })
    }
}

/// Lane `lane` of a 2-D array as a vector.
pub fn row(a: &Array2<f32>, lane: usize) -> Vec<f32> {
    a.index_axis(Axis(0), lane).to_vec()
}
