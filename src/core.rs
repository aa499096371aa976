// Core traits and types shared by the wrapper, the resolver and the reference envs.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayD, ArrayView2};

/// Named per-lane metric values. Every array has one entry per lane.
pub type Metrics = BTreeMap<String, Array1<f32>>;

/// Opaque simulation-internal buffers, keyed by name.
pub type Internal = BTreeMap<String, LaneField>;

/// Key under which the reward is mirrored into the metrics map.
pub const REWARD_METRIC: &str = "reward";

/// A lane-leading buffer the wrapper carries without interpreting.
/// Axis 0 is always the lane axis.
#[derive(Clone, Debug, PartialEq)]
pub enum LaneField {
    F32(ArrayD<f32>),
    I64(ArrayD<i64>),
    U64(ArrayD<u64>),
}

impl LaneField {
    pub fn shape(&self) -> &[usize] {
        match self {
            LaneField::F32(a) => a.shape(),
            LaneField::I64(a) => a.shape(),
            LaneField::U64(a) => a.shape(),
        }
    }

    /// Short name of the element type, used in layout checks and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            LaneField::F32(_) => "f32",
            LaneField::I64(_) => "i64",
            LaneField::U64(_) => "u64",
        }
    }

    /// Number of lanes (length of axis 0); 0 for a scalar buffer.
    pub fn lanes(&self) -> usize { self.shape().first().copied().unwrap_or(0) }
}

impl From<ArrayD<f32>> for LaneField { fn from(v: ArrayD<f32>) -> Self { LaneField::F32(v) } }
impl From<ArrayD<i64>> for LaneField { fn from(v: ArrayD<i64>) -> Self { LaneField::I64(v) } }
impl From<ArrayD<u64>> for LaneField { fn from(v: ArrayD<u64>) -> Self { LaneField::U64(v) } }

/// Batched state produced by a simulation core: one row per lane.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    /// Observation, shape `[lanes, obs_size]`.
    pub observation: Array2<f32>,
    pub reward: Array1<f32>,
    /// 0/1 mask; 1 means the lane's episode ended on this step.
    pub done: Array1<f32>,
    pub step_count: Array1<u32>,
    pub metrics: Metrics,
    /// Seed material, physical configuration and anything else the core needs.
    pub internal: Internal,
}

impl SimulationState {
    /// Number of lanes, taken from the done mask.
    pub fn lanes(&self) -> usize { self.done.len() }

    /// Mirror the reward into the metrics map so it flows through the statistics
    /// pipeline like any other metric. Overwrites an existing `reward` entry.
    pub fn inject_reward_metric(&mut self) {
        self.metrics.insert(REWARD_METRIC.to_string(), self.reward.clone());
    }
}

/// Errors across the wrapper, the layout checks and the reference simulation cores.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GymError {
    #[error("lane count mismatch in {field}: expected {expected}, got {actual}")]
    LaneCount { field: String, expected: usize, actual: usize },
    #[error("shape mismatch in {field}: expected {expected:?}, got {actual:?}")]
    Shape { field: String, expected: Vec<usize>, actual: Vec<usize> },
    #[error("metric {0:?} was not present when the wrapper was initialized")]
    UnknownMetric(String),
    #[error("metric {0:?} is missing from the simulation output")]
    MissingMetric(String),
    #[error("done flag in lane {lane} must be 0 or 1, got {value}")]
    InvalidDone { lane: usize, value: f32 },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("unknown environment id: {0}")]
    UnknownEnv(String),
    #[error("simulation failed: {0}")]
    Simulation(String),
    #[error("Other error: {0}")]
    Other(String),
}

/// Convenience alias for results using GymError.
pub type Result<T> = std::result::Result<T, GymError>;

/// A batched simulation with a fixed lane count.
///
/// Both operations take `&self`: a transition is a function of the incoming state and
/// action only, so the same inputs always produce the same output.
pub trait SimulationCore {
    /// Number of lanes, fixed for the lifetime of the core.
    fn batch_size(&self) -> usize;

    /// Width of the per-lane action vector.
    fn action_size(&self) -> usize;

    /// Produce the initial state. `seeds` holds one seed per lane.
    fn reset(&self, seeds: &[u64]) -> Result<SimulationState>;

    /// Advance every lane by one step. `action` has shape `[lanes, action_size]`.
    fn transition(&self, state: &SimulationState, action: ArrayView2<f32>) -> Result<SimulationState>;
}

impl<C: SimulationCore + ?Sized> SimulationCore for Box<C> {
    fn batch_size(&self) -> usize { (**self).batch_size() }
    fn action_size(&self) -> usize { (**self).action_size() }
    fn reset(&self, seeds: &[u64]) -> Result<SimulationState> { (**self).reset(seeds) }
    fn transition(&self, state: &SimulationState, action: ArrayView2<f32>) -> Result<SimulationState> {
        (**self).transition(state, action)
    }
}
