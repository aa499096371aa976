pub mod pendulum;
pub mod reacher_angle;

pub use pendulum::Pendulum;
pub use reacher_angle::ReacherAngle;

use ndarray::{ArrayD, ArrayView2};

use crate::core::{GymError, LaneField, Result, SimulationState};

/// Borrow an `f32` internal field by name.
pub(crate) fn f32_field<'a>(state: &'a SimulationState, name: &str) -> Result<&'a ArrayD<f32>> {
    match state.internal.get(name) {
        Some(LaneField::F32(a)) => Ok(a),
        Some(other) => Err(GymError::Simulation(format!("internal field {name:?} holds {}, expected f32", other.kind()))),
        None => Err(GymError::Simulation(format!("internal field {name:?} is missing"))),
    }
}

/// Borrow a `u64` internal field by name.
pub(crate) fn u64_field<'a>(state: &'a SimulationState, name: &str) -> Result<&'a ArrayD<u64>> {
    match state.internal.get(name) {
        Some(LaneField::U64(a)) => Ok(a),
        Some(other) => Err(GymError::Simulation(format!("internal field {name:?} holds {}, expected u64", other.kind()))),
        None => Err(GymError::Simulation(format!("internal field {name:?} is missing"))),
    }
}

pub(crate) fn check_seeds(seeds: &[u64], batch_size: usize) -> Result<()> {
    if seeds.len() != batch_size {
        return Err(GymError::LaneCount { field: "seeds".into(), expected: batch_size, actual: seeds.len() });
    }
    Ok(())
}

pub(crate) fn check_action(action: ArrayView2<f32>, batch_size: usize, action_size: usize) -> Result<()> {
    if action.shape() != &[batch_size, action_size][..] {
        return Err(GymError::Shape {
            field: "action".into(),
            expected: vec![batch_size, action_size],
            actual: action.shape().to_vec(),
        });
    }
    Ok(())
}

/// 1.0 where the lane has reached the episode length.
pub(crate) fn episode_over(step_count: u32, episode_length: u32) -> f32 {
    if step_count >= episode_length { 1.0 } else { 0.0 }
}
