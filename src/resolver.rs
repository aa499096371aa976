//! Episode boundary resolution: splice the initial snapshot back into lanes that just
//! finished an episode.
//!
//! Every recycled lane returns to the same snapshot captured when the wrapper was built.
//! Repeated episodes of one lane therefore start from identical states; they are not
//! re-randomized.

use crate::core::{Internal, LaneField, SimulationState};
use crate::mask::select;

/// Decide, per lane, what is carried forward from `next`.
///
/// `done`, `reward` and `metrics` always come from `next`, so they describe the step that
/// just happened. Every other field comes from `first` where `next.done` is set and from
/// `next` elsewhere.
///
/// `next` and `first` must share a layout; the wrapper checks this before calling.
pub fn resolve(next: SimulationState, first: &SimulationState) -> SimulationState {
    let mask = next.done.view();
    let observation = select(mask, &first.observation, &next.observation);
    let step_count = select(mask, &first.step_count, &next.step_count);
    let internal: Internal = next
        .internal
        .iter()
        .map(|(name, field)| {
            let recycled = match (first.internal.get(name), field) {
                (Some(LaneField::F32(a)), LaneField::F32(b)) => LaneField::F32(select(mask, a, b)),
                (Some(LaneField::I64(a)), LaneField::I64(b)) => LaneField::I64(select(mask, a, b)),
                (Some(LaneField::U64(a)), LaneField::U64(b)) => LaneField::U64(select(mask, a, b)),
                (first_field, _) => panic!(
                    "internal field {name:?} does not match the initial snapshot ({:?} vs {})",
                    first_field.map(LaneField::kind),
                    field.kind()
                ),
            };
            (name.clone(), recycled)
        })
        .collect();

    SimulationState {
        observation,
        step_count,
        internal,
        reward: next.reward,
        done: next.done,
        metrics: next.metrics,
    }
}
