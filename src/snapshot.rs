//! The initial snapshot: the first state a core produced, kept for auto-reset recycling.

use std::sync::Arc;

use crate::core::{Result, SimulationCore, SimulationState};
use crate::layout::StateLayout;

/// Immutable copy of the first simulation state, with the layout resolved from it.
///
/// Cloning is cheap; all clones share the same frozen state.
#[derive(Clone, Debug)]
pub struct InitialSnapshot {
    state: Arc<SimulationState>,
    layout: Arc<StateLayout>,
}

impl InitialSnapshot {
    /// Reset `core` once with the given per-lane seeds and freeze the result.
    ///
    /// The reward is mirrored into the metrics before the layout is captured, so the
    /// metric schema always includes `reward`.
    pub fn capture<C: SimulationCore + ?Sized>(core: &C, seeds: &[u64]) -> Result<Self> {
        let mut first = core.reset(seeds)?;
        first.inject_reward_metric();
        Self::from_state(first)
    }

    /// Freeze an already-produced state.
    pub fn from_state(state: SimulationState) -> Result<Self> {
        let layout = StateLayout::capture(&state)?;
        Ok(Self { state: Arc::new(state), layout: Arc::new(layout) })
    }

    pub fn state(&self) -> &SimulationState { &self.state }
    pub fn layout(&self) -> &StateLayout { &self.layout }
}
