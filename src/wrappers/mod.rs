// Episode wrapper: composes the initial snapshot, boundary resolution and statistics into
// one pure step function over a batched simulation core.

use ndarray::{Array2, ArrayView2};

use crate::core::{GymError, Result, SimulationCore, SimulationState};
use crate::resolver::resolve;
use crate::snapshot::InitialSnapshot;
use crate::stats::EpisodeStatistics;
use crate::utils::rng::lane_seeds;

/// Everything carried from one step to the next.
#[derive(Clone, Debug, PartialEq)]
pub struct WrapperState {
    pub simulation: SimulationState,
    pub statistics: EpisodeStatistics,
}

/// Wraps a simulation core with auto-reset recycling and episode statistics.
///
/// The wrapper itself holds no mutable state: `step` maps a `WrapperState` and an action
/// to a new `WrapperState`, leaving its input untouched.
pub struct EpisodeWrapper<C: SimulationCore> {
    core: C,
    snapshot: InitialSnapshot,
}

/// Build a wrapper around `core` and return its first state alongside it.
pub fn wrap<C: SimulationCore>(core: C, batch_size: usize, seed: u64) -> Result<(WrapperState, EpisodeWrapper<C>)> {
    let (wrapper, state) = EpisodeWrapper::initialize(core, batch_size, seed)?;
    Ok((state, wrapper))
}

impl<C: SimulationCore> EpisodeWrapper<C> {
    /// Reset `core` once with `batch_size` lane seeds derived from `seed`, freeze that
    /// state as the initial snapshot and start with zeroed statistics.
    pub fn initialize(core: C, batch_size: usize, seed: u64) -> Result<(Self, WrapperState)> {
        if batch_size == 0 {
            return Err(GymError::Config("batch_size must be > 0".into()));
        }
        let seeds = lane_seeds(seed, batch_size);
        let snapshot = InitialSnapshot::capture(&core, &seeds)?;
        if snapshot.layout().batch_size() != batch_size {
            return Err(GymError::LaneCount {
                field: "reset".into(),
                expected: batch_size,
                actual: snapshot.layout().batch_size(),
            });
        }
        log::debug!(
            "episode wrapper initialized: {} lanes, observation size {}, metrics {:?}",
            batch_size,
            snapshot.layout().observation_size(),
            snapshot.layout().metric_names()
        );

        let state = WrapperState {
            simulation: snapshot.state().clone(),
            statistics: EpisodeStatistics::zeroed(snapshot.layout()),
        };
        Ok((Self { core, snapshot }, state))
    }

    pub fn batch_size(&self) -> usize { self.snapshot.layout().batch_size() }
    pub fn action_size(&self) -> usize { self.core.action_size() }
    pub fn snapshot(&self) -> &InitialSnapshot { &self.snapshot }
    pub fn core(&self) -> &C { &self.core }

    /// Advance every lane by one step.
    ///
    /// The action is clipped to `[-1, 1]` before it reaches the core. Errors from the core
    /// are returned unchanged. Statistics that do not match this wrapper's metric set or
    /// lane count, and a malformed core output, are rejected before anything is accumulated.
    pub fn step(&self, state: &WrapperState, action: ArrayView2<f32>) -> Result<WrapperState> {
        state.statistics.check(self.snapshot.layout())?;
        let expected = [self.batch_size(), self.action_size()];
        if action.shape() != &expected[..] {
            return Err(GymError::Shape {
                field: "action".into(),
                expected: expected.to_vec(),
                actual: action.shape().to_vec(),
            });
        }
        let clipped = clip_action(action);

        let mut next = self.core.transition(&state.simulation, clipped.view())?;
        next.inject_reward_metric();
        self.snapshot.layout().check(&next)?;

        // Read step counts before resolution overwrites finished lanes.
        let step_delta = EpisodeStatistics::completed_step_delta(&next);
        let carried = resolve(next, self.snapshot.state());
        let statistics = state.statistics.accumulate(step_delta, &carried);
        log::trace!(
            "step: {} lanes finished, {} episodes completed so far",
            crate::mask::count(carried.done.view()),
            statistics.completed_episode_count
        );

        Ok(WrapperState { simulation: carried, statistics })
    }

    /// Apply `step` once per action, in order. Equivalent to calling `step` repeatedly.
    pub fn rollout<'a, I>(&self, state: &WrapperState, actions: I) -> Result<WrapperState>
    where
        I: IntoIterator<Item = ArrayView2<'a, f32>>,
    {
        let mut current = state.clone();
        for action in actions {
            current = self.step(&current, action)?;
        }
        Ok(current)
    }
}

/// Clamp every action component into `[-1, 1]`.
pub fn clip_action(action: ArrayView2<f32>) -> Array2<f32> {
    action.mapv(|a| a.clamp(-1.0, 1.0))
}
