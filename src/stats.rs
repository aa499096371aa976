//! Running and cumulative episode statistics, updated with masked arithmetic only.

use std::collections::BTreeMap;

use ndarray::Array1;

use crate::core::{GymError, Metrics, Result, SimulationState};
use crate::layout::StateLayout;
use crate::mask;

/// Per-lane running sums plus global totals over completed episodes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeStatistics {
    /// Sum of each metric since the lane's last boundary, current step included.
    pub running_episode_metrics: Metrics,
    /// Per metric, the running totals of every lane-episode that has completed.
    pub completed_episode_metric_totals: BTreeMap<String, f64>,
    pub completed_episode_count: u64,
    /// Sum of `step_count` at the moment each lane-episode completed.
    pub completed_episode_step_total: u64,
}

impl EpisodeStatistics {
    /// All-zero statistics for the metric schema and lane count of `layout`.
    pub fn zeroed(layout: &StateLayout) -> Self {
        let lanes = layout.batch_size();
        Self {
            running_episode_metrics: layout
                .metric_names()
                .iter()
                .map(|n| (n.clone(), Array1::zeros(lanes)))
                .collect(),
            completed_episode_metric_totals: layout.metric_names().iter().map(|n| (n.clone(), 0.0)).collect(),
            completed_episode_count: 0,
            completed_episode_step_total: 0,
        }
    }

    /// Check that these statistics belong to `layout`: the same metric names in both maps
    /// and one running value per lane.
    pub fn check(&self, layout: &StateLayout) -> Result<()> {
        let names = layout.metric_names();
        for map_keys in [
            self.running_episode_metrics.keys().collect::<Vec<_>>(),
            self.completed_episode_metric_totals.keys().collect::<Vec<_>>(),
        ] {
            if let Some(extra) = map_keys.iter().find(|k| names.binary_search(**k).is_err()) {
                return Err(GymError::UnknownMetric((*extra).clone()));
            }
        }
        for name in names {
            let running = self
                .running_episode_metrics
                .get(name)
                .ok_or_else(|| GymError::MissingMetric(name.clone()))?;
            if !self.completed_episode_metric_totals.contains_key(name) {
                return Err(GymError::MissingMetric(name.clone()));
            }
            if running.len() != layout.batch_size() {
                return Err(GymError::LaneCount {
                    field: format!("running_episode_metrics[{name}]"),
                    expected: layout.batch_size(),
                    actual: running.len(),
                });
            }
        }
        Ok(())
    }

    /// `Σ step_count * done` over lanes of a state fresh from the core.
    ///
    /// Must be taken before resolution: recycled lanes carry the snapshot's step count,
    /// not the one the episode ended with.
    pub fn completed_step_delta(next: &SimulationState) -> u64 {
        next.step_count
            .iter()
            .zip(next.done.iter())
            .map(|(&steps, &done)| u64::from(steps) * done as u64)
            .sum()
    }

    /// Fold one resolved step into the statistics and return the result.
    ///
    /// `step_delta` comes from [`completed_step_delta`](Self::completed_step_delta) on the
    /// unresolved state. The order is fixed: accumulate running sums including this step,
    /// count completions, add finished lanes' running sums to the totals, then restart
    /// finished lanes' running sums from this step's values.
    ///
    /// Panics if a metric is missing from `carried`; both inputs are expected to have
    /// passed their layout checks.
    pub fn accumulate(&self, step_delta: u64, carried: &SimulationState) -> Self {
        let done = carried.done.view();
        let keep = mask::complement(done);

        let completed_episode_count = self.completed_episode_count + mask::count(done);
        let mut running_episode_metrics = Metrics::new();
        let mut completed_episode_metric_totals = self.completed_episode_metric_totals.clone();

        for (name, previous) in &self.running_episode_metrics {
            let current = &carried.metrics[name];
            let updated = previous + current;
            let finished: f64 = (&updated * &done).iter().map(|&v| f64::from(v)).sum();
            *completed_episode_metric_totals.entry(name.clone()).or_insert(0.0) += finished;
            let restarted = &updated * &keep + &(current * &done);
            running_episode_metrics.insert(name.clone(), restarted);
        }

        Self {
            running_episode_metrics,
            completed_episode_metric_totals,
            completed_episode_count,
            completed_episode_step_total: self.completed_episode_step_total + step_delta,
        }
    }

    /// Mean per-episode total for each metric, or `None` before any episode completed.
    pub fn completed_metric_means(&self) -> Option<BTreeMap<String, f64>> {
        if self.completed_episode_count == 0 {
            return None;
        }
        let n = self.completed_episode_count as f64;
        Some(self.completed_episode_metric_totals.iter().map(|(k, v)| (k.clone(), v / n)).collect())
    }

    /// Mean episode length in steps, or `None` before any episode completed.
    pub fn mean_completed_episode_length(&self) -> Option<f64> {
        (self.completed_episode_count > 0)
            .then(|| self.completed_episode_step_total as f64 / self.completed_episode_count as f64)
    }
}
