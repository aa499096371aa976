//! The fixed layout of a simulation state, resolved once from the first state and used
//! to validate every state produced afterwards.

use std::collections::BTreeMap;

use crate::core::{GymError, Result, SimulationState};

/// Element kind and shape of one internal field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub kind: &'static str,
    pub shape: Vec<usize>,
}

/// Batch size, observation width, metric schema and internal field layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateLayout {
    batch_size: usize,
    observation_size: usize,
    metric_names: Vec<String>,
    internal: BTreeMap<String, FieldLayout>,
}

impl StateLayout {
    /// Capture the layout of `state`, after checking it is internally consistent.
    pub fn capture(state: &SimulationState) -> Result<Self> {
        let batch_size = state.lanes();
        let layout = Self {
            batch_size,
            observation_size: state.observation.ncols(),
            metric_names: state.metrics.keys().cloned().collect(),
            internal: state
                .internal
                .iter()
                .map(|(k, f)| (k.clone(), FieldLayout { kind: f.kind(), shape: f.shape().to_vec() }))
                .collect(),
        };
        layout.check(state)?;
        Ok(layout)
    }

    pub fn batch_size(&self) -> usize { self.batch_size }
    pub fn observation_size(&self) -> usize { self.observation_size }

    /// Metric names in schema order (sorted).
    pub fn metric_names(&self) -> &[String] { &self.metric_names }

    pub fn internal(&self) -> &BTreeMap<String, FieldLayout> { &self.internal }

    /// Validate `state` against this layout. Nothing is truncated, padded or added.
    pub fn check(&self, state: &SimulationState) -> Result<()> {
        let b = self.batch_size;
        lanes("done", b, state.done.len())?;
        lanes("reward", b, state.reward.len())?;
        lanes("step_count", b, state.step_count.len())?;
        shape("observation", &[b, self.observation_size], state.observation.shape())?;

        for name in state.metrics.keys() {
            if self.metric_names.binary_search(name).is_err() {
                return Err(GymError::UnknownMetric(name.clone()));
            }
        }
        for name in &self.metric_names {
            let values = state.metrics.get(name).ok_or_else(|| GymError::MissingMetric(name.clone()))?;
            lanes(&format!("metrics[{name}]"), b, values.len())?;
        }

        if state.internal.len() != self.internal.len() {
            if let Some(extra) = state.internal.keys().find(|k| !self.internal.contains_key(*k)) {
                return Err(GymError::Other(format!("unexpected internal field {extra:?}")));
            }
        }
        for (name, expected) in &self.internal {
            let field = state
                .internal
                .get(name)
                .ok_or_else(|| GymError::Other(format!("internal field {name:?} is missing")))?;
            if field.kind() != expected.kind {
                return Err(GymError::Other(format!(
                    "internal field {name:?} changed element type from {} to {}",
                    expected.kind,
                    field.kind()
                )));
            }
            shape(&format!("internal[{name}]"), &expected.shape, field.shape())?;
        }
        if self.internal.values().any(|f| f.shape.first() != Some(&b)) {
            return Err(GymError::Other("internal fields must lead with the lane axis".into()));
        }

        if let Some((lane, &value)) = state.done.iter().enumerate().find(|(_, d)| **d != 0.0 && **d != 1.0) {
            return Err(GymError::InvalidDone { lane, value });
        }
        Ok(())
    }
}

fn lanes(field: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(GymError::LaneCount { field: field.to_string(), expected, actual })
    }
}

fn shape(field: &str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(GymError::Shape { field: field.to_string(), expected: expected.to_vec(), actual: actual.to_vec() })
    }
}
