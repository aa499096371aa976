pub mod core;
pub mod mask;
pub mod layout;
pub mod snapshot;
pub mod resolver;
pub mod stats;
pub mod wrappers;
pub mod config;
pub mod envs;
pub mod registry;
pub mod utils;

pub use crate::core::{GymError, Internal, LaneField, Metrics, Result, SimulationCore, SimulationState, REWARD_METRIC};
pub use crate::config::{EnvConfig, KwArgs};
pub use crate::envs::{Pendulum, ReacherAngle};
pub use crate::layout::StateLayout;
pub use crate::mask::select;
pub use crate::registry::{create, create_from_kwargs, get_spec, register, EnvSpec};
pub use crate::snapshot::InitialSnapshot;
pub use crate::stats::EpisodeStatistics;
pub use crate::wrappers::{clip_action, wrap, EpisodeWrapper, WrapperState};
