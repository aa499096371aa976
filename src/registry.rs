// Registration and specs: construct simulation cores by id.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::config::{EnvConfig, KwArgs};
use crate::core::{GymError, Result, SimulationCore};
use crate::envs::{Pendulum, ReacherAngle};

/// A boxed, thread-safe simulation core as returned by `create`.
pub type DynCore = Box<dyn SimulationCore + Send + Sync>;

/// Environment specification metadata.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvSpec {
    /// Unique identifier like "reacherangle".
    pub id: String,
    /// Default episode length when the caller does not override it.
    pub episode_length: u32,
    /// Default physics substeps per step.
    pub action_repeat: u32,
    pub observation_size: usize,
    pub action_size: usize,
}

impl EnvSpec {
    pub fn new<S: Into<String>>(id: S, observation_size: usize, action_size: usize) -> Self {
        Self { id: id.into(), episode_length: 1000, action_repeat: 1, observation_size, action_size }
    }

    /// Config for `batch_size` lanes using this spec's episode defaults.
    pub fn config(&self, batch_size: usize) -> EnvConfig {
        EnvConfig::new(batch_size, self.episode_length).with_action_repeat(self.action_repeat)
    }
}

/// Factory closure type for constructing cores from a config.
pub type FactoryFn = Box<dyn Fn(&EnvConfig) -> Result<DynCore> + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    specs: HashMap<String, EnvSpec>,
    factories: HashMap<String, FactoryFn>,
}

struct Registry {
    inner: RwLock<RegistryInner>,
}

impl Registry {
    fn new() -> Self { Self { inner: RwLock::new(RegistryInner::default()) } }

    fn with_builtins() -> Self {
        let registry = Self::new();
        let builtins: [(EnvSpec, FactoryFn); 2] = [
            (EnvSpec::new("pendulum", 3, 1), factory_of(Pendulum::new)),
            (EnvSpec::new("reacherangle", crate::envs::reacher_angle::OBSERVATION_SIZE, 2), factory_of(ReacherAngle::new)),
        ];
        for (spec, factory) in builtins {
            if let Err(e) = registry.register(spec, factory) {
                log::warn!("skipping built-in environment: {e}");
            }
        }
        registry
    }

    fn register(&self, spec: EnvSpec, factory: FactoryFn) -> Result<()> {
        let mut g = self.inner.write().map_err(|_| GymError::Other("registry poisoned".into()))?;
        if g.specs.contains_key(&spec.id) {
            log::warn!("environment {} is already registered", spec.id);
            return Err(GymError::Other(format!("Env id already registered: {}", spec.id)));
        }
        log::debug!("registering environment {}", spec.id);
        g.factories.insert(spec.id.clone(), factory);
        g.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    fn get_spec(&self, id: &str) -> Option<EnvSpec> {
        let g = self.inner.read().ok()?;
        g.specs.get(id).cloned()
    }

    fn create(&self, id: &str, config: &EnvConfig) -> Result<DynCore> {
        let guard = self.inner.read().map_err(|_| GymError::Other("registry poisoned".into()))?;
        match guard.factories.get(id) {
            Some(f) => (f)(config),
            None => Err(GymError::UnknownEnv(id.to_string())),
        }
    }
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::with_builtins)
}

/// Register an environment spec and its factory globally.
pub fn register(spec: EnvSpec, factory: FactoryFn) -> Result<()> { registry().register(spec, factory) }

/// Fetch a registered EnvSpec by id.
pub fn get_spec(id: &str) -> Option<EnvSpec> { registry().get_spec(id) }

/// Construct a core by id.
pub fn create<S: AsRef<str>>(id: S, config: &EnvConfig) -> Result<DynCore> {
    config.validate()?;
    registry().create(id.as_ref(), config)
}

/// Construct a core by id from kwargs; missing episode settings fall back to the spec's.
pub fn create_from_kwargs<S: AsRef<str>>(id: S, kwargs: &KwArgs) -> Result<DynCore> {
    let id = id.as_ref();
    let spec = get_spec(id).ok_or_else(|| GymError::UnknownEnv(id.to_string()))?;
    let mut config = EnvConfig::from_kwargs(kwargs)?;
    if !kwargs.contains_key("episode_length") {
        config.episode_length = spec.episode_length;
    }
    if !kwargs.contains_key("action_repeat") {
        config.action_repeat = spec.action_repeat;
    }
    create(id, &config)
}

/// Adapt a concrete core constructor into a factory function.
pub fn factory_of<C, F>(ctor: F) -> FactoryFn
where
    C: SimulationCore + Send + Sync + 'static,
    F: Fn(&EnvConfig) -> Result<C> + Send + Sync + 'static,
{
    Box::new(move |config: &EnvConfig| Ok(Box::new(ctor(config)?) as DynCore))
}
