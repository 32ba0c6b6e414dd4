use serde::{Deserialize, Serialize};

use quadra_array::{ArrayError, BackendKind, CpuAllocator};
use quadra_array_ops::RandomEngine;

/// Configuration of a [`crate::Context`].
///
/// Loadable with serde or from the process environment with
/// [`ContextConfig::from_env`]. Missing fields take their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// The backend that materializes arrays.
    pub backend: BackendKind,
    /// The largest single allocation in bytes, or `None` for no limit.
    pub memory_limit: Option<usize>,
    /// The initial seed of the random engine.
    pub seed: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            memory_limit: None,
            seed: RandomEngine::DEFAULT_SEED,
        }
    }
}

impl ContextConfig {
    /// Selects the backend: `cpu` or `parallel`.
    pub const BACKEND_VAR: &'static str = "QUADRA_BACKEND";
    /// Size of the dedicated pool of the `parallel` backend.
    pub const THREADS_VAR: &'static str = "QUADRA_THREADS";
    /// Per-allocation limit in bytes.
    pub const MEMORY_LIMIT_VAR: &'static str = "QUADRA_MEMORY_LIMIT";
    /// Initial seed of the random engine.
    pub const SEED_VAR: &'static str = "QUADRA_SEED";

    /// Reads the configuration from the process environment.
    ///
    /// Unset variables keep their default.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ArrayError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if a variable holds an invalid value.
    ///
    /// # Example
    ///
    /// ```
    /// use quadra::{BackendKind, ContextConfig};
    ///
    /// let config = ContextConfig::from_vars(|name| match name {
    ///     "QUADRA_BACKEND" => Some("parallel".to_string()),
    ///     "QUADRA_THREADS" => Some("4".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.backend, BackendKind::Parallel { threads: Some(4) });
    /// ```
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ArrayError> {
        let mut config = Self::default();

        let threads = lookup(Self::THREADS_VAR)
            .map(|v| parse::<usize>(Self::THREADS_VAR, &v))
            .transpose()?;

        if let Some(backend) = lookup(Self::BACKEND_VAR) {
            config.backend = match backend.trim().to_ascii_lowercase().as_str() {
                "cpu" => BackendKind::Cpu,
                "parallel" => BackendKind::Parallel { threads },
                other => {
                    return Err(ArrayError::invalid_argument(
                        "config",
                        format!("{} must be cpu or parallel, got {other:?}", Self::BACKEND_VAR),
                    ))
                }
            };
        }
        if threads.is_some() && config.backend == BackendKind::Cpu {
            log::warn!("{} is ignored by the cpu backend", Self::THREADS_VAR);
        }

        if let Some(limit) = lookup(Self::MEMORY_LIMIT_VAR) {
            config.memory_limit = Some(parse(Self::MEMORY_LIMIT_VAR, &limit)?);
        }
        if let Some(seed) = lookup(Self::SEED_VAR) {
            config.seed = parse(Self::SEED_VAR, &seed)?;
        }

        Ok(config)
    }

    /// Returns the allocator matching the memory limit.
    pub fn allocator(&self) -> CpuAllocator {
        match self.memory_limit {
            Some(limit) => CpuAllocator::with_limit(limit),
            None => CpuAllocator::new(),
        }
    }
}

fn parse<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ArrayError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        ArrayError::invalid_argument("config", format!("{name}={value:?}: {e}"))
    })
}
