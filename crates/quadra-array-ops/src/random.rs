use std::fmt;

use quadra_array::{Array, ArrayError, Backend, DType, Dim4, Scalar};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Seeded pseudo-random generator state shared by [`randu`] and [`randn`].
///
/// Draws advance the generator stream but never change the seed, so two successive
/// draws differ while reseeding with the same value replays the same stream.
///
/// # Examples
///
/// ```
/// use quadra_array_ops::random::RandomEngine;
///
/// let mut engine = RandomEngine::new(7);
/// assert_eq!(engine.seed(), 7);
/// engine.set_seed(42);
/// assert_eq!(engine.seed(), 42);
/// assert_eq!(engine.draws(), 0);
/// ```
pub struct RandomEngine {
    seed: u64,
    rng: StdRng,
    draws: u64,
}

impl RandomEngine {
    /// The seed of a freshly created engine.
    pub const DEFAULT_SEED: u64 = 0;

    /// Creates an engine seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Returns the current seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Reseeds the engine. Every later draw follows the stream of `seed`.
    pub fn set_seed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Restarts the stream of the current seed.
    pub fn reset(&mut self) {
        self.set_seed(self.seed);
    }

    /// Returns the number of samples drawn since the last reseed.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    fn uniform(&mut self, dtype: DType) -> Scalar {
        self.draws += 1;
        let rng = &mut self.rng;
        match dtype {
            DType::F32 => Scalar::Real(f64::from(rng.random::<f32>())),
            DType::F64 => Scalar::Real(rng.random::<f64>()),
            DType::C32 => {
                let re = rng.random::<f32>();
                let im = rng.random::<f32>();
                Scalar::Complex(f64::from(re), f64::from(im))
            }
            DType::C64 => {
                let re = rng.random::<f64>();
                let im = rng.random::<f64>();
                Scalar::Complex(re, im)
            }
            DType::B8 => Scalar::Bool(rng.random::<f32>() >= 0.5),
            // truncated to the element width on conversion
            _ => Scalar::UInt(rng.random::<u64>()),
        }
    }

    fn normal(&mut self, dtype: DType) -> Scalar {
        self.draws += 1;
        let rng = &mut self.rng;
        match dtype {
            DType::F32 => Scalar::Real(f64::from(rng.sample::<f32, _>(StandardNormal))),
            DType::C32 => {
                let re = rng.sample::<f32, _>(StandardNormal);
                let im = rng.sample::<f32, _>(StandardNormal);
                Scalar::Complex(f64::from(re), f64::from(im))
            }
            DType::C64 => {
                let re = rng.sample::<f64, _>(StandardNormal);
                let im = rng.sample::<f64, _>(StandardNormal);
                Scalar::Complex(re, im)
            }
            _ => Scalar::Real(rng.sample::<f64, _>(StandardNormal)),
        }
    }
}

impl Default for RandomEngine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl fmt::Debug for RandomEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomEngine")
            .field("seed", &self.seed)
            .field("draws", &self.draws)
            .finish()
    }
}

/// Creates an array of uniformly distributed samples.
///
/// Samples are drawn in row-major order from `engine`:
///
/// - real types are uniform in `[0, 1)`, drawn at the precision of the type;
/// - complex types draw the real part, then the imaginary part;
/// - [`DType::B8`] is true when a uniform draw is at least 0.5;
/// - integer types are uniform over their full range.
///
/// # Arguments
///
/// * `backend` - The backend that materializes the result.
/// * `engine` - The generator state; its stream advances by one draw per element.
/// * `shape` - The shape of the result.
/// * `dtype` - The element type of the result.
///
/// # Errors
///
/// Returns [`ArrayError::ResourceExhausted`] if the result cannot be allocated. The
/// stream of `engine` is left untouched in that case.
///
/// # Example
///
/// ```
/// use quadra_array::{BackendKind, CpuAllocator, DType, Dim4};
/// use quadra_array_ops::random::{randu, RandomEngine};
///
/// let backend = BackendKind::Cpu.build(CpuAllocator::new()).unwrap();
/// let mut engine = RandomEngine::new(42);
/// let a = randu(backend.as_ref(), &mut engine, Dim4::from(100), DType::F32).unwrap();
/// assert!(a.to_vec::<f32>().unwrap().iter().all(|v| (0.0..1.0).contains(v)));
/// ```
pub fn randu(
    backend: &dyn Backend,
    engine: &mut RandomEngine,
    shape: Dim4,
    dtype: DType,
) -> Result<Array, ArrayError> {
    backend.generate(dtype, shape, &mut || engine.uniform(dtype))
}

/// Creates an array of standard normal samples.
///
/// Complex types draw the real and imaginary parts independently.
///
/// # Errors
///
/// Returns [`ArrayError::UnsupportedType`] for integer and boolean types, before any
/// sample is drawn, and [`ArrayError::ResourceExhausted`] if the result cannot be
/// allocated.
pub fn randn(
    backend: &dyn Backend,
    engine: &mut RandomEngine,
    shape: Dim4,
    dtype: DType,
) -> Result<Array, ArrayError> {
    if !(dtype.is_floating() || dtype.is_complex()) {
        return Err(ArrayError::unsupported_type(
            "randn",
            dtype,
            "normal samples require a floating point or complex type",
        ));
    }
    backend.generate(dtype, shape, &mut || engine.normal(dtype))
}
