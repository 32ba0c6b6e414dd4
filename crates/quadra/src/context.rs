use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use quadra_array::{
    Array, ArrayError, Backend, CpuBackend, DType, Dim4, Element, Scalar, MAX_DIMS,
};
use quadra_array_ops::{generate, manip, matrix, random, RandomEngine};

use crate::{config::ContextConfig, handle::ArrayHandle, handle::HandleTable};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// An execution context: one backend, one random engine and the arrays they produced.
///
/// Every operation takes its inputs as [`ArrayHandle`]s and returns a fresh handle for
/// the result. Inputs are never modified and stay valid after the call. On failure no
/// handle is produced.
///
/// # Example
///
/// ```
/// use quadra::{Context, ContextConfig, DType, Dim4};
///
/// let ctx = Context::new(ContextConfig::default()).unwrap();
/// let a = ctx.range(Dim4::from(4), -1, DType::F32).unwrap();
/// let b = ctx.shift(&a, &[1]).unwrap();
/// assert_eq!(ctx.to_vec::<f32>(&b).unwrap(), vec![3.0, 0.0, 1.0, 2.0]);
///
/// ctx.release(a).unwrap();
/// ctx.release(b).unwrap();
/// assert_eq!(ctx.live_arrays(), 0);
/// ```
pub struct Context {
    id: u64,
    config: ContextConfig,
    backend: Box<dyn Backend>,
    engine: Mutex<RandomEngine>,
    arrays: HandleTable,
}

impl Context {
    /// Creates a context from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if the configured backend cannot be built.
    pub fn new(config: ContextConfig) -> Result<Self, ArrayError> {
        let backend = config.backend.build(config.allocator())?;
        Ok(Self::with_backend(config, backend))
    }

    /// Creates a context that runs on a custom backend.
    ///
    /// The backend field of `config` is informational only.
    pub fn with_backend(config: ContextConfig, backend: Box<dyn Backend>) -> Self {
        let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
        log::info!(
            "context {id}: {} backend, seed {}, memory limit {:?}",
            backend.name(),
            config.seed,
            config.memory_limit
        );
        Self {
            id,
            engine: Mutex::new(RandomEngine::new(config.seed)),
            arrays: HandleTable::new(id),
            config,
            backend,
        }
    }

    /// Returns the process-wide default context.
    ///
    /// The context is created on first use from [`ContextConfig::from_env`]. An invalid
    /// environment falls back to the default configuration.
    pub fn global() -> &'static Context {
        static GLOBAL: OnceLock<Context> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            match ContextConfig::from_env().and_then(Context::new) {
                Ok(context) => context,
                Err(e) => {
                    log::warn!("invalid environment, using the default context: {e}");
                    let config = ContextConfig::default();
                    let backend = Box::new(CpuBackend::new(config.allocator()));
                    Context::with_backend(config, backend)
                }
            }
        })
    }

    /// Returns the configuration of the context.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Returns the name of the backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Returns the number of arrays that have not been released.
    pub fn live_arrays(&self) -> usize {
        self.arrays.len()
    }

    fn engine(&self) -> MutexGuard<'_, RandomEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn array(&self, handle: &ArrayHandle) -> Result<Array, ArrayError> {
        self.arrays.get(handle)
    }

    fn dispatch(
        &self,
        operation: &str,
        run: impl FnOnce(&dyn Backend) -> Result<Array, ArrayError>,
    ) -> Result<ArrayHandle, ArrayError> {
        match run(self.backend.as_ref()) {
            Ok(array) => {
                log::debug!("{operation}: {array} on {}", self.backend.name());
                Ok(self.arrays.insert(array))
            }
            Err(e) => {
                if e.is_out_of_memory() {
                    log::warn!("{operation} failed on {}: {e}", self.backend.name());
                } else {
                    log::debug!("{operation} rejected: {e}");
                }
                Err(e)
            }
        }
    }

    /// Uploads host data as a new array.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::DimensionMismatch`] if `data` does not have
    /// `shape.elements()` elements.
    pub fn create_array<T: Element>(
        &self,
        shape: Dim4,
        data: &[T],
    ) -> Result<ArrayHandle, ArrayError> {
        let host = Array::from_slice(shape, data)?;
        self.dispatch("create_array", |backend| manip::copy(backend, &host))
    }

    /// Copies the elements of an array out in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::UnsupportedType`] if `T` is not the element type of the
    /// array.
    pub fn to_vec<T: Element>(&self, handle: &ArrayHandle) -> Result<Vec<T>, ArrayError> {
        self.array(handle)?.to_vec()
    }

    /// Returns the shape of an array.
    pub fn shape(&self, handle: &ArrayHandle) -> Result<Dim4, ArrayError> {
        Ok(self.array(handle)?.shape())
    }

    /// Returns the element type of an array.
    pub fn dtype(&self, handle: &ArrayHandle) -> Result<DType, ArrayError> {
        Ok(self.array(handle)?.dtype())
    }

    /// Returns the number of elements of an array.
    pub fn elements(&self, handle: &ArrayHandle) -> Result<usize, ArrayError> {
        Ok(self.array(handle)?.elements())
    }

    /// Releases an array.
    ///
    /// Views of the array keep their data alive.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if the handle belongs to another context.
    pub fn release(&self, handle: ArrayHandle) -> Result<(), ArrayError> {
        self.arrays.remove(handle).map(drop)
    }

    /// Waits for all pending work of the backend.
    pub fn synchronize(&self) -> Result<(), ArrayError> {
        self.backend.synchronize()
    }

    /// Reseeds the random engine; later draws follow the stream of `seed`.
    pub fn set_seed(&self, seed: u64) {
        log::info!("context {}: seed set to {seed}", self.id);
        self.engine().set_seed(seed);
    }

    /// Returns the current seed of the random engine.
    pub fn get_seed(&self) -> u64 {
        self.engine().seed()
    }

    /// Creates an array filled with `value` converted to `dtype`.
    pub fn constant(
        &self,
        value: impl Into<Scalar>,
        shape: Dim4,
        dtype: DType,
    ) -> Result<ArrayHandle, ArrayError> {
        let value = value.into();
        self.dispatch("constant", |b| generate::constant(b, value, shape, dtype))
    }

    /// Creates a complex array filled with `real + imag·i`.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::UnsupportedType`] unless `dtype` is complex.
    pub fn constant_complex(
        &self,
        real: f64,
        imag: f64,
        shape: Dim4,
        dtype: DType,
    ) -> Result<ArrayHandle, ArrayError> {
        self.dispatch("constant_complex", |b| {
            generate::constant_complex(b, real, imag, shape, dtype)
        })
    }

    /// Creates a [`DType::S64`] array filled with `value`, exactly.
    pub fn constant_i64(&self, value: i64, shape: Dim4) -> Result<ArrayHandle, ArrayError> {
        self.dispatch("constant_i64", |b| generate::constant_i64(b, value, shape))
    }

    /// Creates a [`DType::U64`] array filled with `value`, exactly.
    pub fn constant_u64(&self, value: u64, shape: Dim4) -> Result<ArrayHandle, ArrayError> {
        self.dispatch("constant_u64", |b| generate::constant_u64(b, value, shape))
    }

    /// Creates an array of uniform samples, see [`random::randu`].
    pub fn randu(&self, shape: Dim4, dtype: DType) -> Result<ArrayHandle, ArrayError> {
        let mut engine = self.engine();
        self.dispatch("randu", |b| random::randu(b, &mut engine, shape, dtype))
    }

    /// Creates an array of standard normal samples, see [`random::randn`].
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::UnsupportedType`] for integer and boolean types.
    pub fn randn(&self, shape: Dim4, dtype: DType) -> Result<ArrayHandle, ArrayError> {
        let mut engine = self.engine();
        self.dispatch("randn", |b| random::randn(b, &mut engine, shape, dtype))
    }

    /// Creates a batch of identity matrices.
    pub fn identity(&self, shape: Dim4, dtype: DType) -> Result<ArrayHandle, ArrayError> {
        self.dispatch("identity", |b| generate::identity(b, shape, dtype))
    }

    /// Creates an array counting along `seq_dim`, see [`generate::range`].
    pub fn range(
        &self,
        shape: Dim4,
        seq_dim: i32,
        dtype: DType,
    ) -> Result<ArrayHandle, ArrayError> {
        self.dispatch("range", |b| generate::range(b, shape, seq_dim, dtype))
    }

    /// Creates a tiled sequence of linear indices, see [`generate::iota`].
    pub fn iota(
        &self,
        shape: Dim4,
        tile_dims: Dim4,
        dtype: DType,
    ) -> Result<ArrayHandle, ArrayError> {
        self.dispatch("iota", |b| generate::iota(b, shape, tile_dims, dtype))
    }

    /// Creates (`extract == false`) or extracts (`extract == true`) a diagonal.
    pub fn diag(
        &self,
        handle: &ArrayHandle,
        num: i32,
        extract: bool,
    ) -> Result<ArrayHandle, ArrayError> {
        let input = self.array(handle)?;
        self.dispatch("diag", |b| matrix::diag(b, &input, num, extract))
    }

    /// Creates a square matrix with a vector on its `num`-th diagonal.
    pub fn diag_create(&self, handle: &ArrayHandle, num: i32) -> Result<ArrayHandle, ArrayError> {
        let input = self.array(handle)?;
        self.dispatch("diag_create", |b| matrix::diag_create(b, &input, num))
    }

    /// Extracts the `num`-th diagonal of every 2D slice.
    pub fn diag_extract(&self, handle: &ArrayHandle, num: i32) -> Result<ArrayHandle, ArrayError> {
        let input = self.array(handle)?;
        self.dispatch("diag_extract", |b| matrix::diag_extract(b, &input, num))
    }

    /// Concatenates 1 to 10 arrays along `dim`, see [`manip::join`].
    pub fn join(&self, dim: i32, handles: &[&ArrayHandle]) -> Result<ArrayHandle, ArrayError> {
        let inputs = handles
            .iter()
            .map(|handle| self.array(handle))
            .collect::<Result<Vec<_>, _>>()?;
        let refs: Vec<&Array> = inputs.iter().collect();
        self.dispatch("join", |b| manip::join(b, dim, &refs))
    }

    /// Concatenates two arrays along `dim`.
    pub fn join2(
        &self,
        dim: i32,
        first: &ArrayHandle,
        second: &ArrayHandle,
    ) -> Result<ArrayHandle, ArrayError> {
        self.join(dim, &[first, second])
    }

    /// Concatenates three arrays along `dim`.
    pub fn join3(
        &self,
        dim: i32,
        first: &ArrayHandle,
        second: &ArrayHandle,
        third: &ArrayHandle,
    ) -> Result<ArrayHandle, ArrayError> {
        self.join(dim, &[first, second, third])
    }

    /// Concatenates four arrays along `dim`.
    pub fn join4(
        &self,
        dim: i32,
        first: &ArrayHandle,
        second: &ArrayHandle,
        third: &ArrayHandle,
        fourth: &ArrayHandle,
    ) -> Result<ArrayHandle, ArrayError> {
        self.join(dim, &[first, second, third, fourth])
    }

    /// Repeats an array `reps[k]` times along every axis `k`.
    pub fn tile(&self, handle: &ArrayHandle, reps: Dim4) -> Result<ArrayHandle, ArrayError> {
        let input = self.array(handle)?;
        self.dispatch("tile", |b| manip::tile(b, &input, reps))
    }

    /// Reorders the axes of an array.
    ///
    /// `perm` lists the source axis of each result axis. Axes not listed keep their own
    /// position, so `&[1, 0]` transposes a matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if `perm` has more than four entries or is
    /// not a permutation.
    pub fn reorder(&self, handle: &ArrayHandle, perm: &[usize]) -> Result<ArrayHandle, ArrayError> {
        let perm = pad("reorder", perm, |axis| axis)?;
        let input = self.array(handle)?;
        self.dispatch("reorder", |_| manip::reorder(&input, perm))
    }

    /// Circularly shifts an array; missing trailing offsets are 0.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if more than four offsets are given.
    pub fn shift(&self, handle: &ArrayHandle, offsets: &[i64]) -> Result<ArrayHandle, ArrayError> {
        let offsets = pad("shift", offsets, |_| 0)?;
        let input = self.array(handle)?;
        self.dispatch("shift", |b| manip::shift(b, &input, offsets))
    }

    /// Reinterprets an array under a new shape with the same number of elements.
    pub fn moddims(&self, handle: &ArrayHandle, shape: Dim4) -> Result<ArrayHandle, ArrayError> {
        let input = self.array(handle)?;
        self.dispatch("moddims", |b| manip::moddims(b, &input, shape))
    }

    /// Flattens an array into a column.
    pub fn flat(&self, handle: &ArrayHandle) -> Result<ArrayHandle, ArrayError> {
        let input = self.array(handle)?;
        self.dispatch("flat", |b| manip::flat(b, &input))
    }

    /// Reverses an array along `dim`.
    pub fn flip(&self, handle: &ArrayHandle, dim: usize) -> Result<ArrayHandle, ArrayError> {
        let input = self.array(handle)?;
        self.dispatch("flip", |_| manip::flip(&input, dim))
    }

    /// Keeps the lower triangle of every 2D slice.
    pub fn lower(&self, handle: &ArrayHandle, unit_diag: bool) -> Result<ArrayHandle, ArrayError> {
        let input = self.array(handle)?;
        self.dispatch("lower", |b| matrix::lower(b, &input, unit_diag))
    }

    /// Keeps the upper triangle of every 2D slice.
    pub fn upper(&self, handle: &ArrayHandle, unit_diag: bool) -> Result<ArrayHandle, ArrayError> {
        let input = self.array(handle)?;
        self.dispatch("upper", |b| matrix::upper(b, &input, unit_diag))
    }

    /// Copies an array into fresh storage.
    pub fn copy(&self, handle: &ArrayHandle) -> Result<ArrayHandle, ArrayError> {
        let input = self.array(handle)?;
        self.dispatch("copy", |b| manip::copy(b, &input))
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("live_arrays", &self.live_arrays())
            .finish()
    }
}

/// Extends a per-axis argument to four entries.
fn pad<T: Copy>(
    operation: &str,
    values: &[T],
    default: impl Fn(usize) -> T,
) -> Result<[T; MAX_DIMS], ArrayError> {
    if values.len() > MAX_DIMS {
        return Err(ArrayError::invalid_argument(
            operation,
            format!("expected at most {MAX_DIMS} entries, got {}", values.len()),
        ));
    }
    Ok(std::array::from_fn(|axis| {
        values.get(axis).copied().unwrap_or_else(|| default(axis))
    }))
}
