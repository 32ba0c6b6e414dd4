//! Backend abstraction for materializing arrays.
//!
//! Operations never allocate or fill storage themselves. They describe every output
//! element with a [`Kernel`] and hand it to a [`Backend`], which owns allocation and the
//! execution strategy. Adding a new execution target means adding a new implementation
//! of the trait; no operation has to change.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    allocator::{ArrayAllocator, CpuAllocator},
    array::Array,
    dim4::Dim4,
    dtype::{with_element, DType},
    element::Element,
    error::ArrayError,
    kernel::{resolve, typed_inputs, Kernel},
    scalar::Scalar,
};

/// The available execution backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Serial evaluation on the calling thread.
    #[default]
    Cpu,
    /// Data-parallel evaluation on a rayon thread pool.
    Parallel {
        /// Size of a dedicated pool. `None` runs on the global rayon pool.
        threads: Option<usize>,
    },
}

impl BackendKind {
    /// Builds a backend of this kind that allocates through `allocator`.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if a dedicated thread pool cannot be
    /// created.
    pub fn build(self, allocator: CpuAllocator) -> Result<Box<dyn Backend>, ArrayError> {
        Ok(match self {
            BackendKind::Cpu => Box::new(CpuBackend::new(allocator)),
            BackendKind::Parallel { threads } => Box::new(ParallelBackend::new(allocator, threads)?),
        })
    }
}

/// Backend trait defining how arrays are produced.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one backend can serve a whole context.
pub trait Backend: Send + Sync + 'static {
    /// Returns the kind of this backend.
    fn kind(&self) -> BackendKind;

    /// Returns a short, human-readable name of the backend.
    fn name(&self) -> &'static str;

    /// Creates an array by evaluating `kernel` at every index of `shape`.
    ///
    /// # Arguments
    ///
    /// * `dtype` - The element type of the result.
    /// * `shape` - The shape of the result.
    /// * `inputs` - The arrays that [`crate::Source::Input`] refers to.
    /// * `kernel` - The source of each output element.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::UnsupportedType`] if an input has a different element type
    /// than `dtype`, [`ArrayError::ResourceExhausted`] if the output cannot be allocated,
    /// and [`ArrayError::InvalidArgument`] if the kernel reads outside its inputs.
    fn materialize(
        &self,
        dtype: DType,
        shape: Dim4,
        inputs: &[&Array],
        kernel: &Kernel<'_>,
    ) -> Result<Array, ArrayError>;

    /// Creates an array from a stream of values visited in row-major order.
    ///
    /// The output is reserved before `next` is first called, so on failure no value has
    /// been consumed from the stream. `next` is called exactly once per element.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::ResourceExhausted`] if the output cannot be allocated.
    fn generate(
        &self,
        dtype: DType,
        shape: Dim4,
        next: &mut dyn FnMut() -> Scalar,
    ) -> Result<Array, ArrayError>;

    /// Waits for all pending work of the backend to complete.
    ///
    /// Backends that finish every operation before returning need not override this.
    ///
    /// # Errors
    ///
    /// Returns an error if synchronization fails.
    fn synchronize(&self) -> Result<(), ArrayError> {
        Ok(())
    }
}

/// How the output elements are visited.
enum Fill<'a> {
    Serial,
    Parallel(Option<&'a rayon::ThreadPool>),
}

fn evaluate<T: Element>(
    allocator: &CpuAllocator,
    shape: Dim4,
    inputs: &[&Array],
    kernel: &Kernel<'_>,
    fill: Fill<'_>,
) -> Result<Array, ArrayError> {
    let data = typed_inputs::<T>(inputs)?;
    let len = shape.elements();

    let mut out = allocator.allocate::<T>(len)?;
    out.resize(len, T::zero());

    let element = |(linear, slot): (usize, &mut T)| -> Result<(), ArrayError> {
        *slot = resolve(kernel(shape.unravel(linear)), &data, inputs)?;
        Ok(())
    };

    match fill {
        Fill::Serial => out.iter_mut().enumerate().try_for_each(element)?,
        Fill::Parallel(pool) => {
            let mut run = || out.par_iter_mut().enumerate().try_for_each(element);
            match pool {
                Some(pool) => pool.install(run)?,
                None => run()?,
            }
        }
    }

    Array::from_vec(shape, out)
}

fn sequence<T: Element>(
    allocator: &CpuAllocator,
    shape: Dim4,
    next: &mut dyn FnMut() -> Scalar,
) -> Result<Array, ArrayError> {
    let len = shape.elements();
    let mut out = allocator.allocate::<T>(len)?;
    out.extend((0..len).map(|_| T::from_scalar(next())));
    Array::from_vec(shape, out)
}

/// Serial CPU backend.
///
/// Evaluates kernels element by element on the calling thread. This is the reference
/// backend; every other backend must produce identical results.
#[derive(Debug, Clone, Default)]
pub struct CpuBackend {
    allocator: CpuAllocator,
}

impl CpuBackend {
    /// Creates a new CPU backend.
    pub fn new(allocator: CpuAllocator) -> Self {
        Self { allocator }
    }
}

impl Backend for CpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn materialize(
        &self,
        dtype: DType,
        shape: Dim4,
        inputs: &[&Array],
        kernel: &Kernel<'_>,
    ) -> Result<Array, ArrayError> {
        log::trace!("cpu: materialize {dtype}{shape} from {} inputs", inputs.len());
        with_element!(dtype, T => evaluate::<T>(&self.allocator, shape, inputs, kernel, Fill::Serial))
    }

    fn generate(
        &self,
        dtype: DType,
        shape: Dim4,
        next: &mut dyn FnMut() -> Scalar,
    ) -> Result<Array, ArrayError> {
        log::trace!("cpu: generate {dtype}{shape}");
        with_element!(dtype, T => sequence::<T>(&self.allocator, shape, next))
    }
}

/// Data-parallel CPU backend built on rayon.
///
/// Output elements are evaluated independently, either on the global rayon pool or on a
/// dedicated pool with a fixed number of threads.
#[derive(Debug)]
pub struct ParallelBackend {
    allocator: CpuAllocator,
    threads: Option<usize>,
    pool: Option<rayon::ThreadPool>,
}

impl ParallelBackend {
    /// Creates a new parallel backend.
    ///
    /// # Arguments
    ///
    /// * `allocator` - The allocator for output storage.
    /// * `threads` - Size of a dedicated pool, or `None` for the global rayon pool.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if `threads` is `Some(0)` or the pool
    /// cannot be built.
    pub fn new(allocator: CpuAllocator, threads: Option<usize>) -> Result<Self, ArrayError> {
        let pool = match threads {
            None => None,
            Some(0) => {
                return Err(ArrayError::invalid_argument(
                    "parallel backend",
                    "thread count must be positive",
                ))
            }
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ArrayError::invalid_argument("parallel backend", e.to_string()))?,
            ),
        };

        Ok(Self {
            allocator,
            threads,
            pool,
        })
    }

    /// Returns the number of threads that evaluate kernels.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl Backend for ParallelBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Parallel {
            threads: self.threads,
        }
    }

    fn name(&self) -> &'static str {
        "parallel"
    }

    fn materialize(
        &self,
        dtype: DType,
        shape: Dim4,
        inputs: &[&Array],
        kernel: &Kernel<'_>,
    ) -> Result<Array, ArrayError> {
        log::trace!(
            "parallel: materialize {dtype}{shape} from {} inputs on {} threads",
            inputs.len(),
            self.num_threads()
        );
        let fill = Fill::Parallel(self.pool.as_ref());
        with_element!(dtype, T => evaluate::<T>(&self.allocator, shape, inputs, kernel, fill))
    }

    // a stream has a single order, so it is consumed on the calling thread
    fn generate(
        &self,
        dtype: DType,
        shape: Dim4,
        next: &mut dyn FnMut() -> Scalar,
    ) -> Result<Array, ArrayError> {
        log::trace!("parallel: generate {dtype}{shape}");
        with_element!(dtype, T => sequence::<T>(&self.allocator, shape, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Source;

    fn backends() -> Result<Vec<Box<dyn Backend>>, ArrayError> {
        Ok(vec![
            BackendKind::Cpu.build(CpuAllocator::new())?,
            BackendKind::Parallel { threads: None }.build(CpuAllocator::new())?,
            BackendKind::Parallel { threads: Some(2) }.build(CpuAllocator::new())?,
        ])
    }

    #[test]
    fn constant_kernel() -> Result<(), ArrayError> {
        for backend in backends()? {
            let out = backend.materialize(
                DType::S16,
                Dim4::from((2, 3)),
                &[],
                &|_| Source::Value(Scalar::Int(-7)),
            )?;
            assert_eq!(out.dtype(), DType::S16);
            assert_eq!(out.to_vec::<i16>()?, vec![-7; 6]);
        }
        Ok(())
    }

    #[test]
    fn backends_agree_on_input_kernels() -> Result<(), ArrayError> {
        let input = Array::from_vec(Dim4::from((3, 4)), (0..12u32).collect())?;
        let transpose = |[i, j, k, l]: [usize; 4]| Source::Input {
            input: 0,
            index: [j, i, k, l],
        };

        let mut results = Vec::new();
        for backend in backends()? {
            let out = backend.materialize(DType::U32, Dim4::from((4, 3)), &[&input], &transpose)?;
            results.push(out.to_vec::<u32>()?);
        }
        assert_eq!(results[0], vec![0, 4, 8, 1, 5, 9, 2, 6, 10, 3, 7, 11]);
        assert!(results.iter().all(|r| *r == results[0]));
        Ok(())
    }

    #[test]
    fn inputs_must_match_the_output_type() -> Result<(), ArrayError> {
        let input = Array::from_vec(Dim4::from(2), vec![1.0f64, 2.0])?;
        for backend in backends()? {
            let result = backend.materialize(DType::F32, Dim4::from(2), &[&input], &|index| {
                Source::Input { input: 0, index }
            });
            assert!(matches!(result, Err(ArrayError::UnsupportedType { .. })));
        }
        Ok(())
    }

    #[test]
    fn allocation_limit_is_resource_exhausted() -> Result<(), ArrayError> {
        let backend = BackendKind::Cpu.build(CpuAllocator::with_limit(16))?;
        let err = backend
            .materialize(DType::F64, Dim4::from(3), &[], &|_| Source::Zero)
            .unwrap_err();
        assert!(err.is_out_of_memory());
        Ok(())
    }

    #[test]
    fn generate_consumes_one_value_per_element() -> Result<(), ArrayError> {
        for backend in backends()? {
            let mut count = 0u64;
            let out = backend.generate(DType::U16, Dim4::from((2, 3)), &mut || {
                count += 1;
                Scalar::UInt(count)
            })?;
            assert_eq!(out.to_vec::<u16>()?, vec![1, 2, 3, 4, 5, 6]);
            assert_eq!(count, 6);
        }
        Ok(())
    }

    #[test]
    fn generate_reserves_before_consuming() -> Result<(), ArrayError> {
        for kind in [BackendKind::Cpu, BackendKind::Parallel { threads: Some(2) }] {
            let backend = kind.build(CpuAllocator::with_limit(16))?;
            let mut count = 0u64;
            let err = backend
                .generate(DType::F64, Dim4::from(3), &mut || {
                    count += 1;
                    Scalar::Real(0.0)
                })
                .unwrap_err();
            assert!(err.is_out_of_memory());
            assert_eq!(count, 0);
        }
        Ok(())
    }

    #[test]
    fn empty_shapes_produce_empty_arrays() -> Result<(), ArrayError> {
        for backend in backends()? {
            let out = backend.materialize(DType::C64, Dim4::new([0, 2, 1, 1]), &[], &|_| {
                Source::One
            })?;
            assert!(out.is_empty());
            assert_eq!(out.shape(), Dim4::new([0, 2, 1, 1]));
        }
        Ok(())
    }

    #[test]
    fn zero_threads_is_rejected() {
        let result = ParallelBackend::new(CpuAllocator::new(), Some(0));
        assert!(matches!(result, Err(ArrayError::InvalidArgument { .. })));
    }

    #[test]
    fn kinds_and_names() -> Result<(), ArrayError> {
        let backend = ParallelBackend::new(CpuAllocator::new(), Some(3))?;
        assert_eq!(backend.num_threads(), 3);
        assert_eq!(backend.kind(), BackendKind::Parallel { threads: Some(3) });
        assert_eq!(backend.name(), "parallel");
        assert_eq!(CpuBackend::default().name(), "cpu");
        assert!(CpuBackend::default().synchronize().is_ok());
        Ok(())
    }

    #[test]
    fn kind_serde() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&BackendKind::Cpu)?, "\"cpu\"");
        let kind: BackendKind = serde_json::from_str(r#"{"parallel":{"threads":4}}"#)?;
        assert_eq!(kind, BackendKind::Parallel { threads: Some(4) });
        Ok(())
    }
}
