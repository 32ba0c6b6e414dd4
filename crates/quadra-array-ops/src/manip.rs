use quadra_array::{Array, ArrayError, Backend, Dim4, Source, MAX_DIMS};

use crate::generate::scaled_shape;

/// The largest number of arrays a single [`join`] accepts.
pub const MAX_JOIN_INPUTS: usize = 10;

/// Copies an array into fresh, standard-layout storage.
///
/// Useful to materialize a view; the result never shares storage with `input`.
///
/// # Errors
///
/// Returns [`ArrayError::ResourceExhausted`] if the result cannot be allocated.
pub fn copy(backend: &dyn Backend, input: &Array) -> Result<Array, ArrayError> {
    backend.materialize(input.dtype(), input.shape(), &[input], &|index| Source::Input {
        input: 0,
        index,
    })
}

/// Concatenates arrays along one axis.
///
/// Arrays without elements are skipped. Every other array must have the same extent as
/// the others on all axes but `dim`; the result extent on `dim` is the sum of theirs, in
/// input order.
///
/// # Arguments
///
/// * `backend` - The backend that materializes the result.
/// * `dim` - The axis to join along, in `[0, 3]`.
/// * `arrays` - Between 1 and [`MAX_JOIN_INPUTS`] arrays of one element type.
///
/// # Errors
///
/// - [`ArrayError::InvalidArgument`] if `dim` is out of range or the number of arrays is
///   not in `[1, 10]`.
/// - [`ArrayError::UnsupportedType`] if the arrays have different element types.
/// - [`ArrayError::DimensionMismatch`] if two non-empty arrays differ off `dim`.
///
/// # Example
///
/// ```
/// use quadra_array::{Array, BackendKind, CpuAllocator, Dim4};
/// use quadra_array_ops::manip::join;
///
/// let backend = BackendKind::Cpu.build(CpuAllocator::new()).unwrap();
/// let a = Array::from_vec(Dim4::from(2), vec![1, 2]).unwrap();
/// let b = Array::from_vec(Dim4::from(2), vec![3, 4]).unwrap();
/// let c = join(backend.as_ref(), 0, &[&a, &b]).unwrap();
/// assert_eq!(c.to_vec::<i32>().unwrap(), vec![1, 2, 3, 4]);
/// ```
pub fn join(backend: &dyn Backend, dim: i32, arrays: &[&Array]) -> Result<Array, ArrayError> {
    let axis = match usize::try_from(dim) {
        Ok(axis) if axis < MAX_DIMS => axis,
        _ => {
            return Err(ArrayError::invalid_argument(
                "join",
                format!("dim {dim} is outside [0, 3]"),
            ))
        }
    };
    let first = match arrays {
        [first, ..] if arrays.len() <= MAX_JOIN_INPUTS => *first,
        _ => {
            return Err(ArrayError::invalid_argument(
                "join",
                format!(
                    "expected 1 to {MAX_JOIN_INPUTS} arrays, got {}",
                    arrays.len()
                ),
            ))
        }
    };

    let dtype = first.dtype();
    if let Some(other) = arrays.iter().find(|a| a.dtype() != dtype) {
        return Err(ArrayError::unsupported_type(
            "join",
            other.dtype(),
            format!("all arrays must have type {dtype}"),
        ));
    }

    let parts: Vec<&Array> = arrays.iter().copied().filter(|a| !a.is_empty()).collect();
    let Some(base) = parts.first() else {
        // nothing to concatenate: the result is an empty array of the first shape
        return copy(backend, first);
    };

    let mut starts = Vec::with_capacity(parts.len());
    let mut extent = 0;
    for part in &parts {
        for k in (0..MAX_DIMS).filter(|&k| k != axis) {
            if part.shape()[k] != base.shape()[k] {
                return Err(ArrayError::dimension_mismatch(
                    format!("join along axis {axis} requires equal extents on axis {k}"),
                    base.shape(),
                    part.shape(),
                ));
            }
        }
        starts.push(extent);
        extent += part.shape()[axis];
    }

    let out_shape = base.shape().with_extent(axis, extent);
    backend.materialize(dtype, out_shape, &parts, &|mut index| {
        let input = starts.partition_point(|&start| start <= index[axis]) - 1;
        index[axis] -= starts[input];
        Source::Input { input, index }
    })
}

/// Repeats an array along every axis.
///
/// The result extent on axis `k` is `input.shape()[k] * reps[k]` and every element reads
/// the input at its index modulo the input extents.
///
/// # Errors
///
/// Returns [`ArrayError::InvalidArgument`] if any repetition count is 0.
pub fn tile(backend: &dyn Backend, input: &Array, reps: Dim4) -> Result<Array, ArrayError> {
    let out_shape = scaled_shape("tile", input.shape(), reps)?;
    let dims = input.shape().dims();
    backend.materialize(input.dtype(), out_shape, &[input], &|index| Source::Input {
        input: 0,
        index: std::array::from_fn(|k| index[k] % dims[k]),
    })
}

/// Reorders the axes of an array without copying.
///
/// Axis `k` of the result is axis `perm[k]` of the input.
///
/// # Errors
///
/// Returns [`ArrayError::InvalidArgument`] if `perm` is not a permutation of
/// `[0, 1, 2, 3]`.
pub fn reorder(input: &Array, perm: [usize; MAX_DIMS]) -> Result<Array, ArrayError> {
    input.permute_axes(perm)
}

/// Circularly shifts an array.
///
/// The element at index `idx` of the result is read from
/// `(idx[k] - offsets[k]) mod extent(k)` of the input, so positive offsets move elements
/// toward higher indices. Offsets may be negative or larger than the extent.
///
/// # Errors
///
/// Returns [`ArrayError::ResourceExhausted`] if the result cannot be allocated.
///
/// # Example
///
/// ```
/// use quadra_array::{Array, BackendKind, CpuAllocator, Dim4};
/// use quadra_array_ops::manip::shift;
///
/// let backend = BackendKind::Cpu.build(CpuAllocator::new()).unwrap();
/// let a = Array::from_vec(Dim4::from(4), vec![1u8, 2, 3, 4]).unwrap();
/// let b = shift(backend.as_ref(), &a, [1, 0, 0, 0]).unwrap();
/// assert_eq!(b.to_vec::<u8>().unwrap(), vec![4, 1, 2, 3]);
/// ```
pub fn shift(
    backend: &dyn Backend,
    input: &Array,
    offsets: [i64; MAX_DIMS],
) -> Result<Array, ArrayError> {
    if input.is_empty() {
        return copy(backend, input);
    }

    let dims = input.shape().dims();
    let shifts: [usize; MAX_DIMS] =
        std::array::from_fn(|k| offsets[k].rem_euclid(dims[k] as i64) as usize);

    backend.materialize(input.dtype(), input.shape(), &[input], &|index| Source::Input {
        input: 0,
        index: std::array::from_fn(|k| (index[k] + dims[k] - shifts[k]) % dims[k]),
    })
}

/// Reinterprets the row-major element sequence of an array under a new shape.
///
/// Returns a view when the input is in standard layout; otherwise the input is copied
/// first.
///
/// # Errors
///
/// Returns [`ArrayError::DimensionMismatch`] if the element counts differ.
pub fn moddims(backend: &dyn Backend, input: &Array, shape: Dim4) -> Result<Array, ArrayError> {
    if shape.elements() != input.elements() {
        return Err(ArrayError::dimension_mismatch(
            "moddims requires the same number of elements",
            format!("{} elements", input.elements()),
            format!("{shape} ({} elements)", shape.elements()),
        ));
    }

    if input.is_standard_layout() {
        input.reshape(shape)
    } else {
        copy(backend, input)?.reshape(shape)
    }
}

/// Flattens an array into a column of `elements()` entries.
pub fn flat(backend: &dyn Backend, input: &Array) -> Result<Array, ArrayError> {
    moddims(backend, input, Dim4::from(input.elements()))
}

/// Reverses an array along one axis without copying.
///
/// # Errors
///
/// Returns [`ArrayError::InvalidArgument`] if `dim` is greater than 3.
pub fn flip(input: &Array, dim: usize) -> Result<Array, ArrayError> {
    input.flip_axis(dim)
}
