use quadra_array::{Array, ArrayError, Backend, DType, Dim4, Scalar, Source, MAX_DIMS};

/// Creates an array with every element set to `value`.
///
/// The value is converted to `dtype`: floats truncate toward zero (saturating) into
/// integer types, any non-zero value becomes `true` for [`DType::B8`], and complex
/// values drop their imaginary part in real types.
///
/// # Arguments
///
/// * `backend` - The backend that materializes the result.
/// * `value` - The fill value.
/// * `shape` - The shape of the result. A zero extent produces an empty array.
/// * `dtype` - The element type of the result.
///
/// # Errors
///
/// Returns [`ArrayError::ResourceExhausted`] if the result cannot be allocated.
///
/// # Example
///
/// ```
/// use quadra_array::{BackendKind, CpuAllocator, DType, Dim4, Scalar};
/// use quadra_array_ops::generate::constant;
///
/// let backend = BackendKind::Cpu.build(CpuAllocator::new()).unwrap();
/// let a = constant(backend.as_ref(), Scalar::Real(2.5), Dim4::from((2, 2)), DType::S32).unwrap();
/// assert_eq!(a.to_vec::<i32>().unwrap(), vec![2; 4]);
/// ```
pub fn constant(
    backend: &dyn Backend,
    value: Scalar,
    shape: Dim4,
    dtype: DType,
) -> Result<Array, ArrayError> {
    backend.materialize(dtype, shape, &[], &|_| Source::Value(value))
}

/// Creates a complex array with every element set to `real + imag·i`.
///
/// # Errors
///
/// Returns [`ArrayError::UnsupportedType`] unless `dtype` is [`DType::C32`] or
/// [`DType::C64`].
pub fn constant_complex(
    backend: &dyn Backend,
    real: f64,
    imag: f64,
    shape: Dim4,
    dtype: DType,
) -> Result<Array, ArrayError> {
    if !dtype.is_complex() {
        return Err(ArrayError::unsupported_type(
            "constant_complex",
            dtype,
            "complex constants require a complex type",
        ));
    }
    constant(backend, Scalar::Complex(real, imag), shape, dtype)
}

/// Creates a [`DType::S64`] array filled with `value`, exactly.
pub fn constant_i64(backend: &dyn Backend, value: i64, shape: Dim4) -> Result<Array, ArrayError> {
    constant(backend, Scalar::Int(value), shape, DType::S64)
}

/// Creates a [`DType::U64`] array filled with `value`, exactly.
pub fn constant_u64(backend: &dyn Backend, value: u64, shape: Dim4) -> Result<Array, ArrayError> {
    constant(backend, Scalar::UInt(value), shape, DType::U64)
}

/// Creates a batch of identity matrices.
///
/// Every 2D slice over the first two axes holds 1 where the row index equals the
/// column index and 0 elsewhere. Non-square slices get `min(d0, d1)` ones.
///
/// # Errors
///
/// Returns [`ArrayError::ResourceExhausted`] if the result cannot be allocated.
pub fn identity(backend: &dyn Backend, shape: Dim4, dtype: DType) -> Result<Array, ArrayError> {
    backend.materialize(dtype, shape, &[], &|[i, j, _, _]| {
        if i == j {
            Source::One
        } else {
            Source::Zero
        }
    })
}

fn check_index_type(operation: &str, dtype: DType) -> Result<(), ArrayError> {
    if dtype.is_complex() || dtype.is_bool() {
        return Err(ArrayError::unsupported_type(
            operation,
            dtype,
            "index sequences require a real numeric type",
        ));
    }
    Ok(())
}

/// Creates an array whose elements equal their index along one axis.
///
/// # Arguments
///
/// * `backend` - The backend that materializes the result.
/// * `shape` - The shape of the result.
/// * `seq_dim` - The axis that counts, in `[0, 3]`, or `-1` for the first axis with an
///   extent above 1 (axis 0 if there is none).
/// * `dtype` - The element type of the result.
///
/// # Errors
///
/// Returns [`ArrayError::InvalidArgument`] if `seq_dim` is neither `-1` nor in `[0, 3]`,
/// and [`ArrayError::UnsupportedType`] for complex and boolean types.
///
/// # Example
///
/// ```
/// use quadra_array::{BackendKind, CpuAllocator, DType, Dim4};
/// use quadra_array_ops::generate::range;
///
/// let backend = BackendKind::Cpu.build(CpuAllocator::new()).unwrap();
/// let a = range(backend.as_ref(), Dim4::from((2, 3)), 1, DType::U8).unwrap();
/// assert_eq!(a.to_vec::<u8>().unwrap(), vec![0, 1, 2, 0, 1, 2]);
/// ```
pub fn range(
    backend: &dyn Backend,
    shape: Dim4,
    seq_dim: i32,
    dtype: DType,
) -> Result<Array, ArrayError> {
    let axis = match seq_dim {
        -1 => shape.dims().iter().position(|&d| d > 1).unwrap_or(0),
        0..=3 => seq_dim as usize,
        _ => {
            return Err(ArrayError::invalid_argument(
                "range",
                format!("seq_dim {seq_dim} is neither -1 nor in [0, 3]"),
            ))
        }
    };
    check_index_type("range", dtype)?;

    backend.materialize(dtype, shape, &[], &|index| {
        Source::Value(Scalar::UInt(index[axis] as u64))
    })
}

/// Returns the elementwise product of two shapes.
pub(crate) fn scaled_shape(
    operation: &str,
    shape: Dim4,
    reps: Dim4,
) -> Result<Dim4, ArrayError> {
    if reps.is_empty() {
        return Err(ArrayError::invalid_argument(
            operation,
            format!("repetitions {reps} must be at least 1 on every axis"),
        ));
    }

    let mut dims = [0; MAX_DIMS];
    for (axis, dim) in dims.iter_mut().enumerate() {
        *dim = shape[axis].checked_mul(reps[axis]).ok_or_else(|| {
            ArrayError::invalid_argument(
                operation,
                format!("{shape} repeated {reps} overflows axis {axis}"),
            )
        })?;
    }
    Ok(Dim4::new(dims))
}

/// Creates a tiled sequence of linear indices.
///
/// The numbers `0..shape.elements()` are laid out in `shape` in row-major order and the
/// block is repeated `tile_dims[k]` times along every axis `k`.
///
/// # Errors
///
/// Returns [`ArrayError::InvalidArgument`] if any extent of `tile_dims` is 0, and
/// [`ArrayError::UnsupportedType`] for complex and boolean types.
///
/// # Example
///
/// ```
/// use quadra_array::{BackendKind, CpuAllocator, DType, Dim4};
/// use quadra_array_ops::generate::iota;
///
/// let backend = BackendKind::Cpu.build(CpuAllocator::new()).unwrap();
/// let a = iota(backend.as_ref(), Dim4::from((1, 3)), Dim4::from((2, 1)), DType::S32).unwrap();
/// assert_eq!(a.shape(), Dim4::from((2, 3)));
/// assert_eq!(a.to_vec::<i32>().unwrap(), vec![0, 1, 2, 0, 1, 2]);
/// ```
pub fn iota(
    backend: &dyn Backend,
    shape: Dim4,
    tile_dims: Dim4,
    dtype: DType,
) -> Result<Array, ArrayError> {
    let out_shape = scaled_shape("iota", shape, tile_dims)?;
    check_index_type("iota", dtype)?;

    let dims = shape.dims();
    backend.materialize(dtype, out_shape, &[], &|index| {
        let block = std::array::from_fn(|axis| index[axis] % dims[axis]);
        Source::Value(Scalar::UInt(shape.ravel(block) as u64))
    })
}
