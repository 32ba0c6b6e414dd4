use quadra_array::{Array, ArrayError, Backend, Dim4, Source};

/// Extracts the `num`-th diagonal of every 2D slice.
///
/// Positive `num` selects a diagonal above the main one, negative `num` one below.
/// Element `i` of the result is `input[i + max(-num, 0), i + max(num, 0)]`, and the
/// result has shape `(len, 1, d2, d3)` with
/// `len = min(d0 - max(-num, 0), d1 - max(num, 0))`, or 0 when the diagonal lies
/// outside the matrix.
///
/// # Errors
///
/// Returns [`ArrayError::ResourceExhausted`] if the result cannot be allocated.
///
/// # Example
///
/// ```
/// use quadra_array::{Array, BackendKind, CpuAllocator, Dim4};
/// use quadra_array_ops::matrix::diag_extract;
///
/// let backend = BackendKind::Cpu.build(CpuAllocator::new()).unwrap();
/// let m = Array::from_vec(Dim4::from((3, 3)), (1..=9).collect::<Vec<i32>>()).unwrap();
/// let d = diag_extract(backend.as_ref(), &m, 1).unwrap();
/// assert_eq!(d.to_vec::<i32>().unwrap(), vec![2, 6]);
/// ```
pub fn diag_extract(backend: &dyn Backend, input: &Array, num: i32) -> Result<Array, ArrayError> {
    let [d0, d1, d2, d3] = input.shape().dims();
    let row_offset = usize::try_from(-i64::from(num)).unwrap_or(0);
    let col_offset = usize::try_from(num).unwrap_or(0);
    let len = d0
        .saturating_sub(row_offset)
        .min(d1.saturating_sub(col_offset));

    backend.materialize(
        input.dtype(),
        Dim4::new([len, 1, d2, d3]),
        &[input],
        &|[i, _, k, l]| Source::Input {
            input: 0,
            index: [i + row_offset, i + col_offset, k, l],
        },
    )
}

/// Creates a square matrix with a vector on its `num`-th diagonal.
///
/// The result has `n + |num|` rows and columns, where `n` is the length of `input`, and
/// is 0 off the selected diagonal.
///
/// # Errors
///
/// Returns [`ArrayError::InvalidArgument`] if `input` is not a vector
/// (`ndims() != 1`).
pub fn diag_create(backend: &dyn Backend, input: &Array, num: i32) -> Result<Array, ArrayError> {
    if input.ndims() != 1 {
        return Err(ArrayError::invalid_argument(
            "diag",
            format!("expected a vector, got shape {}", input.shape()),
        ));
    }

    let num = i64::from(num);
    let size = input.shape()[0] + num.unsigned_abs() as usize;

    backend.materialize(
        input.dtype(),
        Dim4::from((size, size)),
        &[input],
        &|[r, c, _, _]| {
            if c as i64 - r as i64 != num {
                return Source::Zero;
            }
            let i = if num >= 0 { r } else { c };
            Source::Input {
                input: 0,
                index: [i, 0, 0, 0],
            }
        },
    )
}

/// Creates (`extract == false`) or extracts (`extract == true`) a diagonal.
///
/// See [`diag_create`] and [`diag_extract`].
pub fn diag(
    backend: &dyn Backend,
    input: &Array,
    num: i32,
    extract: bool,
) -> Result<Array, ArrayError> {
    if extract {
        diag_extract(backend, input, num)
    } else {
        diag_create(backend, input, num)
    }
}

#[derive(Clone, Copy)]
enum Triangle {
    Lower,
    Upper,
}

fn triangle(
    backend: &dyn Backend,
    input: &Array,
    part: Triangle,
    unit_diag: bool,
) -> Result<Array, ArrayError> {
    if input.ndims() < 2 {
        let operation = match part {
            Triangle::Lower => "lower",
            Triangle::Upper => "upper",
        };
        return Err(ArrayError::invalid_argument(
            operation,
            format!("expected a matrix, got shape {}", input.shape()),
        ));
    }

    backend.materialize(input.dtype(), input.shape(), &[input], &|index| {
        let [i, j, _, _] = index;
        let outside = match part {
            Triangle::Lower => j > i,
            Triangle::Upper => j < i,
        };
        if outside {
            Source::Zero
        } else if unit_diag && i == j {
            Source::One
        } else {
            Source::Input { input: 0, index }
        }
    })
}

/// Keeps the lower triangle of every 2D slice and zeroes the rest.
///
/// With `unit_diag` the main diagonal is set to 1.
///
/// # Errors
///
/// Returns [`ArrayError::InvalidArgument`] if `input` has fewer than two dimensions.
///
/// # Example
///
/// ```
/// use quadra_array::{Array, BackendKind, CpuAllocator, Dim4};
/// use quadra_array_ops::matrix::lower;
///
/// let backend = BackendKind::Cpu.build(CpuAllocator::new()).unwrap();
/// let m = Array::from_vec(Dim4::from((2, 2)), vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
/// let l = lower(backend.as_ref(), &m, true).unwrap();
/// assert_eq!(l.to_vec::<f32>().unwrap(), vec![1.0, 0.0, 3.0, 1.0]);
/// ```
pub fn lower(backend: &dyn Backend, input: &Array, unit_diag: bool) -> Result<Array, ArrayError> {
    triangle(backend, input, Triangle::Lower, unit_diag)
}

/// Keeps the upper triangle of every 2D slice and zeroes the rest.
///
/// With `unit_diag` the main diagonal is set to 1.
///
/// # Errors
///
/// Returns [`ArrayError::InvalidArgument`] if `input` has fewer than two dimensions.
pub fn upper(backend: &dyn Backend, input: &Array, unit_diag: bool) -> Result<Array, ArrayError> {
    triangle(backend, input, Triangle::Upper, unit_diag)
}
