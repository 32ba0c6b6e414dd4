//! Per-element kernels evaluated by backends.
//!
//! Every operation that produces new storage is expressed as a [`Kernel`]: a function
//! from an output index to the [`Source`] of that element. Backends decide how the
//! output indices are visited; the meaning of each source is shared through
//! [`resolve`].

use crate::{array::Array, dim4::MAX_DIMS, element::Element, error::ArrayError, scalar::Scalar};

/// Where the value of one output element comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    /// A value converted into the output element type.
    Value(Scalar),
    /// The zero of the output element type.
    Zero,
    /// The one of the output element type.
    One,
    /// The element of an input array at the given index.
    Input {
        /// Position of the input in the list handed to the backend.
        input: usize,
        /// Index of the element within that input.
        index: [usize; MAX_DIMS],
    },
}

/// Maps an output index to the source of its element.
///
/// Kernels must be `Sync` so that backends may evaluate them from several threads.
pub type Kernel<'a> = dyn Fn([usize; MAX_DIMS]) -> Source + Sync + 'a;

/// Borrows the storage of every input as elements of type `T`.
///
/// # Errors
///
/// Returns [`ArrayError::UnsupportedType`] if any input does not hold elements of type
/// `T`.
pub fn typed_inputs<'a, T: Element>(inputs: &[&'a Array]) -> Result<Vec<&'a [T]>, ArrayError> {
    inputs
        .iter()
        .map(|array| {
            array.storage().as_slice::<T>().ok_or_else(|| {
                ArrayError::unsupported_type(
                    "materialize",
                    array.dtype(),
                    format!("inputs must match the output type {}", T::DTYPE),
                )
            })
        })
        .collect()
}

/// Resolves a source into an element of type `T`.
///
/// `data` holds the typed storage of `inputs`, as returned by [`typed_inputs`].
///
/// # Errors
///
/// Returns [`ArrayError::InvalidArgument`] if the source names an input that does not
/// exist or an index outside of that input.
pub fn resolve<T: Element>(
    source: Source,
    data: &[&[T]],
    inputs: &[&Array],
) -> Result<T, ArrayError> {
    match source {
        Source::Value(value) => Ok(T::from_scalar(value)),
        Source::Zero => Ok(T::zero()),
        Source::One => Ok(T::one()),
        Source::Input { input, index } => {
            let (array, data) = inputs.get(input).zip(data.get(input)).ok_or_else(|| {
                ArrayError::invalid_argument(
                    "materialize",
                    format!("kernel reads input {input} of {}", inputs.len()),
                )
            })?;
            if !array.shape().contains(index) {
                return Err(ArrayError::invalid_argument(
                    "materialize",
                    format!("kernel reads {index:?} outside input of shape {}", array.shape()),
                ));
            }
            data.get(array.storage_offset(index))
                .copied()
                .ok_or_else(|| ArrayError::invalid_argument("materialize", "corrupt array view"))
        }
    }
}
