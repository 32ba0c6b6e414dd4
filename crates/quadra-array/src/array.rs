use std::fmt;

use crate::{
    dim4::{Dim4, MAX_DIMS},
    dtype::DType,
    element::Element,
    error::ArrayError,
    storage::ArrayStorage,
};

/// An immutable, dtype-tagged array of up to four dimensions.
///
/// An array is a window over shared storage: a shape, a stride per axis (in elements,
/// possibly negative) and the storage position of the element at index `[0, 0, 0, 0]`.
/// Views such as [`Array::permute_axes`] and [`Array::flip_axis`] produce new arrays over
/// the same storage without copying, so cloning and viewing are both O(1).
///
/// Elements are addressed by a four-component index and enumerated in row-major order
/// (the last axis varies fastest) by [`Array::to_vec`].
///
/// # Examples
///
/// ```
/// use quadra_array::{Array, Dim4};
///
/// let a = Array::from_vec(Dim4::from((2, 3)), vec![1i32, 2, 3, 4, 5, 6]).unwrap();
/// assert_eq!(a.get::<i32>([1, 2, 0, 0]), Some(6));
///
/// let t = a.permute_axes([1, 0, 2, 3]).unwrap();
/// assert_eq!(t.shape(), Dim4::from((3, 2)));
/// assert_eq!(t.to_vec::<i32>().unwrap(), vec![1, 4, 2, 5, 3, 6]);
/// assert!(t.shares_storage(&a));
/// ```
#[derive(Clone)]
pub struct Array {
    storage: ArrayStorage,
    shape: Dim4,
    strides: [isize; MAX_DIMS],
    offset: usize,
}

impl Array {
    /// Creates an array that owns `data`, laid out in row-major order.
    ///
    /// # Arguments
    ///
    /// * `shape` - The shape of the array.
    /// * `data` - The elements in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::DimensionMismatch`] if the length of `data` differs from the
    /// number of elements of `shape`.
    pub fn from_vec<T: Element>(shape: impl Into<Dim4>, data: Vec<T>) -> Result<Self, ArrayError> {
        let shape = shape.into();
        if data.len() != shape.elements() {
            return Err(ArrayError::dimension_mismatch(
                "data length does not match the shape",
                format!("{shape} ({} elements)", shape.elements()),
                format!("{} elements", data.len()),
            ));
        }

        Ok(Self::standard(ArrayStorage::from_vec(data), shape))
    }

    /// Creates an array by copying `data`, laid out in row-major order.
    ///
    /// # Errors
    ///
    /// Same as [`Array::from_vec`].
    pub fn from_slice<T: Element>(shape: impl Into<Dim4>, data: &[T]) -> Result<Self, ArrayError> {
        Self::from_vec(shape, data.to_vec())
    }

    fn standard(storage: ArrayStorage, shape: Dim4) -> Self {
        Self {
            storage,
            shape,
            strides: signed_strides(shape),
            offset: 0,
        }
    }

    /// Returns the shape of the array.
    #[inline]
    pub fn shape(&self) -> Dim4 {
        self.shape
    }

    /// Returns the element type of the array.
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Returns the number of elements.
    #[inline]
    pub fn elements(&self) -> usize {
        self.shape.elements()
    }

    /// Returns the number of meaningful axes, see [`Dim4::ndims`].
    #[inline]
    pub fn ndims(&self) -> usize {
        self.shape.ndims()
    }

    /// Returns true if the array holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Returns the stride of each axis, in elements.
    #[inline]
    pub fn strides(&self) -> [isize; MAX_DIMS] {
        self.strides
    }

    /// Returns the storage position of the first element.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the storage backing the array.
    #[inline]
    pub fn storage(&self) -> &ArrayStorage {
        &self.storage
    }

    /// Returns true if both arrays are windows over the same storage.
    pub fn shares_storage(&self, other: &Array) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    /// Returns true if the elements occupy a contiguous row-major run of the storage.
    ///
    /// Axes of extent 1 are ignored since their stride is never used. Empty arrays are
    /// always standard.
    pub fn is_standard_layout(&self) -> bool {
        if self.is_empty() {
            return true;
        }

        let mut expected_stride: isize = 1;
        for axis in (0..MAX_DIMS).rev() {
            let dim = self.shape[axis];
            if dim == 1 {
                continue;
            }
            if self.strides[axis] != expected_stride {
                return false;
            }
            expected_stride = expected_stride.saturating_mul(dim as isize);
        }
        true
    }

    /// Returns the storage position of the element at `index`.
    ///
    /// The index must address an element of the array.
    pub fn storage_offset(&self, index: [usize; MAX_DIMS]) -> usize {
        let delta: isize = index
            .iter()
            .zip(self.strides)
            .map(|(&i, stride)| i as isize * stride)
            .sum();
        (self.offset as isize + delta) as usize
    }

    /// Returns the element at `index`.
    ///
    /// Returns `None` if the index is out of bounds or `T` is not the element type.
    pub fn get<T: Element>(&self, index: [usize; MAX_DIMS]) -> Option<T> {
        if !self.shape.contains(index) {
            return None;
        }
        let data = self.storage.as_slice::<T>()?;
        data.get(self.storage_offset(index)).copied()
    }

    /// Returns the elements as a row-major slice without copying.
    ///
    /// Returns `None` if `T` is not the element type or the array is not in standard
    /// layout.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        if !self.is_standard_layout() {
            return None;
        }
        let data = self.storage.as_slice::<T>()?;
        if self.is_empty() {
            return Some(&[]);
        }
        data.get(self.offset..self.offset + self.elements())
    }

    /// Copies the elements out in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::UnsupportedType`] if `T` is not the element type.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, ArrayError> {
        let data = self.storage.as_slice::<T>().ok_or_else(|| {
            ArrayError::unsupported_type(
                "to_vec",
                self.dtype(),
                format!("requested elements of type {}", T::DTYPE),
            )
        })?;

        if let Some(slice) = self.as_slice::<T>() {
            return Ok(slice.to_vec());
        }

        Ok((0..self.elements())
            .map(|linear| data[self.storage_offset(self.shape.unravel(linear))])
            .collect())
    }

    /// Reorders the axes of the array without copying.
    ///
    /// Axis `i` of the result is axis `axes[i]` of `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if `axes` is not a permutation of
    /// `[0, 1, 2, 3]`.
    pub fn permute_axes(&self, axes: [usize; MAX_DIMS]) -> Result<Array, ArrayError> {
        let mut seen = [false; MAX_DIMS];
        for &axis in &axes {
            if axis >= MAX_DIMS || seen[axis] {
                return Err(ArrayError::invalid_argument(
                    "reorder",
                    format!("{axes:?} is not a permutation of the four axes"),
                ));
            }
            seen[axis] = true;
        }

        let mut dims = [0; MAX_DIMS];
        let mut strides = [0; MAX_DIMS];
        for (i, &axis) in axes.iter().enumerate() {
            dims[i] = self.shape[axis];
            strides[i] = self.strides[axis];
        }

        Ok(Array {
            storage: self.storage.clone(),
            shape: Dim4::new(dims),
            strides,
            offset: self.offset,
        })
    }

    /// Reverses the order of elements along `axis` without copying.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if `axis` is greater than 3.
    pub fn flip_axis(&self, axis: usize) -> Result<Array, ArrayError> {
        if axis >= MAX_DIMS {
            return Err(ArrayError::invalid_argument(
                "flip",
                format!("axis {axis} is outside [0, 3]"),
            ));
        }

        let mut flipped = self.clone();
        let extent = self.shape[axis];
        if extent > 1 && !self.is_empty() {
            let stride = self.strides[axis];
            flipped.offset = (self.offset as isize + (extent as isize - 1) * stride) as usize;
            flipped.strides[axis] = -stride;
        }
        Ok(flipped)
    }

    /// Reinterprets the elements with a new shape without copying.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::DimensionMismatch`] if the element counts differ, and
    /// [`ArrayError::InvalidArgument`] if the array is not in standard layout. Copy the
    /// array first to reshape a view.
    pub fn reshape(&self, shape: impl Into<Dim4>) -> Result<Array, ArrayError> {
        let shape = shape.into();
        if shape.elements() != self.elements() {
            return Err(ArrayError::dimension_mismatch(
                "reshape requires the same number of elements",
                format!("{} elements", self.elements()),
                format!("{shape} ({} elements)", shape.elements()),
            ));
        }
        if !self.is_standard_layout() {
            return Err(ArrayError::invalid_argument(
                "reshape",
                "the array is not in standard layout",
            ));
        }

        Ok(Array {
            storage: self.storage.clone(),
            shape,
            strides: signed_strides(shape),
            offset: self.offset,
        })
    }
}

// only empty shapes have strides beyond isize::MAX, and those are never dereferenced
fn signed_strides(shape: Dim4) -> [isize; MAX_DIMS] {
    shape.strides().map(|s| isize::try_from(s).unwrap_or(isize::MAX))
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("dtype", &self.dtype())
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .finish()
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Array<{}>{}", self.dtype(), self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iota(shape: impl Into<Dim4>) -> Result<Array, ArrayError> {
        let shape = shape.into();
        Array::from_vec(shape, (0..shape.elements() as i32).collect())
    }

    #[test]
    fn from_vec_checks_the_length() -> Result<(), ArrayError> {
        let a = Array::from_vec(Dim4::from((2, 2)), vec![1.0f32, 2.0, 3.0, 4.0])?;
        assert_eq!(a.dtype(), DType::F32);
        assert_eq!(a.elements(), 4);
        assert_eq!(a.ndims(), 2);
        assert!(a.is_standard_layout());

        let err = Array::from_vec(Dim4::from(3), vec![1u8]).unwrap_err();
        assert!(matches!(err, ArrayError::DimensionMismatch { .. }));
        Ok(())
    }

    #[test]
    fn empty_arrays_are_valid() -> Result<(), ArrayError> {
        let a = Array::from_vec(Dim4::new([0, 3, 1, 1]), Vec::<u16>::new())?;
        assert!(a.is_empty());
        assert_eq!(a.to_vec::<u16>()?, Vec::<u16>::new());
        assert_eq!(a.as_slice::<u16>(), Some(&[][..]));
        Ok(())
    }

    #[test]
    fn get_checks_bounds_and_type() -> Result<(), ArrayError> {
        let a = iota((2, 3))?;
        assert_eq!(a.get::<i32>([1, 0, 0, 0]), Some(3));
        assert_eq!(a.get::<i32>([2, 0, 0, 0]), None);
        assert_eq!(a.get::<f32>([0, 0, 0, 0]), None);
        Ok(())
    }

    #[test]
    fn to_vec_checks_the_type() -> Result<(), ArrayError> {
        let a = iota(4)?;
        assert!(matches!(
            a.to_vec::<u32>(),
            Err(ArrayError::UnsupportedType { .. })
        ));
        Ok(())
    }

    #[test]
    fn permute_is_a_view() -> Result<(), ArrayError> {
        let a = iota([2, 3, 4])?;
        let p = a.permute_axes([2, 0, 1, 3])?;
        assert_eq!(p.shape(), Dim4::from([4, 2, 3]));
        assert!(p.shares_storage(&a));
        assert!(!p.is_standard_layout());
        assert_eq!(p.get::<i32>([3, 1, 2, 0]), a.get::<i32>([1, 2, 3, 0]));

        let back = p.permute_axes([1, 2, 0, 3])?;
        assert_eq!(back.to_vec::<i32>()?, a.to_vec::<i32>()?);
        Ok(())
    }

    #[test]
    fn permute_rejects_non_bijections() -> Result<(), ArrayError> {
        let a = iota(4)?;
        assert!(a.permute_axes([0, 0, 1, 2]).is_err());
        assert!(a.permute_axes([0, 1, 2, 4]).is_err());
        Ok(())
    }

    #[test]
    fn flip_uses_a_negative_stride() -> Result<(), ArrayError> {
        let a = iota((2, 3))?;
        let f = a.flip_axis(1)?;
        assert!(f.shares_storage(&a));
        assert_eq!(f.strides()[1], -1);
        assert_eq!(f.to_vec::<i32>()?, vec![2, 1, 0, 5, 4, 3]);

        let ff = f.flip_axis(1)?;
        assert_eq!(ff.to_vec::<i32>()?, a.to_vec::<i32>()?);
        assert!(ff.is_standard_layout());

        assert!(a.flip_axis(4).is_err());
        Ok(())
    }

    #[test]
    fn reshape_requires_standard_layout() -> Result<(), ArrayError> {
        let a = iota((2, 3))?;
        let r = a.reshape(6)?;
        assert!(r.shares_storage(&a));
        assert_eq!(r.to_vec::<i32>()?, a.to_vec::<i32>()?);

        assert!(matches!(
            a.reshape(5),
            Err(ArrayError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            a.permute_axes([1, 0, 2, 3])?.reshape(6),
            Err(ArrayError::InvalidArgument { .. })
        ));
        Ok(())
    }

    #[test]
    fn unit_axes_do_not_break_standard_layout() -> Result<(), ArrayError> {
        let a = iota((1, 5))?;
        let p = a.permute_axes([1, 0, 2, 3])?;
        assert!(p.is_standard_layout());
        assert_eq!(p.as_slice::<i32>(), Some(&[0, 1, 2, 3, 4][..]));
        Ok(())
    }
}
