use std::fmt;
use std::ops::Index;

use crate::error::ArrayError;

/// The number of axes carried by every array.
pub const MAX_DIMS: usize = 4;

/// The shape of an array: exactly four non-negative extents.
///
/// Extents that are not given explicitly default to 1, so `Dim4::from(5)` is the
/// shape `[5, 1, 1, 1]`. A shape with any extent equal to 0 describes an empty array.
///
/// The logical element order of every array is row-major: the last axis varies
/// fastest. [`Dim4::strides`], [`Dim4::ravel`] and [`Dim4::unravel`] all follow it.
///
/// # Examples
///
/// ```
/// use quadra_array::Dim4;
///
/// let shape = Dim4::from([2, 3]);
/// assert_eq!(shape.dims(), [2, 3, 1, 1]);
/// assert_eq!(shape.elements(), 6);
/// assert_eq!(shape.ndims(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dim4 {
    dims: [usize; MAX_DIMS],
}

impl Dim4 {
    /// Creates a shape from all four extents.
    pub const fn new(dims: [usize; MAX_DIMS]) -> Self {
        Self { dims }
    }

    /// Creates a shape from a raw list of signed extents.
    ///
    /// This is the `(ndims, extents)` form used at the handle boundary. Missing trailing
    /// extents default to 1.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::InvalidArgument`] if the list is empty, holds more than
    /// [`MAX_DIMS`] extents, or holds a negative extent.
    ///
    /// # Examples
    ///
    /// ```
    /// use quadra_array::Dim4;
    ///
    /// let shape = Dim4::from_dims(&[4, 2]).unwrap();
    /// assert_eq!(shape, Dim4::from([4, 2]));
    /// assert!(Dim4::from_dims(&[4, -2]).is_err());
    /// ```
    pub fn from_dims(dims: &[i64]) -> Result<Self, ArrayError> {
        if dims.is_empty() || dims.len() > MAX_DIMS {
            return Err(ArrayError::invalid_argument(
                "dim4",
                format!("expected 1 to {MAX_DIMS} extents, got {}", dims.len()),
            ));
        }

        let mut out = [1; MAX_DIMS];
        for (axis, &extent) in dims.iter().enumerate() {
            out[axis] = usize::try_from(extent).map_err(|_| {
                ArrayError::invalid_argument(
                    "dim4",
                    format!("extent {extent} on axis {axis} is negative"),
                )
            })?;
        }

        Ok(Self { dims: out })
    }

    /// Returns the four extents.
    #[inline]
    pub fn dims(&self) -> [usize; MAX_DIMS] {
        self.dims
    }

    /// Returns the number of elements, saturating at `usize::MAX`.
    #[inline]
    pub fn elements(&self) -> usize {
        self.dims.iter().fold(1usize, |acc, &d| acc.saturating_mul(d))
    }

    /// Returns true if any extent is 0.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.contains(&0)
    }

    /// Returns the number of meaningful axes.
    ///
    /// Trailing extents of 1 are not counted, except that a shape of all ones still
    /// reports one axis.
    pub fn ndims(&self) -> usize {
        self.dims
            .iter()
            .rposition(|&d| d != 1)
            .map_or(1, |axis| axis + 1)
    }

    /// Returns the row-major strides of the shape, in elements.
    ///
    /// Strides saturate instead of overflowing, which only happens for empty shapes
    /// whose other extents multiply past `usize::MAX`.
    pub fn strides(&self) -> [usize; MAX_DIMS] {
        let mut strides = [0; MAX_DIMS];
        let mut stride: usize = 1;
        for axis in (0..MAX_DIMS).rev() {
            strides[axis] = stride;
            stride = stride.saturating_mul(self.dims[axis]);
        }
        strides
    }

    /// Converts a multi-index into its row-major linear position.
    pub fn ravel(&self, index: [usize; MAX_DIMS]) -> usize {
        index
            .iter()
            .zip(self.strides())
            .map(|(&i, stride)| i * stride)
            .sum()
    }

    /// Converts a row-major linear position into its multi-index.
    ///
    /// The reverse of [`Dim4::ravel`].
    pub fn unravel(&self, linear: usize) -> [usize; MAX_DIMS] {
        let mut index = [0; MAX_DIMS];
        let mut rem = linear;
        for axis in (0..MAX_DIMS).rev() {
            let extent = self.dims[axis];
            if extent > 0 {
                index[axis] = rem % extent;
                rem /= extent;
            }
        }
        index
    }

    /// Returns true if `index` addresses an element of this shape.
    pub fn contains(&self, index: [usize; MAX_DIMS]) -> bool {
        index.iter().zip(self.dims).all(|(&i, d)| i < d)
    }

    /// Returns a copy of the shape with the extent on `axis` replaced.
    pub fn with_extent(mut self, axis: usize, extent: usize) -> Self {
        self.dims[axis] = extent;
        self
    }
}

impl Default for Dim4 {
    fn default() -> Self {
        Self::new([1; MAX_DIMS])
    }
}

impl Index<usize> for Dim4 {
    type Output = usize;

    fn index(&self, axis: usize) -> &Self::Output {
        &self.dims[axis]
    }
}

impl fmt::Display for Dim4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [d0, d1, d2, d3] = self.dims;
        write!(f, "[{d0}, {d1}, {d2}, {d3}]")
    }
}

impl From<usize> for Dim4 {
    fn from(d0: usize) -> Self {
        Self::new([d0, 1, 1, 1])
    }
}

impl From<(usize, usize)> for Dim4 {
    fn from((d0, d1): (usize, usize)) -> Self {
        Self::new([d0, d1, 1, 1])
    }
}

impl From<(usize, usize, usize)> for Dim4 {
    fn from((d0, d1, d2): (usize, usize, usize)) -> Self {
        Self::new([d0, d1, d2, 1])
    }
}

impl From<(usize, usize, usize, usize)> for Dim4 {
    fn from((d0, d1, d2, d3): (usize, usize, usize, usize)) -> Self {
        Self::new([d0, d1, d2, d3])
    }
}

macro_rules! impl_from_array {
    ($($n:literal),*) => {
        $(
            impl From<[usize; $n]> for Dim4 {
                fn from(dims: [usize; $n]) -> Self {
                    let mut out = [1; MAX_DIMS];
                    out[..$n].copy_from_slice(&dims);
                    Self::new(out)
                }
            }
        )*
    };
}

impl_from_array!(1, 2, 3);

impl From<[usize; MAX_DIMS]> for Dim4 {
    fn from(dims: [usize; MAX_DIMS]) -> Self {
        Self::new(dims)
    }
}
