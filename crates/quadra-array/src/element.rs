use std::fmt::Debug;

use num_complex::{Complex32, Complex64};
use num_traits::{AsPrimitive, One, Zero};

use crate::{dtype::DType, scalar::Scalar, storage::Buffer};

/// A Rust type that can be stored in an array.
///
/// The trait is sealed: it is implemented exactly once for each [`DType`], which keeps
/// the dtype tag of an array and the type of its storage in lockstep.
pub trait Element: Copy + Send + Sync + PartialEq + Debug + 'static + private::Sealed {
    /// The dtype tag of this element type.
    const DTYPE: DType;

    /// The additive identity.
    fn zero() -> Self;

    /// The multiplicative identity.
    fn one() -> Self;

    /// Converts a dynamic value into this element type.
    ///
    /// Floats convert to integers by truncation with saturation, integers convert
    /// between widths by wrapping, any value converts to `bool` as "non-zero", and the
    /// imaginary part is dropped when a complex value lands in a real type.
    fn from_scalar(value: Scalar) -> Self;

    /// Converts the element into a dynamic value.
    fn to_scalar(self) -> Scalar;

    /// Wraps typed data into a dtype-tagged buffer.
    fn into_buffer(data: Vec<Self>) -> Buffer;

    /// Borrows the data of a buffer if it holds this element type.
    fn from_buffer(buffer: &Buffer) -> Option<&[Self]>;
}

mod private {
    pub trait Sealed {}
}

macro_rules! impl_real_element {
    ($ty:ty, $dtype:ident, $variant:ident, $wide:ty) => {
        impl private::Sealed for $ty {}

        impl Element for $ty {
            const DTYPE: DType = DType::$dtype;

            #[inline]
            fn zero() -> Self {
                <$ty as Zero>::zero()
            }

            #[inline]
            fn one() -> Self {
                <$ty as One>::one()
            }

            #[inline]
            fn from_scalar(value: Scalar) -> Self {
                match value {
                    Scalar::Bool(b) => {
                        if b {
                            <$ty as One>::one()
                        } else {
                            <$ty as Zero>::zero()
                        }
                    }
                    Scalar::Int(v) => v.as_(),
                    Scalar::UInt(v) => v.as_(),
                    Scalar::Real(v) => v.as_(),
                    Scalar::Complex(re, _) => re.as_(),
                }
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::$variant(AsPrimitive::<$wide>::as_(self))
            }

            fn into_buffer(data: Vec<Self>) -> Buffer {
                Buffer::$dtype(data)
            }

            fn from_buffer(buffer: &Buffer) -> Option<&[Self]> {
                match buffer {
                    Buffer::$dtype(data) => Some(data),
                    _ => None,
                }
            }
        }
    };
}

impl_real_element!(f32, F32, Real, f64);
impl_real_element!(f64, F64, Real, f64);
impl_real_element!(i32, S32, Int, i64);
impl_real_element!(i64, S64, Int, i64);
impl_real_element!(i16, S16, Int, i64);
impl_real_element!(u32, U32, UInt, u64);
impl_real_element!(u8, U8, UInt, u64);
impl_real_element!(u64, U64, UInt, u64);
impl_real_element!(u16, U16, UInt, u64);

macro_rules! impl_complex_element {
    ($ty:ty, $part:ty, $dtype:ident) => {
        impl private::Sealed for $ty {}

        impl Element for $ty {
            const DTYPE: DType = DType::$dtype;

            #[inline]
            fn zero() -> Self {
                <$ty as Zero>::zero()
            }

            #[inline]
            fn one() -> Self {
                <$ty as One>::one()
            }

            #[inline]
            fn from_scalar(value: Scalar) -> Self {
                match value {
                    Scalar::Complex(re, im) => <$ty>::new(re.as_(), im.as_()),
                    other => <$ty>::new(<$part>::from_scalar(other), 0.0),
                }
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::Complex(self.re.as_(), self.im.as_())
            }

            fn into_buffer(data: Vec<Self>) -> Buffer {
                Buffer::$dtype(data)
            }

            fn from_buffer(buffer: &Buffer) -> Option<&[Self]> {
                match buffer {
                    Buffer::$dtype(data) => Some(data),
                    _ => None,
                }
            }
        }
    };
}

impl_complex_element!(Complex32, f32, C32);
impl_complex_element!(Complex64, f64, C64);

impl private::Sealed for bool {}

impl Element for bool {
    const DTYPE: DType = DType::B8;

    #[inline]
    fn zero() -> Self {
        false
    }

    #[inline]
    fn one() -> Self {
        true
    }

    #[inline]
    fn from_scalar(value: Scalar) -> Self {
        match value {
            Scalar::Bool(b) => b,
            Scalar::Int(v) => v != 0,
            Scalar::UInt(v) => v != 0,
            Scalar::Real(v) => v != 0.0,
            Scalar::Complex(re, im) => re != 0.0 || im != 0.0,
        }
    }

    #[inline]
    fn to_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }

    fn into_buffer(data: Vec<Self>) -> Buffer {
        Buffer::B8(data)
    }

    fn from_buffer(buffer: &Buffer) -> Option<&[Self]> {
        match buffer {
            Buffer::B8(data) => Some(data),
            _ => None,
        }
    }
}
