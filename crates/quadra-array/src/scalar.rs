use num_complex::{Complex32, Complex64};

/// A dynamically typed element value.
///
/// Scalars carry constants and generated samples into typed storage. Integer values keep
/// their own variants so that 64-bit constants never pass through a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// A boolean value.
    Bool(bool),
    /// A signed integer value.
    Int(i64),
    /// An unsigned integer value.
    UInt(u64),
    /// A real floating point value.
    Real(f64),
    /// A complex value as `(real, imaginary)`.
    Complex(f64, f64),
}

impl Scalar {
    /// Returns true if the value is complex.
    pub fn is_complex(&self) -> bool {
        matches!(self, Scalar::Complex(..))
    }

    /// Returns the real part of the value as `f64`.
    pub fn real(&self) -> f64 {
        match *self {
            Scalar::Bool(b) => f64::from(u8::from(b)),
            Scalar::Int(v) => v as f64,
            Scalar::UInt(v) => v as f64,
            Scalar::Real(v) => v,
            Scalar::Complex(re, _) => re,
        }
    }

    /// Returns the imaginary part of the value, 0 for non-complex values.
    pub fn imag(&self) -> f64 {
        match *self {
            Scalar::Complex(_, im) => im,
            _ => 0.0,
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

macro_rules! impl_from_primitive {
    ($variant:ident, $wide:ty, $($ty:ty),*) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(<$wide>::from(value))
                }
            }
        )*
    };
}

impl_from_primitive!(Int, i64, i8, i16, i32, i64);
impl_from_primitive!(UInt, u64, u8, u16, u32, u64);
impl_from_primitive!(Real, f64, f32, f64);

impl From<Complex32> for Scalar {
    fn from(value: Complex32) -> Self {
        Scalar::Complex(f64::from(value.re), f64::from(value.im))
    }
}

impl From<Complex64> for Scalar {
    fn from(value: Complex64) -> Self {
        Scalar::Complex(value.re, value.im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_conversions_pick_the_widest_variant() {
        assert_eq!(Scalar::from(-3i16), Scalar::Int(-3));
        assert_eq!(Scalar::from(7u8), Scalar::UInt(7));
        assert_eq!(Scalar::from(0.5f32), Scalar::Real(0.5));
        assert_eq!(Scalar::from(true), Scalar::Bool(true));
        assert_eq!(
            Scalar::from(Complex32::new(1.0, -2.0)),
            Scalar::Complex(1.0, -2.0)
        );
    }

    #[test]
    fn real_and_imag_parts() {
        assert_eq!(Scalar::Complex(1.5, 2.5).real(), 1.5);
        assert_eq!(Scalar::Complex(1.5, 2.5).imag(), 2.5);
        assert_eq!(Scalar::Int(-4).real(), -4.0);
        assert_eq!(Scalar::Bool(true).real(), 1.0);
        assert_eq!(Scalar::Real(3.0).imag(), 0.0);
        assert!(!Scalar::UInt(1).is_complex());
    }
}
