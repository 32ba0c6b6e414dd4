use std::fmt;

use serde::{Deserialize, Serialize};

/// The element type tag attached to every array.
///
/// Generation operators take a `DType` and produce elements with the matching
/// representation. The default tag is [`DType::F32`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit floating point.
    #[default]
    F32,
    /// Complex number with 32-bit floating point parts.
    C32,
    /// 64-bit floating point.
    F64,
    /// Complex number with 64-bit floating point parts.
    C64,
    /// Boolean.
    B8,
    /// 32-bit signed integer.
    S32,
    /// 32-bit unsigned integer.
    U32,
    /// 8-bit unsigned integer.
    U8,
    /// 64-bit signed integer.
    S64,
    /// 64-bit unsigned integer.
    U64,
    /// 16-bit signed integer.
    S16,
    /// 16-bit unsigned integer.
    U16,
}

impl DType {
    /// Every supported element type.
    pub const ALL: [DType; 12] = [
        DType::F32,
        DType::C32,
        DType::F64,
        DType::C64,
        DType::B8,
        DType::S32,
        DType::U32,
        DType::U8,
        DType::S64,
        DType::U64,
        DType::S16,
        DType::U16,
    ];

    /// Returns the short name of the type, e.g. `"f32"`.
    pub fn name(&self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::C32 => "c32",
            DType::F64 => "f64",
            DType::C64 => "c64",
            DType::B8 => "b8",
            DType::S32 => "s32",
            DType::U32 => "u32",
            DType::U8 => "u8",
            DType::S64 => "s64",
            DType::U64 => "u64",
            DType::S16 => "s16",
            DType::U16 => "u16",
        }
    }

    /// Returns the size of one element in bytes.
    pub fn size_of(&self) -> usize {
        match self {
            DType::B8 | DType::U8 => 1,
            DType::S16 | DType::U16 => 2,
            DType::F32 | DType::S32 | DType::U32 => 4,
            DType::F64 | DType::C32 | DType::S64 | DType::U64 => 8,
            DType::C64 => 16,
        }
    }

    /// Returns true for the complex types.
    pub fn is_complex(&self) -> bool {
        matches!(self, DType::C32 | DType::C64)
    }

    /// Returns true for the real floating point types.
    pub fn is_floating(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    /// Returns true for the signed and unsigned integer types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DType::S32
                | DType::U32
                | DType::U8
                | DType::S64
                | DType::U64
                | DType::S16
                | DType::U16
        )
    }

    /// Returns true for [`DType::B8`].
    pub fn is_bool(&self) -> bool {
        matches!(self, DType::B8)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs `$body` with `$T` bound to the Rust element type of `$dtype`.
macro_rules! with_element {
    ($dtype:expr, $T:ident => $body:expr) => {
        match $dtype {
            $crate::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::DType::C32 => {
                type $T = num_complex::Complex32;
                $body
            }
            $crate::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::DType::C64 => {
                type $T = num_complex::Complex64;
                $body
            }
            $crate::DType::B8 => {
                type $T = bool;
                $body
            }
            $crate::DType::S32 => {
                type $T = i32;
                $body
            }
            $crate::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::DType::S64 => {
                type $T = i64;
                $body
            }
            $crate::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::DType::S16 => {
                type $T = i16;
                $body
            }
            $crate::DType::U16 => {
                type $T = u16;
                $body
            }
        }
    };
}

pub(crate) use with_element;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_f32() {
        assert_eq!(DType::default(), DType::F32);
    }

    #[test]
    fn categories_partition_the_types() {
        for dtype in DType::ALL {
            let categories = [
                dtype.is_complex(),
                dtype.is_floating(),
                dtype.is_integer(),
                dtype.is_bool(),
            ];
            assert_eq!(categories.iter().filter(|&&c| c).count(), 1, "{dtype}");
        }
    }

    #[test]
    fn sizes() {
        assert_eq!(DType::B8.size_of(), 1);
        assert_eq!(DType::U16.size_of(), 2);
        assert_eq!(DType::C32.size_of(), 8);
        assert_eq!(DType::C64.size_of(), 16);
    }

    #[test]
    fn serde_uses_short_names() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&DType::C64)?, "\"c64\"");
        assert_eq!(serde_json::from_str::<DType>("\"u16\"")?, DType::U16);
        Ok(())
    }
}
