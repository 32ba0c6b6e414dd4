//! Arc-based storage shared between arrays and their views.
//!
//! Storage is immutable once created. Cloning an [`ArrayStorage`] only increments a
//! reference count, which is what lets views alias the memory of their source while
//! remaining independent values.

use std::sync::Arc;

use num_complex::{Complex32, Complex64};

use crate::{dtype::DType, element::Element};

/// A dtype-tagged, contiguous element buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Buffer {
    /// `f32` elements.
    F32(Vec<f32>),
    /// `Complex32` elements.
    C32(Vec<Complex32>),
    /// `f64` elements.
    F64(Vec<f64>),
    /// `Complex64` elements.
    C64(Vec<Complex64>),
    /// `bool` elements.
    B8(Vec<bool>),
    /// `i32` elements.
    S32(Vec<i32>),
    /// `u32` elements.
    U32(Vec<u32>),
    /// `u8` elements.
    U8(Vec<u8>),
    /// `i64` elements.
    S64(Vec<i64>),
    /// `u64` elements.
    U64(Vec<u64>),
    /// `i16` elements.
    S16(Vec<i16>),
    /// `u16` elements.
    U16(Vec<u16>),
}

impl Buffer {
    /// Returns the dtype of the buffer.
    pub fn dtype(&self) -> DType {
        match self {
            Buffer::F32(_) => DType::F32,
            Buffer::C32(_) => DType::C32,
            Buffer::F64(_) => DType::F64,
            Buffer::C64(_) => DType::C64,
            Buffer::B8(_) => DType::B8,
            Buffer::S32(_) => DType::S32,
            Buffer::U32(_) => DType::U32,
            Buffer::U8(_) => DType::U8,
            Buffer::S64(_) => DType::S64,
            Buffer::U64(_) => DType::U64,
            Buffer::S16(_) => DType::S16,
            Buffer::U16(_) => DType::U16,
        }
    }

    /// Returns the number of elements in the buffer.
    pub fn len(&self) -> usize {
        match self {
            Buffer::F32(d) => d.len(),
            Buffer::C32(d) => d.len(),
            Buffer::F64(d) => d.len(),
            Buffer::C64(d) => d.len(),
            Buffer::B8(d) => d.len(),
            Buffer::S32(d) => d.len(),
            Buffer::U32(d) => d.len(),
            Buffer::U8(d) => d.len(),
            Buffer::S64(d) => d.len(),
            Buffer::U64(d) => d.len(),
            Buffer::S16(d) => d.len(),
            Buffer::U16(d) => d.len(),
        }
    }

    /// Returns true if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the size of the buffer data in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * self.dtype().size_of()
    }
}

/// Reference-counted array storage.
///
/// # Thread Safety
///
/// `ArrayStorage` is `Send + Sync`: the data behind the `Arc` is never mutated.
#[derive(Debug, Clone)]
pub struct ArrayStorage {
    inner: Arc<Buffer>,
}

impl ArrayStorage {
    /// Creates storage owning `buffer`.
    pub fn new(buffer: Buffer) -> Self {
        Self {
            inner: Arc::new(buffer),
        }
    }

    /// Creates storage from typed data.
    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        Self::new(T::into_buffer(data))
    }

    /// Returns the dtype of the stored elements.
    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype()
    }

    /// Returns the number of stored elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no elements are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the underlying buffer.
    #[inline]
    pub fn buffer(&self) -> &Buffer {
        &self.inner
    }

    /// Returns the stored elements if they are of type `T`.
    #[inline]
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::from_buffer(&self.inner)
    }

    /// Returns true if both storages point at the same allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &ArrayStorage) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns true if this storage is uniquely owned (no other references).
    #[inline]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }
}
