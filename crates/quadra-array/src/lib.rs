#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `quadra-array` defines the data model shared by every quadra crate: the shape of an
//! array, its element types, its storage and the backends that produce new storage.
//!
//! # Architecture
//!
//! - **Dim4**: Exactly four extents; missing trailing extents default to 1
//! - **DType / Element**: The element type tag and the Rust types that carry it
//! - **Array**: An immutable window (shape, strides, offset) over shared storage
//! - **ArrayStorage**: Reference-counted, dtype-tagged element buffers
//! - **Backend**: Materializes arrays from per-element kernels, serially or in parallel
//! - **ArrayAllocator**: Fallible allocation with an optional per-allocation limit
//!
//! # Quick Start
//!
//! ```rust
//! use quadra_array::{Array, Backend, BackendKind, CpuAllocator, DType, Dim4, Source};
//!
//! let backend = BackendKind::Cpu.build(CpuAllocator::new()).unwrap();
//!
//! // a 2x2 matrix with ones on the diagonal
//! let eye = backend
//!     .materialize(DType::F32, Dim4::from((2, 2)), &[], &|[i, j, _, _]| {
//!         if i == j { Source::One } else { Source::Zero }
//!     })
//!     .unwrap();
//! assert_eq!(eye.to_vec::<f32>().unwrap(), vec![1.0, 0.0, 0.0, 1.0]);
//!
//! // views share storage
//! let row = Array::from_vec(Dim4::from((1, 3)), vec![1u8, 2, 3]).unwrap();
//! let col = row.permute_axes([1, 0, 2, 3]).unwrap();
//! assert!(col.shares_storage(&row));
//! ```

/// Allocator module containing fallible memory reservation.
pub mod allocator;

/// Array module containing the strided array type and its views.
pub mod array;

/// Backend module containing the execution backends.
pub mod backend;

/// Dim4 module containing the four-extent shape type.
pub mod dim4;

/// DType module containing the element type tags.
pub mod dtype;

/// Element module mapping Rust types onto element type tags.
pub mod element;

/// Error module containing the error taxonomy and status codes.
pub mod error;

/// Kernel module containing the per-element sources evaluated by backends.
pub mod kernel;

/// Scalar module containing dynamically typed element values.
pub mod scalar;

/// Storage module containing the shared element buffers.
pub mod storage;

pub use crate::allocator::{AllocatorError, ArrayAllocator, CpuAllocator};
pub use crate::array::Array;
pub use crate::backend::{Backend, BackendKind, CpuBackend, ParallelBackend};
pub use crate::dim4::{Dim4, MAX_DIMS};
pub use crate::dtype::DType;
pub use crate::element::Element;
pub use crate::error::{ArrayError, ErrorCode};
pub use crate::kernel::{Kernel, Source};
pub use crate::scalar::Scalar;
pub use crate::storage::{ArrayStorage, Buffer};

pub use num_complex::{Complex32, Complex64};
