use std::alloc::Layout;

use thiserror::Error;

use crate::element::Element;

/// An error type for array allocator operations.
#[derive(Debug, Error, PartialEq)]
pub enum AllocatorError {
    /// The requested size does not form a valid memory layout.
    #[error("Invalid array layout {0}")]
    LayoutError(core::alloc::LayoutError),

    /// The system allocator could not provide the memory.
    #[error("Out of memory: failed to reserve {bytes} bytes")]
    OutOfMemory {
        /// The number of bytes requested.
        bytes: usize,
    },

    /// The request is larger than the configured per-allocation limit.
    #[error("Allocation of {requested} bytes exceeds the limit of {limit} bytes")]
    LimitExceeded {
        /// The number of bytes requested.
        requested: usize,
        /// The configured limit in bytes.
        limit: usize,
    },
}

/// A trait for reserving element memory for arrays.
///
/// Backends obtain every output buffer through an allocator, so allocation failures
/// surface as errors instead of aborting the process.
pub trait ArrayAllocator: Clone + Send + Sync + 'static {
    /// Returns an empty vector with capacity for exactly `len` elements of type `T`.
    fn allocate<T: Element>(&self, len: usize) -> Result<Vec<T>, AllocatorError>;
}

/// An array allocator that uses the system allocator.
///
/// An optional limit caps the size of any single allocation in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuAllocator {
    limit: Option<usize>,
}

impl CpuAllocator {
    /// Creates an allocator without a limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator that rejects single allocations above `bytes`.
    pub fn with_limit(bytes: usize) -> Self {
        Self { limit: Some(bytes) }
    }

    /// Returns the per-allocation limit in bytes, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl ArrayAllocator for CpuAllocator {
    fn allocate<T: Element>(&self, len: usize) -> Result<Vec<T>, AllocatorError> {
        let layout = Layout::array::<T>(len).map_err(AllocatorError::LayoutError)?;
        if let Some(limit) = self.limit {
            if layout.size() > limit {
                return Err(AllocatorError::LimitExceeded {
                    requested: layout.size(),
                    limit,
                });
            }
        }

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| AllocatorError::OutOfMemory {
                bytes: layout.size(),
            })?;
        Ok(data)
    }
}
