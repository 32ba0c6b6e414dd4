#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use quadra_array as array;

#[doc(inline)]
pub use quadra_array_ops as ops;

/// Context configuration and environment loading.
pub mod config;

/// The execution context and its operations.
pub mod context;

/// Opaque array handles.
pub mod handle;

pub use config::ContextConfig;
pub use context::Context;
pub use handle::ArrayHandle;
pub use quadra_array::{ArrayError, BackendKind, DType, Dim4, ErrorCode, Scalar};

/// Converts an operation result into a status code.
///
/// On success the value is written to `out`; on failure `out` is left untouched, so a
/// caller never observes a partially initialized output.
///
/// # Example
///
/// ```
/// use quadra::{status, Context, ContextConfig, DType, Dim4, ErrorCode};
///
/// let ctx = Context::new(ContextConfig::default()).unwrap();
/// let mut out = None;
/// assert_eq!(status(ctx.range(Dim4::from(4), 7, DType::F32), &mut out), ErrorCode::InvalidArgument);
/// assert!(out.is_none());
/// assert_eq!(status(ctx.range(Dim4::from(4), 0, DType::F32), &mut out), ErrorCode::Success);
/// assert!(out.is_some());
/// ```
pub fn status<T>(result: Result<T, ArrayError>, out: &mut Option<T>) -> ErrorCode {
    match result {
        Ok(value) => {
            *out = Some(value);
            ErrorCode::Success
        }
        Err(e) => e.code(),
    }
}

/// Reseeds the random engine of the global context.
pub fn set_seed(seed: u64) {
    Context::global().set_seed(seed)
}

/// Returns the seed of the global context's random engine.
pub fn get_seed() -> u64 {
    Context::global().get_seed()
}
