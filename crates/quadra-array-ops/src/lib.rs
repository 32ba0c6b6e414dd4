#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Every operator validates its arguments first and then hands a per-element kernel to
//! a [`quadra_array::Backend`]; views (reorder, flip, moddims of a contiguous array) are
//! produced without touching the backend at all.

/// Generation of constant, identity and index arrays.
///
/// Provides [`generate::constant`] and its typed variants, [`generate::identity`],
/// [`generate::range`] and [`generate::iota`].
pub mod generate;

/// Shape transforms that move elements without changing their values.
///
/// Provides join, tile, reorder, shift, moddims, flat, flip and copy.
pub mod manip;

/// Diagonal and triangular matrix operators.
pub mod matrix;

/// Seeded pseudo-random generation.
///
/// Provides the [`random::RandomEngine`] generator state and the [`random::randu`] and
/// [`random::randn`] operators that draw from it.
pub mod random;

pub use random::RandomEngine;
