#![forbid(unsafe_code)]
//! Element kernels and scalar types shared by the `daxpy` host crate.
//!
//! Nothing here allocates or performs I/O. Kernels operate on single items
//! and are driven over slices by the caller.

pub use num_traits;

pub mod kernel;
pub mod scalar;
