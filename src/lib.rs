#![forbid(unsafe_code)]
//! Scaled vector addition, `a * X + Y`, over host buffers.
//!
//! ```
//! use daxpy::kernel::axpy;
//!
//! let x = [1f64, 2., 3.];
//! let mut y = [1f64, 2., 3.];
//! axpy(2., &x, &mut y).unwrap();
//! assert_eq!(y, [3., 6., 9.]);
//! ```

pub use daxpy_core;

#[doc(inline)]
pub use daxpy_core::scalar;

pub mod allocator;
pub mod buffer;
pub mod driver;
pub mod format;
pub mod kernel;
