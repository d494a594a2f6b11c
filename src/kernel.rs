//! Slice kernels for `a * X + Y`.
//!
//! [`axpy`] updates `y` in place, [`axpy_into`] writes to a separate
//! destination. Both check lengths before writing anything.

use crate::scalar::Scalar;
use daxpy_core::kernel::{self as item, partition};
use derive_more::IsVariant;
use log::trace;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub mod error {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
    pub enum KernelError {
        #[error("length mismatch: x has {x} elements but y has {y}")]
        LengthMismatch { x: usize, y: usize },
        #[error("destination has {found} elements, expected {expected}")]
        DestinationLength { expected: usize, found: usize },
        #[error("chunk_size must be nonzero")]
        InvalidChunkSize,
        #[error("parallel dispatch requires the `parallel` feature")]
        ParallelUnavailable,
    }
}
pub use error::KernelError;

/// How the index range is executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, IsVariant)]
pub enum Dispatch {
    #[default]
    Serial,
    /// Contiguous chunks of at most `chunk_size` items on the rayon pool.
    Parallel { chunk_size: usize },
}

impl Dispatch {
    pub const DEFAULT_CHUNK_SIZE: usize = 1 << 16;

    pub fn parallel() -> Self {
        Self::Parallel {
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
    /// Checks that the dispatch can run in this build.
    pub fn validate(&self) -> Result<(), KernelError> {
        match self {
            Self::Serial => Ok(()),
            Self::Parallel { chunk_size: 0 } => Err(KernelError::InvalidChunkSize),
            Self::Parallel { .. } => {
                if cfg!(feature = "parallel") {
                    Ok(())
                } else {
                    Err(KernelError::ParallelUnavailable)
                }
            }
        }
    }
}

/// `a * X + Y` with a fixed `alpha` and [`Dispatch`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Axpy<T> {
    alpha: T,
    dispatch: Dispatch,
}

impl<T: Scalar> Axpy<T> {
    pub fn new(alpha: T) -> Self {
        Self {
            alpha,
            dispatch: Dispatch::Serial,
        }
    }
    pub fn with_dispatch(self, dispatch: Dispatch) -> Self {
        Self { dispatch, ..self }
    }
    pub fn alpha(&self) -> T {
        self.alpha
    }
    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }
    /// `y[i] = alpha * x[i] + y[i]`
    pub fn apply_in_place(&self, x: &[T], y: &mut [T]) -> Result<(), KernelError> {
        check_len(x.len(), y.len())?;
        self.dispatch.validate()?;
        self.trace("in_place", x.len());
        match self.dispatch {
            Dispatch::Serial => serial_in_place(self.alpha, x, y),
            Dispatch::Parallel { chunk_size } => parallel_in_place(self.alpha, chunk_size, x, y)?,
        }
        Ok(())
    }
    /// `d[i] = alpha * x[i] + y[i]`
    pub fn apply_out_of_place(&self, x: &[T], y: &[T], d: &mut [T]) -> Result<(), KernelError> {
        check_len(x.len(), y.len())?;
        if d.len() != x.len() {
            return Err(KernelError::DestinationLength {
                expected: x.len(),
                found: d.len(),
            });
        }
        self.dispatch.validate()?;
        self.trace("out_of_place", x.len());
        match self.dispatch {
            Dispatch::Serial => serial_out_of_place(self.alpha, x, y, d),
            Dispatch::Parallel { chunk_size } => {
                parallel_out_of_place(self.alpha, chunk_size, x, y, d)?
            }
        }
        Ok(())
    }
    fn trace(&self, variant: &str, n: usize) {
        match self.dispatch {
            Dispatch::Serial => {
                trace!("axpy {variant} {} n={n} serial", T::scalar_type().name());
            }
            Dispatch::Parallel { chunk_size } => {
                trace!(
                    "axpy {variant} {} n={n} parallel chunks={}",
                    T::scalar_type().name(),
                    partition(n, chunk_size).chunks()
                );
            }
        }
    }
}

/// `y = alpha * x + y` with serial dispatch.
pub fn axpy<T: Scalar>(alpha: T, x: &[T], y: &mut [T]) -> Result<(), KernelError> {
    Axpy::new(alpha).apply_in_place(x, y)
}

/// `d = alpha * x + y` with serial dispatch.
pub fn axpy_into<T: Scalar>(alpha: T, x: &[T], y: &[T], d: &mut [T]) -> Result<(), KernelError> {
    Axpy::new(alpha).apply_out_of_place(x, y, d)
}

fn check_len(x: usize, y: usize) -> Result<(), KernelError> {
    if x == y {
        Ok(())
    } else {
        Err(KernelError::LengthMismatch { x, y })
    }
}

fn serial_in_place<T: Scalar>(alpha: T, x: &[T], y: &mut [T]) {
    x.iter()
        .zip(y.iter_mut())
        .for_each(|(x, y)| item::axpy(x, alpha, y));
}

fn serial_out_of_place<T: Scalar>(alpha: T, x: &[T], y: &[T], d: &mut [T]) {
    x.iter()
        .zip(y)
        .zip(d.iter_mut())
        .for_each(|((x, y), d)| item::axpy_into(x, alpha, y, d));
}

#[cfg(feature = "parallel")]
fn parallel_in_place<T: Scalar>(
    alpha: T,
    chunk_size: usize,
    x: &[T],
    y: &mut [T],
) -> Result<(), KernelError> {
    let ranges: Vec<_> = partition(x.len(), chunk_size).collect();
    ranges
        .into_par_iter()
        .zip(y.par_chunks_mut(chunk_size))
        .for_each(|(range, y)| serial_in_place(alpha, &x[range], y));
    Ok(())
}

#[cfg(not(feature = "parallel"))]
fn parallel_in_place<T: Scalar>(
    _alpha: T,
    _chunk_size: usize,
    _x: &[T],
    _y: &mut [T],
) -> Result<(), KernelError> {
    Err(KernelError::ParallelUnavailable)
}

#[cfg(feature = "parallel")]
fn parallel_out_of_place<T: Scalar>(
    alpha: T,
    chunk_size: usize,
    x: &[T],
    y: &[T],
    d: &mut [T],
) -> Result<(), KernelError> {
    let ranges: Vec<_> = partition(x.len(), chunk_size).collect();
    ranges
        .into_par_iter()
        .zip(d.par_chunks_mut(chunk_size))
        .for_each(|(range, d)| serial_out_of_place(alpha, &x[range.clone()], &y[range], d));
    Ok(())
}

#[cfg(not(feature = "parallel"))]
fn parallel_out_of_place<T: Scalar>(
    _alpha: T,
    _chunk_size: usize,
    _x: &[T],
    _y: &[T],
    _d: &mut [T],
) -> Result<(), KernelError> {
    Err(KernelError::ParallelUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn in_place() {
        let x = seed(5);
        let mut y = seed(5);
        axpy(2., &x, &mut y).unwrap();
        assert_eq!(y, [3., 6., 9., 12., 15.]);
        assert_eq!(x, seed(5));
    }

    #[test]
    fn out_of_place() {
        let x = seed(5);
        let y = seed(5);
        let mut d = vec![0.; 5];
        axpy_into(2., &x, &y, &mut d).unwrap();
        assert_eq!(d, [3., 6., 9., 12., 15.]);
        assert_eq!(y, seed(5));
    }

    #[test]
    fn alpha_zero() {
        let x = seed(8);
        let mut y = seed(8);
        axpy(0., &x, &mut y).unwrap();
        assert_eq!(y, seed(8));
    }

    #[test]
    fn empty() {
        let mut y: [f32; 0] = [];
        axpy(2., &[], &mut y).unwrap();
        axpy_into::<f64>(2., &[], &[], &mut []).unwrap();
    }

    #[test]
    fn length_mismatch() {
        let x = seed(4);
        let mut y = seed(3);
        assert_eq!(
            axpy(2., &x, &mut y),
            Err(KernelError::LengthMismatch { x: 4, y: 3 })
        );
        assert_eq!(y, seed(3));
        let mut d = vec![0.; 2];
        assert_eq!(
            axpy_into(2., &x, &seed(4), &mut d),
            Err(KernelError::DestinationLength {
                expected: 4,
                found: 2
            })
        );
        assert_eq!(d, [0., 0.]);
    }

    #[test]
    fn zero_chunk_size() {
        let x = seed(4);
        let mut y = seed(4);
        let axpy = Axpy::new(2.).with_dispatch(Dispatch::Parallel { chunk_size: 0 });
        assert_eq!(
            axpy.apply_in_place(&x, &mut y),
            Err(KernelError::InvalidChunkSize)
        );
        assert_eq!(y, seed(4));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_matches_serial() {
        let n = 1000;
        let x = seed(n);
        let mut serial = seed(n);
        axpy(1.5, &x, &mut serial).unwrap();
        for chunk_size in [1, 7, 64, 1000, 4096] {
            let axpy = Axpy::new(1.5).with_dispatch(Dispatch::Parallel { chunk_size });
            let mut y = seed(n);
            axpy.apply_in_place(&x, &mut y).unwrap();
            assert_eq!(y, serial);
            let mut d = vec![0.; n];
            axpy.apply_out_of_place(&x, &seed(n), &mut d).unwrap();
            assert_eq!(d, serial);
        }
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn parallel_unavailable() {
        assert_eq!(
            Dispatch::parallel().validate(),
            Err(KernelError::ParallelUnavailable)
        );
    }
}
