//! Seeds the vectors, runs the kernel once and prints before and after.
//!
//! All vectors are reserved before any element is written. If a reservation
//! fails the vectors already reserved are released on return and nothing is
//! printed.

use crate::{
    allocator::{AllocationError, Allocator},
    buffer::{Buffer, RawBuffer},
    format::{write_scalar, write_vector},
    kernel::{Axpy, Dispatch, KernelError},
    scalar::Scalar,
};
use log::{debug, warn};
use std::io::{self, Write};

pub mod error {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    pub enum DriverError {
        #[error("allocation for {vector} failed")]
        Allocation {
            vector: &'static str,
            #[source]
            source: AllocationError,
        },
        #[error(transparent)]
        Kernel(#[from] KernelError),
        #[error(transparent)]
        Io(#[from] io::Error),
    }
}
pub use error::DriverError;

/// Where the result is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// `Y = a * X + Y`
    #[default]
    InPlace,
    /// `D = a * X + Y`
    OutOfPlace,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DriverConfig {
    pub len: usize,
    pub alpha: f64,
    pub mode: Mode,
    pub dispatch: Dispatch,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            len: 5,
            alpha: 2.,
            mode: Mode::InPlace,
            dispatch: Dispatch::Serial,
        }
    }
}

/// Result of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct Report<T> {
    pub result: Vec<T>,
    pub sum: f64,
    /// `n * (n + 1) / 2 * (alpha + 1)`
    pub expected_sum: f64,
}

impl<T> Report<T> {
    /// Whether `sum` agrees with `expected_sum` to a relative tolerance.
    pub fn is_consistent(&self) -> bool {
        let tol = 1e-6 * self.expected_sum.abs().max(1.);
        (self.sum - self.expected_sum).abs() <= tol
    }
}

/// Closed form sum of `alpha * x + y` over `x[i] = y[i] = i + 1`.
pub fn expected_sum(len: usize, alpha: f64) -> f64 {
    let n = len as f64;
    n * (n + 1.) / 2. * (alpha + 1.)
}

fn reserve<T: Scalar>(
    allocator: &Allocator,
    vector: &'static str,
    len: usize,
) -> Result<RawBuffer<T>, DriverError> {
    RawBuffer::reserve(allocator, len).map_err(|source| DriverError::Allocation { vector, source })
}

/// Runs the program, writing its output to `out`.
pub fn run<T: Scalar, W: Write>(
    config: &DriverConfig,
    allocator: &Allocator,
    out: &mut W,
) -> Result<Report<T>, DriverError> {
    debug!("{config:?} scalar_type={}", T::scalar_type());
    config.dispatch.validate()?;
    let n = config.len;
    let alpha = T::from_f64_lossy(config.alpha);

    let x = reserve::<T>(allocator, "x", n)?;
    let y = reserve::<T>(allocator, "y", n)?;
    let d = match config.mode {
        Mode::InPlace => None,
        Mode::OutOfPlace => Some(reserve::<T>(allocator, "d", n)?),
    };
    debug!("reserved {} bytes", allocator.live_bytes());

    let seed = |i: usize| T::from_index(i + 1);
    let x = x.init_with(seed);
    let mut y = y.init_with(seed);

    writeln!(out, "## Before DAXPY ##")?;
    write_vector(out, "X", x.as_slice())?;
    write_vector(out, "Y", y.as_slice())?;
    write_scalar(out, "A", alpha)?;
    writeln!(out)?;

    let axpy = Axpy::new(alpha).with_dispatch(config.dispatch);
    let (label, result): (_, Buffer<T>) = match d {
        None => {
            axpy.apply_in_place(x.as_slice(), y.as_slice_mut())?;
            ("Result (Y)", y)
        }
        Some(d) => {
            let mut d = d.zeroed();
            axpy.apply_out_of_place(x.as_slice(), y.as_slice(), d.as_slice_mut())?;
            ("Result (D)", d)
        }
    };

    writeln!(out, "## After DAXPY ##")?;
    write_vector(out, label, result.as_slice())?;

    let report = Report {
        sum: result.as_slice().iter().map(|x| x.into_f64()).sum(),
        expected_sum: expected_sum(n, alpha.into_f64()),
        result: result.into_vec(),
    };
    debug!("sum={} expected_sum={}", report.sum, report.expected_sum);
    if !report.is_consistent() {
        warn!(
            "sum {} differs from expected {}",
            report.sum, report.expected_sum
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_string<T: Scalar>(
        config: &DriverConfig,
        allocator: &Allocator,
    ) -> (Result<Report<T>, DriverError>, String) {
        let mut out = Vec::new();
        let result = run(config, allocator, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn default_output() {
        let (report, output) = run_to_string::<f64>(&DriverConfig::default(), &Allocator::host());
        let report = report.unwrap();
        assert_eq!(
            output,
            "## Before DAXPY ##\n\
             X = [ 1.000000, 2.000000, 3.000000, 4.000000, 5.000000 ]\n\
             Y = [ 1.000000, 2.000000, 3.000000, 4.000000, 5.000000 ]\n\
             A = 2.000000\n\
             \n\
             ## After DAXPY ##\n\
             Result (Y) = [ 3.000000, 6.000000, 9.000000, 12.000000, 15.000000 ]\n"
        );
        assert_eq!(report.result, [3., 6., 9., 12., 15.]);
        assert_eq!(report.sum, 45.);
        assert_eq!(report.expected_sum, 45.);
    }

    #[test]
    fn out_of_place_label() {
        let config = DriverConfig {
            mode: Mode::OutOfPlace,
            ..DriverConfig::default()
        };
        let (report, output) = run_to_string::<f64>(&config, &Allocator::host());
        assert_eq!(report.unwrap().result, [3., 6., 9., 12., 15.]);
        assert!(output
            .ends_with("Result (D) = [ 3.000000, 6.000000, 9.000000, 12.000000, 15.000000 ]\n"));
    }

    #[test]
    fn empty() {
        let config = DriverConfig {
            len: 0,
            ..DriverConfig::default()
        };
        let (report, output) = run_to_string::<f64>(&config, &Allocator::host());
        assert!(report.unwrap().result.is_empty());
        assert!(output.contains("X = [ ]\n"));
        assert!(output.ends_with("Result (Y) = [ ]\n"));
    }

    #[test]
    fn second_allocation_fails() {
        let allocator = Allocator::builder().fail_at(1).build();
        let (result, output) = run_to_string::<f64>(&DriverConfig::default(), &allocator);
        match result {
            Err(DriverError::Allocation { vector, source }) => {
                assert_eq!(vector, "y");
                assert_eq!(source, AllocationError::Injected { index: 1 });
            }
            other => panic!("{other:?}"),
        }
        assert!(output.is_empty());
        assert_eq!(allocator.allocations(), 1);
        assert_eq!(allocator.live_bytes(), 0);
    }

    #[test]
    fn destination_allocation_fails() {
        let config = DriverConfig {
            mode: Mode::OutOfPlace,
            ..DriverConfig::default()
        };
        let allocator = Allocator::builder().limit(80).build();
        let (result, output) = run_to_string::<f64>(&config, &allocator);
        let err = result.err().unwrap();
        assert!(matches!(err, DriverError::Allocation { vector: "d", .. }));
        assert_eq!(err.to_string(), "allocation for d failed");
        assert!(output.is_empty());
        assert_eq!(allocator.live_bytes(), 0);
        assert_eq!(allocator.peak_bytes(), 80);
    }

    #[test]
    fn invalid_dispatch_before_allocation() {
        let config = DriverConfig {
            dispatch: Dispatch::Parallel { chunk_size: 0 },
            ..DriverConfig::default()
        };
        let allocator = Allocator::host();
        let (result, output) = run_to_string::<f64>(&config, &allocator);
        assert!(matches!(
            result,
            Err(DriverError::Kernel(KernelError::InvalidChunkSize))
        ));
        assert!(output.is_empty());
        assert_eq!(allocator.requests(), 0);
    }

    #[test]
    fn expected_sum_closed_form() {
        assert_eq!(expected_sum(5, 2.), 45.);
        assert_eq!(expected_sum(0, 2.), 0.);
        assert_eq!(expected_sum(100, 0.), 5050.);
    }
}
