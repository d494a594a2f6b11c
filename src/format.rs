//! Text rendering of vectors and scalars.
//!
//! Values use six fractional digits, ie `3.000000`, with `inf`, `-inf` and
//! `nan` for non finite values. A vector renders as
//! `NAME = [ 1.000000, 2.000000 ]`, or `NAME = [ ]` when empty.

use crate::scalar::Scalar;
use std::{
    fmt::{self, Display},
    io::{self, Write},
};

/// Fixed point rendering of a single value.
#[derive(Clone, Copy, Debug)]
pub struct Fixed<T>(pub T);

impl<T: Scalar> Display for Fixed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = self.0;
        let sign = if x.is_sign_negative() { "-" } else { "" };
        if x.is_nan() {
            write!(f, "{sign}nan")
        } else if x.is_infinite() {
            write!(f, "{sign}inf")
        } else {
            write!(f, "{x:.6}")
        }
    }
}

/// A named vector, displayed as `NAME = [ v0, v1, ... ]`.
#[derive(Clone, Copy, Debug)]
pub struct VectorDisplay<'a, T> {
    name: &'a str,
    values: &'a [T],
}

impl<'a, T: Scalar> VectorDisplay<'a, T> {
    pub fn new(name: &'a str, values: &'a [T]) -> Self {
        Self { name, values }
    }
}

impl<T: Scalar> Display for VectorDisplay<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = [", self.name)?;
        let last = self.values.len().saturating_sub(1);
        for (i, x) in self.values.iter().enumerate() {
            write!(f, " {}", Fixed(*x))?;
            if i < last {
                f.write_str(",")?;
            }
        }
        f.write_str(" ]")
    }
}

/// Writes `name = [ ... ]` followed by a newline.
pub fn write_vector<W: Write, T: Scalar>(out: &mut W, name: &str, values: &[T]) -> io::Result<()> {
    writeln!(out, "{}", VectorDisplay::new(name, values))
}

/// Writes `name = value` followed by a newline.
pub fn write_scalar<W: Write, T: Scalar>(out: &mut W, name: &str, value: T) -> io::Result<()> {
    writeln!(out, "{name} = {}", Fixed(value))
}
