//! Element kernels and index partitioning.
//!
//! Each kernel touches exactly one index, so any split of the index range can
//! be processed in any order with the same result.

use crate::scalar::Scalar;
use core::ops::Range;

/// `y = alpha * x + y`
#[inline]
pub fn axpy<T: Scalar>(x: &T, alpha: T, y: &mut T) {
    *y = alpha * *x + *y;
}

/// `d = alpha * x + y`
#[inline]
pub fn axpy_into<T: Scalar>(x: &T, alpha: T, y: &T, d: &mut T) {
    *d = alpha * *x + *y;
}

/// Splits `0..len` into contiguous ranges of at most `chunk_size` items.
///
/// # Panics
/// Panics if `chunk_size` is 0.
pub fn partition(len: usize, chunk_size: usize) -> Partition {
    assert!(chunk_size > 0, "chunk_size must be nonzero");
    Partition {
        len,
        chunk_size,
        start: 0,
    }
}

/// Iterator returned by [`partition`].
#[derive(Clone, Debug)]
pub struct Partition {
    len: usize,
    chunk_size: usize,
    start: usize,
}

impl Partition {
    /// Total number of chunks, including those already yielded.
    pub fn chunks(&self) -> usize {
        let n = self.len;
        n / self.chunk_size + usize::from(n % self.chunk_size != 0)
    }
}

impl Iterator for Partition {
    type Item = Range<usize>;
    fn next(&mut self) -> Option<Range<usize>> {
        if self.start >= self.len {
            return None;
        }
        let start = self.start;
        let end = start + self.chunk_size.min(self.len - start);
        self.start = end;
        Some(start..end)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.start;
        let n = remaining / self.chunk_size + usize::from(remaining % self.chunk_size != 0);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Partition {}
