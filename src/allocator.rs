//! Host memory accounting.
//!
//! Every buffer is reserved through an [`Allocator`], which tracks live bytes
//! and can be limited or told to refuse a given request. Reservations are
//! released when the owning buffer is dropped.

use log::trace;
use parking_lot::Mutex;
use std::{
    fmt::{self, Debug},
    sync::Arc,
};

pub mod error {
    /// Failure to acquire memory for a buffer.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
    pub enum AllocationError {
        #[error("capacity overflow: {len} elements of {elem_size} bytes")]
        CapacityOverflow { len: usize, elem_size: usize },
        #[error("memory limit exceeded: requested {requested} bytes with {live} of {limit} in use")]
        LimitExceeded {
            requested: usize,
            live: usize,
            limit: usize,
        },
        #[error("allocation request {index} refused")]
        Injected { index: usize },
        #[error("out of memory: {bytes} bytes")]
        OutOfMemory { bytes: usize },
    }
}
pub use error::AllocationError;

pub mod builder {
    use super::*;

    /// Builds an [`Allocator`].
    #[derive(Clone, Debug, Default)]
    pub struct AllocatorBuilder {
        pub(super) limit: Option<usize>,
        pub(super) fail_at: Option<usize>,
    }

    impl AllocatorBuilder {
        /// Caps the number of live bytes.
        pub fn limit(self, bytes: usize) -> Self {
            Self {
                limit: Some(bytes),
                ..self
            }
        }
        /// Refuses the request with the given zero based index.
        pub fn fail_at(self, index: usize) -> Self {
            Self {
                fail_at: Some(index),
                ..self
            }
        }
        pub fn build(self) -> Allocator {
            Allocator {
                inner: Arc::new(Mutex::new(AllocatorState {
                    limit: self.limit,
                    fail_at: self.fail_at,
                    ..AllocatorState::default()
                })),
            }
        }
    }
}
use builder::AllocatorBuilder;

#[derive(Default)]
struct AllocatorState {
    limit: Option<usize>,
    fail_at: Option<usize>,
    requests: usize,
    allocations: usize,
    live: usize,
    peak: usize,
}

/// Shared handle to host memory accounting.
#[derive(Clone)]
pub struct Allocator {
    inner: Arc<Mutex<AllocatorState>>,
}

impl Allocator {
    /// An unlimited allocator.
    pub fn host() -> Self {
        Self::builder().build()
    }
    pub fn builder() -> AllocatorBuilder {
        AllocatorBuilder::default()
    }
    /// Bytes currently reserved.
    pub fn live_bytes(&self) -> usize {
        self.inner.lock().live
    }
    /// Highest value of [`.live_bytes()`](Self::live_bytes) so far.
    pub fn peak_bytes(&self) -> usize {
        self.inner.lock().peak
    }
    /// Number of requests, including refused ones.
    pub fn requests(&self) -> usize {
        self.inner.lock().requests
    }
    /// Number of successful reservations.
    pub fn allocations(&self) -> usize {
        self.inner.lock().allocations
    }
    pub(crate) fn reserve(&self, bytes: usize) -> Result<Reservation, AllocationError> {
        let mut state = self.inner.lock();
        let index = state.requests;
        state.requests += 1;
        if state.fail_at == Some(index) {
            trace!("refusing allocation request {index} of {bytes} bytes");
            return Err(AllocationError::Injected { index });
        }
        if let Some(limit) = state.limit {
            if bytes > limit.saturating_sub(state.live) {
                return Err(AllocationError::LimitExceeded {
                    requested: bytes,
                    live: state.live,
                    limit,
                });
            }
        }
        state.allocations += 1;
        state.live += bytes;
        state.peak = state.peak.max(state.live);
        trace!("reserved {bytes} bytes, {} live", state.live);
        Ok(Reservation {
            allocator: self.clone(),
            bytes,
        })
    }
    fn release(&self, bytes: usize) {
        let mut state = self.inner.lock();
        state.live -= bytes;
        trace!("released {bytes} bytes, {} live", state.live);
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::host()
    }
}

impl Debug for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("Allocator")
            .field("limit", &state.limit)
            .field("live", &state.live)
            .field("allocations", &state.allocations)
            .finish()
    }
}

/// Accounted bytes, returned to the allocator on drop.
pub(crate) struct Reservation {
    allocator: Allocator,
    bytes: usize,
}

impl Reservation {
    pub(crate) fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.allocator.release(self.bytes);
    }
}
