use crate::{
    allocator::{AllocationError, Allocator, Reservation},
    scalar::Scalar,
};
use std::{
    fmt::{self, Debug},
    mem::size_of,
};

/// Reserved storage for `len` elements, none of them initialized.
///
/// Reserving every buffer before writing any element means a failed
/// reservation leaves all memory untouched.
pub struct RawBuffer<T> {
    data: Vec<T>,
    len: usize,
    reservation: Reservation,
}

impl<T: Scalar> RawBuffer<T> {
    /// Reserves `len` elements from `allocator`.
    pub fn reserve(allocator: &Allocator, len: usize) -> Result<Self, AllocationError> {
        let elem_size = size_of::<T>();
        let bytes = len
            .checked_mul(elem_size)
            .filter(|bytes| *bytes <= isize::MAX as usize)
            .ok_or(AllocationError::CapacityOverflow { len, elem_size })?;
        let reservation = allocator.reserve(bytes)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| AllocationError::OutOfMemory { bytes })?;
        Ok(Self {
            data,
            len,
            reservation,
        })
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    /// Initializes element `i` with `f(i)`.
    pub fn init_with(self, f: impl FnMut(usize) -> T) -> Buffer<T> {
        let Self {
            mut data,
            len,
            reservation,
        } = self;
        data.extend((0..len).map(f));
        Buffer { data, reservation }
    }
    pub fn zeroed(self) -> Buffer<T> {
        self.init_with(|_| T::zero())
    }
}

impl<T: Scalar> Debug for RawBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("scalar_type", &T::scalar_type())
            .field("len", &self.len)
            .finish()
    }
}

/// Initialized host buffer.
pub struct Buffer<T> {
    data: Vec<T>,
    reservation: Reservation,
}

impl<T: Scalar> Buffer<T> {
    /// Reserves and initializes `len` elements with `f(i)`.
    pub fn from_fn(
        allocator: &Allocator,
        len: usize,
        f: impl FnMut(usize) -> T,
    ) -> Result<Self, AllocationError> {
        Ok(RawBuffer::reserve(allocator, len)?.init_with(f))
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
    pub fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }
    /// Moves the data out. The memory is no longer accounted by the allocator.
    pub fn into_vec(self) -> Vec<T> {
        let Self { data, reservation } = self;
        drop(reservation);
        data
    }
}

impl<T: Scalar> Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("scalar_type", &T::scalar_type())
            .field("len", &self.len())
            .field("bytes", &self.reservation.bytes())
            .finish()
    }
}
