//! Scratch arena and the ping-pong buffer pair.

use accel_runtime::{Stream, SCRATCH_SLOT_BYTES};
use bytemuck::Pod;

use crate::error::{Result, SortError};

/// Bump allocator over a borrowed run of `int` scratch slots.
///
/// Views are handed out front to back and never overlap. Asking for more
/// slots than remain is reported as [`SortError::UndersizedScratch`].
#[derive(Debug)]
pub struct ScratchArena<'a> {
    rest: &'a mut [u32],
    capacity: usize,
    used: usize,
}

impl<'a> ScratchArena<'a> {
    pub fn new(words: &'a mut [u32]) -> Self {
        Self {
            capacity: words.len(),
            rest: words,
            used: 0,
        }
    }

    /// Slots handed out so far.
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Take the next `slots` slots.
    pub fn take(&mut self, slots: usize) -> Result<&'a mut [u32]> {
        if slots > self.rest.len() {
            return Err(SortError::UndersizedScratch {
                required: self.used + slots,
                provided: self.capacity,
            });
        }
        let rest = std::mem::take(&mut self.rest);
        let (head, tail) = rest.split_at_mut(slots);
        self.rest = tail;
        self.used += slots;
        Ok(head)
    }

    /// Take a view of `len` keys, rounded up to whole slots.
    ///
    /// The view must be aligned for `T`; the first allocation of a fresh
    /// arena always is.
    pub fn take_keys<T: Pod>(&mut self, len: usize) -> Result<&'a mut [T]> {
        let size = std::mem::size_of::<T>();
        let slots = key_slots::<T>(len);
        let words = self.take(slots)?;
        let bytes: &'a mut [u8] = bytemuck::cast_slice_mut(words);
        bytemuck::try_cast_slice_mut(&mut bytes[..len * size]).map_err(|_| {
            SortError::UnsupportedKeyLayout {
                size,
                align: std::mem::align_of::<T>(),
            }
        })
    }
}

/// `int` slots occupied by `len` keys of type `T`.
pub fn key_slots<T>(len: usize) -> usize {
    (len * std::mem::size_of::<T>()).div_ceil(SCRATCH_SLOT_BYTES)
}

/// Which buffer of a [`BufferPair`] holds the live data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Temporary,
}

/// The caller's buffer and a same-length temporary, with a tracked
/// "current" role.
///
/// Every scatter reads the current buffer and writes the other one, then
/// [`flip`](Self::flip)s the role; no data is moved to swap buffers.
#[derive(Debug)]
pub struct BufferPair<'a, T> {
    primary: &'a mut [T],
    temporary: &'a mut [T],
    current: Role,
    flips: usize,
}

impl<'a, T: Copy> BufferPair<'a, T> {
    pub fn new(primary: &'a mut [T], temporary: &'a mut [T]) -> Result<Self> {
        if primary.len() != temporary.len() {
            return Err(SortError::InvalidArgument(format!(
                "buffer pair lengths differ: {} and {}",
                primary.len(),
                temporary.len()
            )));
        }
        Ok(Self {
            primary,
            temporary,
            current: Role::Primary,
            flips: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn current(&self) -> Role {
        self.current
    }

    /// Role flips so far.
    pub fn flips(&self) -> usize {
        self.flips
    }

    /// `(current, alternate)` for the next scatter.
    pub fn split(&mut self) -> (&[T], &mut [T]) {
        match self.current {
            Role::Primary => (&*self.primary, &mut *self.temporary),
            Role::Temporary => (&*self.temporary, &mut *self.primary),
        }
    }

    /// Make the alternate buffer current.
    pub fn flip(&mut self) {
        self.current = match self.current {
            Role::Primary => Role::Temporary,
            Role::Temporary => Role::Primary,
        };
        self.flips += 1;
    }

    /// Leave the live data in the primary buffer.
    ///
    /// Returns whether a copy-back was needed.
    pub fn finish(mut self, stream: &Stream) -> Result<bool> {
        if self.current == Role::Primary {
            return Ok(false);
        }
        stream.copy("radix_copy_back", self.temporary, self.primary)?;
        Ok(true)
    }
}
