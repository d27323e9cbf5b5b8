//! Device memory: element buffers, scratch storage and kernel write views.

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::device::Device;
use crate::error::{Result, RuntimeError};

/// Element buffer bound to one device.
///
/// A buffer can be released explicitly; a released buffer stays around as an
/// unbound handle and every access reports [`RuntimeError::BufferReleased`].
#[derive(Debug)]
pub struct DeviceBuffer<T: Pod> {
    data: Option<Vec<T>>,
    device_id: u64,
}

impl<T: Pod> DeviceBuffer<T> {
    /// Allocate a buffer on `device` and upload `data` into it.
    pub fn from_slice(device: &Device, data: &[T]) -> Self {
        Self {
            data: Some(data.to_vec()),
            device_id: device.id(),
        }
    }

    /// Allocate a zero-filled buffer of `len` elements.
    pub fn zeroed(device: &Device, len: usize) -> Self {
        Self {
            data: Some(vec![T::zeroed(); len]),
            device_id: device.id(),
        }
    }

    /// Number of elements (0 once released).
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the buffer still owns device memory.
    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    pub fn device_id(&self) -> u64 {
        self.device_id
    }

    /// Free the device memory, leaving an unbound handle.
    pub fn release(&mut self) {
        self.data = None;
    }

    pub fn as_slice(&self) -> Result<&[T]> {
        self.data.as_deref().ok_or(RuntimeError::BufferReleased)
    }

    pub fn as_mut_slice(&mut self) -> Result<&mut [T]> {
        self.data.as_deref_mut().ok_or(RuntimeError::BufferReleased)
    }

    /// Download the buffer contents.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        self.as_slice().map(<[T]>::to_vec)
    }
}

/// Temporary storage measured in `int` (4-byte) slots.
///
/// Backing storage is 16-byte aligned so that a prefix of the slots can be
/// reinterpreted as any primitive key type.
#[derive(Debug)]
pub struct ScratchBuffer {
    storage: Vec<u128>,
    len: usize,
    device_id: u64,
}

/// Bytes in one scratch slot.
pub const SCRATCH_SLOT_BYTES: usize = std::mem::size_of::<u32>();

/// Alignment guaranteed for the first scratch slot.
pub const SCRATCH_ALIGN: usize = std::mem::align_of::<u128>();

impl ScratchBuffer {
    /// Allocate `len` zeroed slots on `device`.
    pub fn new(device: &Device, len: usize) -> Self {
        Self {
            storage: vec![0u128; len.div_ceil(4)],
            len,
            device_id: device.id(),
        }
    }

    /// Number of `int` slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn device_id(&self) -> u64 {
        self.device_id
    }

    pub fn words(&self) -> &[u32] {
        &bytemuck::cast_slice::<u128, u32>(&self.storage)[..self.len]
    }

    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut bytemuck::cast_slice_mut::<u128, u32>(&mut self.storage)[..self.len]
    }
}

/// Write view over global memory shared by every lane of a launch.
///
/// Lanes scatter into disjoint indices, so the view hands out raw stores
/// instead of `&mut` access. Bounds are always checked.
pub struct GlobalView<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: the view only moves `T` values into distinct slots; callers of
// `store` guarantee that no two lanes target the same index concurrently.
unsafe impl<T: Send> Send for GlobalView<'_, T> {}
unsafe impl<T: Send> Sync for GlobalView<'_, T> {}

impl<'a, T: Copy> GlobalView<'a, T> {
    pub fn new(slice: &'a mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store `value` at `index`.
    ///
    /// # Safety
    /// No other lane may read or write `index` while the launch is running.
    pub unsafe fn store(&self, index: usize, value: T) {
        assert!(
            index < self.len,
            "global store out of bounds: {index} >= {}",
            self.len
        );
        // SAFETY: index is in bounds and exclusively owned by the caller.
        unsafe { self.ptr.add(index).write(value) }
    }

    /// Read the value at `index`.
    ///
    /// # Safety
    /// No other lane may write `index` while the launch is running.
    pub unsafe fn load(&self, index: usize) -> T {
        assert!(
            index < self.len,
            "global load out of bounds: {index} >= {}",
            self.len
        );
        // SAFETY: index is in bounds and not concurrently written.
        unsafe { self.ptr.add(index).read() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_buffer_release() {
        let device = Device::cpu();
        let mut buffer = DeviceBuffer::from_slice(&device, &[1u32, 2, 3]);
        assert_eq!(buffer.len(), 3);
        assert!(buffer.is_bound());

        buffer.release();
        assert!(!buffer.is_bound());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.to_vec(), Err(RuntimeError::BufferReleased));
    }

    #[test]
    fn test_scratch_words_are_aligned() {
        let device = Device::cpu();
        let mut scratch = ScratchBuffer::new(&device, 7);
        assert_eq!(scratch.words().len(), 7);
        assert_eq!(scratch.words_mut().as_ptr() as usize % SCRATCH_ALIGN, 0);
    }

    #[test]
    fn test_global_view_store() {
        let mut data = vec![0u64; 4];
        {
            let view = GlobalView::new(&mut data);
            unsafe {
                view.store(3, 7);
                view.store(0, 1);
            }
        }
        assert_eq!(data, vec![1, 0, 0, 7]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_global_view_bounds_checked() {
        let mut data = vec![0u32; 2];
        let view = GlobalView::new(&mut data);
        unsafe { view.store(2, 1) };
    }
}
