//! Radix sort provider with automatically managed scratch.
//!
//! The provider owns one scratch buffer and grows it on demand. A sort call
//! checks the scratch out as a [`ScratchLease`] for its whole duration; only
//! one lease can be outstanding at a time, and a second checkout fails with
//! [`SortError::ScratchBusy`] instead of blocking.

use accel_runtime::{Device, DeviceBuffer, ScratchBuffer, Stream};
use bytemuck::Pod;
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::{Result, SortError};
use crate::key::DigitExtractor;
use crate::sort::RadixSort;
use crate::specialization::{Radix4, Specialization};

/// Radix sort front end that allocates scratch by itself.
#[derive(Debug)]
pub struct RadixSortProvider {
    device: Device,
    cache: Mutex<Option<ScratchBuffer>>,
}

/// Exclusive borrow of a provider's scratch cache.
///
/// Dropping the lease returns the scratch to the provider.
pub struct ScratchLease<'a> {
    device: &'a Device,
    slot: MutexGuard<'a, Option<ScratchBuffer>>,
}

impl ScratchLease<'_> {
    /// Scratch of at least `slots` slots, growing the cached buffer if needed.
    pub fn reserve(&mut self, slots: usize) -> &mut ScratchBuffer {
        if Option::as_ref(&*self.slot).map_or(true, |scratch| scratch.len() < slots) {
            debug!(from = self.len(), to = slots, "growing radix sort scratch");
            *self.slot = None;
        }
        self.slot.get_or_insert_with(|| ScratchBuffer::new(self.device, slots))
    }

    /// Slots currently cached.
    pub fn len(&self) -> usize {
        Option::as_ref(&*self.slot).map_or(0, ScratchBuffer::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RadixSortProvider {
    pub fn new(device: &Device) -> Self {
        Self {
            device: device.clone(),
            cache: Mutex::new(None),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Borrow the scratch cache.
    ///
    /// # Returns
    /// The lease, or [`SortError::ScratchBusy`] if another borrow is live.
    pub fn checkout(&self) -> Result<ScratchLease<'_>> {
        let slot = self.cache.try_lock().ok_or(SortError::ScratchBusy)?;
        Ok(ScratchLease {
            device: &self.device,
            slot,
        })
    }

    /// Sort `buffer` with the default 4-way specialization.
    pub fn sort<T, E>(&self, stream: &Stream, buffer: &mut DeviceBuffer<T>) -> Result<()>
    where
        T: Pod + Send + Sync,
        E: DigitExtractor<T>,
    {
        self.sort_with::<T, E, Radix4>(stream, buffer)
    }

    /// Sort `buffer` with specialization `S`.
    pub fn sort_with<T, E, S>(&self, stream: &Stream, buffer: &mut DeviceBuffer<T>) -> Result<()>
    where
        T: Pod + Send + Sync,
        E: DigitExtractor<T>,
        S: Specialization,
    {
        let mut lease = self.checkout()?;
        let sorter = RadixSort::<T, E, S>::new(&self.device);
        let scratch = lease.reserve(sorter.temp_storage_size(buffer.len()));
        sorter.sort(stream, buffer, scratch)
    }

    /// Slots currently held by the cache. Blocks while a lease is live.
    pub fn cached_scratch_len(&self) -> usize {
        let cache = self.cache.lock();
        Option::as_ref(&*cache).map_or(0, ScratchBuffer::len)
    }

    /// Release the cached scratch.
    pub fn dispose(self) {
        let released = self.cached_scratch_len();
        debug!(released, "disposing radix sort provider");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Ascending;
    use accel_runtime::CpuConfig;

    #[test]
    fn test_scratch_grows_and_is_reused() {
        let device = Device::cpu_with_config(CpuConfig { workers: Some(2) });
        let stream = Stream::new(&device);
        let provider = RadixSortProvider::new(&device);
        assert_eq!(provider.cached_scratch_len(), 0);

        let mut big = DeviceBuffer::from_slice(&device, &[9u32, 4, 7, 1, 8]);
        provider.sort::<u32, Ascending>(&stream, &mut big).unwrap();
        let grown = provider.cached_scratch_len();
        assert!(grown > 0);

        let mut small = DeviceBuffer::from_slice(&device, &[2u32, 1]);
        provider.sort::<u32, Ascending>(&stream, &mut small).unwrap();
        assert_eq!(provider.cached_scratch_len(), grown);

        assert_eq!(big.to_vec().unwrap(), vec![1, 4, 7, 8, 9]);
        assert_eq!(small.to_vec().unwrap(), vec![1, 2]);
        provider.dispose();
    }

    #[test]
    fn test_second_checkout_is_busy() {
        let device = Device::cpu();
        let stream = Stream::new(&device);
        let provider = RadixSortProvider::new(&device);
        let lease = provider.checkout().unwrap();

        let mut buffer = DeviceBuffer::from_slice(&device, &[3u8, 1, 2]);
        assert_eq!(
            provider.sort::<u8, Ascending>(&stream, &mut buffer),
            Err(SortError::ScratchBusy)
        );
        assert_eq!(stream.launch_count(), 0);

        drop(lease);
        provider.sort::<u8, Ascending>(&stream, &mut buffer).unwrap();
        assert_eq!(buffer.to_vec().unwrap(), vec![1, 2, 3]);
    }
}
