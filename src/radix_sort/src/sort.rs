//! Pass orchestration.
//!
//! # Algorithm
//!
//! For each digit window, least significant first:
//! 1. **Zero** the counter table
//! 2. **Histogram**: count digits per virtual group and pre-scatter every
//!    group's keys into digit order (current -> alternate)
//! 3. **Scan**: inclusive scan of the digit-major counter table
//! 4. **Reposition**: move every key to its global slot (current -> alternate)
//!
//! All launches go to the caller's stream in order, so pass `k + 1` only
//! reads what pass `k` wrote. Both scatters flip the buffer pair, which leaves
//! the data in the caller's buffer after every full pass.

use std::marker::PhantomData;

use accel_runtime::{
    Device, DeviceBuffer, DeviceKind, GridLayout, InclusiveScan, RuntimeError, ScratchBuffer,
    Stream, TileLayout, SCRATCH_ALIGN,
};
use bytemuck::Pod;
use tracing::{debug, trace};

use crate::buffers::{BufferPair, ScratchArena};
use crate::error::{Result, SortError};
use crate::key::DigitExtractor;
use crate::sizing::TempStorageLayout;
use crate::specialization::{Radix4, Specialization};
use crate::{cpu, gpu};

/// Kernel family used for the passes, picked from the device kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKernels {
    /// Sequential tiles, one per CPU worker.
    Tiles(TileLayout),
    /// Cooperative thread teams over a grid-stride loop.
    Teams(GridLayout),
}

impl PassKernels {
    pub fn select(device: &Device, length: usize) -> Self {
        match device.kind() {
            DeviceKind::Cpu => Self::Tiles(device.tile_layout(length)),
            DeviceKind::Accelerator => Self::Teams(device.grid_layout(length)),
        }
    }

    /// Columns of the counter table.
    pub fn virtual_groups(&self) -> usize {
        match self {
            Self::Tiles(layout) => layout.num_tiles,
            Self::Teams(layout) => layout.virtual_groups(),
        }
    }

    fn histogram<T, E, S>(
        &self,
        stream: &Stream,
        shift: u32,
        keys: &[T],
        alternate: &mut [T],
        counters: &mut [u32],
    ) -> Result<()>
    where
        T: Pod + Send + Sync,
        E: DigitExtractor<T>,
        S: Specialization,
    {
        match self {
            Self::Tiles(layout) => {
                cpu::histogram::<T, E, S>(stream, layout, shift, keys, alternate, counters)
            }
            Self::Teams(layout) => {
                gpu::histogram::<T, E, S>(stream, layout, shift, keys, alternate, counters)
            }
        }
    }

    fn reposition<T, E, S>(
        &self,
        stream: &Stream,
        shift: u32,
        keys: &[T],
        alternate: &mut [T],
        scanned: &[u32],
    ) -> Result<()>
    where
        T: Pod + Send + Sync,
        E: DigitExtractor<T>,
        S: Specialization,
    {
        match self {
            Self::Tiles(layout) => {
                cpu::reposition::<T, E, S>(stream, layout, shift, keys, alternate, scanned)
            }
            Self::Teams(layout) => {
                gpu::reposition::<T, E, S>(stream, layout, shift, keys, alternate, scanned)
            }
        }
    }
}

/// Receives the counter table of every pass once it has been scanned.
pub trait PassObserver {
    fn pass_completed(&mut self, pass: u32, shift: u32, counters: &[u32]);
}

struct Unobserved;

impl PassObserver for Unobserved {
    fn pass_completed(&mut self, _pass: u32, _shift: u32, _counters: &[u32]) {}
}

impl<F: FnMut(u32, u32, &[u32])> PassObserver for F {
    fn pass_completed(&mut self, pass: u32, shift: u32, counters: &[u32]) {
        self(pass, shift, counters)
    }
}

/// Reusable radix sort bound to a device, key type, extractor and
/// specialization.
///
/// # Example
///
/// ```ignore
/// let sort = create_radix_sort::<u32, Ascending>(&device);
/// let mut scratch = ScratchBuffer::new(&device, sort.temp_storage_size(buffer.len()));
/// sort.sort(&stream, &mut buffer, &mut scratch)?;
/// stream.synchronize()?;
/// ```
#[derive(Debug, Clone)]
pub struct RadixSort<T, E, S = Radix4> {
    device: Device,
    scan: InclusiveScan,
    _marker: PhantomData<fn() -> (T, E, S)>,
}

impl<T, E, S> RadixSort<T, E, S>
where
    T: Pod + Send + Sync,
    E: DigitExtractor<T>,
    S: Specialization,
{
    pub fn new(device: &Device) -> Self {
        Self {
            device: device.clone(),
            scan: InclusiveScan::new(device),
            _marker: PhantomData,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Passes of a full sort.
    pub fn pass_count() -> u32 {
        S::pass_count(E::TOTAL_BITS)
    }

    /// Scratch slots needed to sort `length` keys.
    pub fn temp_storage_size(&self, length: usize) -> usize {
        TempStorageLayout::compute::<T, S>(&self.device, length).total()
    }

    /// Sort `buffer` in place.
    ///
    /// # Arguments
    /// * `stream` - Stream on the sort's device
    /// * `buffer` - Keys to sort
    /// * `scratch` - At least [`temp_storage_size`](Self::temp_storage_size) slots
    pub fn sort(
        &self,
        stream: &Stream,
        buffer: &mut DeviceBuffer<T>,
        scratch: &mut ScratchBuffer,
    ) -> Result<()> {
        self.run(stream, buffer, scratch, Self::pass_count(), &mut Unobserved)
    }

    /// Sort `buffer` in place, reporting every pass's counter table.
    pub fn sort_observed(
        &self,
        stream: &Stream,
        buffer: &mut DeviceBuffer<T>,
        scratch: &mut ScratchBuffer,
        observer: &mut dyn PassObserver,
    ) -> Result<()> {
        self.run(stream, buffer, scratch, Self::pass_count(), observer)
    }

    /// Run only the first `passes` passes, ordering `buffer` by its
    /// `passes * BIT_INCREMENT` least significant extracted bits.
    pub fn sort_passes(
        &self,
        stream: &Stream,
        buffer: &mut DeviceBuffer<T>,
        scratch: &mut ScratchBuffer,
        passes: u32,
    ) -> Result<()> {
        let passes = passes.min(Self::pass_count());
        self.run(stream, buffer, scratch, passes, &mut Unobserved)
    }

    fn validate(&self, stream: &Stream, buffer: &DeviceBuffer<T>) -> Result<()> {
        if stream.device() != &self.device {
            return Err(SortError::InvalidArgument(format!(
                "stream runs on device #{} but the sort was created for device #{}",
                stream.device().id(),
                self.device.id()
            )));
        }
        stream.check_buffer(buffer).map_err(|err| match err {
            RuntimeError::BufferReleased => {
                SortError::InvalidArgument("input buffer has been released".to_string())
            }
            other => SortError::InvalidArgument(other.to_string()),
        })?;
        let (size, align) = (std::mem::size_of::<T>(), std::mem::align_of::<T>());
        if size == 0 || align > SCRATCH_ALIGN {
            return Err(SortError::UnsupportedKeyLayout { size, align });
        }
        Ok(())
    }

    fn run(
        &self,
        stream: &Stream,
        buffer: &mut DeviceBuffer<T>,
        scratch: &mut ScratchBuffer,
        passes: u32,
        observer: &mut dyn PassObserver,
    ) -> Result<()> {
        self.validate(stream, buffer)?;
        let n = buffer.len();
        if n == 0 {
            debug!("radix sort of an empty buffer");
            return Ok(());
        }
        stream
            .check_scratch(scratch)
            .map_err(|err| SortError::InvalidArgument(err.to_string()))?;

        let layout = TempStorageLayout::compute::<T, S>(&self.device, n);
        let required = layout.total();
        if scratch.len() < required {
            return Err(SortError::UndersizedScratch {
                required,
                provided: scratch.len(),
            });
        }

        let kernels = PassKernels::select(&self.device, n);
        if let PassKernels::Teams(grid) = kernels {
            let requested = gpu::histogram::shared_bytes::<S>(grid.group_size);
            let available = self.device.shared_memory_bytes();
            if requested > available {
                return Err(RuntimeError::SharedMemoryExceeded {
                    requested,
                    available,
                }
                .into());
            }
        }
        debug!(
            len = n,
            passes,
            device = ?self.device.kind(),
            groups = kernels.virtual_groups(),
            scratch = required,
            "radix sort"
        );

        let mut arena = ScratchArena::new(scratch.words_mut());
        let temporary = arena.take_keys::<T>(n)?;
        let counters = arena.take(layout.counter_len)?;
        let scanned = arena.take(layout.counter_len)?;
        let scan_temp = arena.take(layout.scan_temp)?;
        let mut pair = BufferPair::new(buffer.as_mut_slice()?, temporary)?;

        for pass in 0..passes {
            let shift = pass * S::BIT_INCREMENT;
            trace!(pass, shift, "radix pass");

            stream.fill("radix_zero_counters", counters, 0)?;

            let (current, alternate) = pair.split();
            kernels.histogram::<T, E, S>(stream, shift, current, alternate, counters)?;
            pair.flip();

            self.scan.scan(stream, counters, scanned, scan_temp)?;
            observer.pass_completed(pass, shift, counters);

            let (current, alternate) = pair.split();
            kernels.reposition::<T, E, S>(stream, shift, current, alternate, scanned)?;
            pair.flip();
        }

        pair.finish(stream)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{Ascending, Descending};
    use crate::specialization::Radix16;
    use accel_runtime::{AcceleratorConfig, CpuConfig};

    fn devices() -> Vec<Device> {
        vec![
            Device::cpu_with_config(CpuConfig { workers: Some(3) }),
            Device::accelerator(AcceleratorConfig {
                group_size: 8,
                max_resident_groups: 2,
                ..Default::default()
            }),
        ]
    }

    fn run<T, E, S>(device: &Device, keys: &[T]) -> Vec<T>
    where
        T: Pod + Send + Sync,
        E: DigitExtractor<T>,
        S: Specialization,
    {
        let stream = Stream::new(device);
        let sort = RadixSort::<T, E, S>::new(device);
        let mut buffer = DeviceBuffer::from_slice(device, keys);
        let mut scratch = ScratchBuffer::new(device, sort.temp_storage_size(keys.len()));
        sort.sort(&stream, &mut buffer, &mut scratch).unwrap();
        stream.synchronize().unwrap();
        buffer.to_vec().unwrap()
    }

    #[test]
    fn test_sort_u16_both_families() {
        let keys: Vec<u16> = (0..100u16).map(|i| i.wrapping_mul(7919) ^ 0x5A5A).collect();
        let mut expected = keys.clone();
        expected.sort_unstable();
        for device in devices() {
            assert_eq!(run::<u16, Ascending, Radix4>(&device, &keys), expected);
            assert_eq!(run::<u16, Ascending, Radix16>(&device, &keys), expected);
        }
    }

    #[test]
    fn test_sort_descending() {
        let keys = vec![4i32, -9, 0, 17, -9, 3];
        for device in devices() {
            assert_eq!(
                run::<i32, Descending, Radix4>(&device, &keys),
                vec![17, 4, 3, 0, -9, -9]
            );
        }
    }

    #[test]
    fn test_launches_per_pass() {
        let device = Device::cpu_with_config(CpuConfig { workers: Some(2) });
        let stream = Stream::new(&device);
        let sort = RadixSort::<u8, Ascending, Radix4>::new(&device);
        let mut buffer = DeviceBuffer::from_slice(&device, &[9u8, 1, 5]);
        let mut scratch = ScratchBuffer::new(&device, sort.temp_storage_size(3));
        sort.sort(&stream, &mut buffer, &mut scratch).unwrap();

        // zero + histogram + 3 scan phases + reposition; no copy-back.
        assert_eq!(stream.launch_count(), 4 * 6);
        assert_eq!(buffer.to_vec().unwrap(), vec![1, 5, 9]);
    }

    #[test]
    fn test_pass_kernels_follow_device_kind() {
        let [cpu, accelerator]: [Device; 2] = devices().try_into().unwrap();
        assert!(matches!(PassKernels::select(&cpu, 10), PassKernels::Tiles(_)));
        assert!(matches!(
            PassKernels::select(&accelerator, 10),
            PassKernels::Teams(_)
        ));
        assert_eq!(PassKernels::select(&cpu, 10).virtual_groups(), 3);
    }
}
