//! Temp-storage sizing.
//!
//! Scratch is measured in `int` slots and carved, in this order, into:
//!
//! | View | Slots |
//! |---|---|
//! | temporary keys | `ceil(length * size_of::<T>() / 4)` |
//! | counter table | `G * DIGIT_COUNT` |
//! | scanned table | `G * DIGIT_COUNT` |
//! | scan temp | scan primitive's requirement for `G * DIGIT_COUNT` |
//!
//! `G` is the number of virtual groups: tiles on a CPU, grid-stride chunks
//! on an accelerator.

use accel_runtime::{Device, InclusiveScan};

use crate::buffers::key_slots;
use crate::sort::PassKernels;
use crate::specialization::Specialization;

/// Scratch footprint of one sort call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempStorageLayout {
    pub virtual_groups: usize,
    pub counter_len: usize,
    pub key_slots: usize,
    pub scan_temp: usize,
}

impl TempStorageLayout {
    /// Layout for sorting `length` keys of type `T` on `device`.
    pub fn compute<T, S: Specialization>(device: &Device, length: usize) -> Self {
        let virtual_groups = PassKernels::select(device, length).virtual_groups();
        let counter_len = virtual_groups * S::DIGIT_COUNT;
        Self {
            virtual_groups,
            counter_len,
            key_slots: key_slots::<T>(length),
            scan_temp: InclusiveScan::new(device).temp_storage_size(counter_len),
        }
    }

    /// Total slots.
    pub fn total(&self) -> usize {
        self.key_slots + 2 * self.counter_len + self.scan_temp
    }
}

/// Scratch slots needed to sort `length` keys of type `T` on `device`.
///
/// Must be called with the same length later passed to the sort.
pub fn compute_temp_storage_size<T, S: Specialization>(device: &Device, length: usize) -> usize {
    TempStorageLayout::compute::<T, S>(device, length).total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specialization::{Radix16, Radix4};
    use accel_runtime::{AcceleratorConfig, CpuConfig};

    #[test]
    fn test_cpu_layout() {
        let device = Device::cpu_with_config(CpuConfig { workers: Some(4) });
        let layout = TempStorageLayout::compute::<u32, Radix4>(&device, 100);
        assert_eq!(layout.virtual_groups, 4);
        assert_eq!(layout.counter_len, 16);
        assert_eq!(layout.key_slots, 100);
        assert_eq!(layout.scan_temp, 1);
        assert_eq!(layout.total(), 100 + 32 + 1);
    }

    #[test]
    fn test_accelerator_layout_counts_chunks() {
        let device = Device::accelerator(AcceleratorConfig {
            group_size: 8,
            max_resident_groups: 2,
            ..Default::default()
        });
        // 37 keys -> 5 chunks -> 2 groups x 3 iterations = 6 virtual groups.
        let layout = TempStorageLayout::compute::<u8, Radix16>(&device, 37);
        assert_eq!(layout.virtual_groups, 6);
        assert_eq!(layout.counter_len, 96);
        assert_eq!(layout.key_slots, 10);
        assert_eq!(
            compute_temp_storage_size::<u8, Radix16>(&device, 37),
            10 + 192 + 1
        );
    }
}
