//! Device capability queries.
//!
//! A [`Device`] describes where kernels run: either a general-purpose
//! multi-core host (tiles of work, one per worker) or an accelerator that
//! executes fixed-size thread teams over a grid-stride loop. Accelerators are
//! emulated on the host, but expose the same sizing queries a real device
//! would (group size, resident groups, shared memory per group).

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Environment variable consulted by [`Device::from_env`].
pub const DEVICE_ENV: &str = "ACCEL_DEVICE";

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Kind of compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// General-purpose multi-core host.
    Cpu,
    /// Massively parallel device executing cooperative thread teams.
    Accelerator,
}

/// Configuration for an accelerator device.
#[derive(Debug, Clone)]
pub struct AcceleratorConfig {
    /// Human-readable device name.
    pub name: String,
    /// Lanes per thread team.
    pub group_size: usize,
    /// Maximum number of groups resident at once (grid width).
    pub max_resident_groups: usize,
    /// Group-shared memory available to one team, in bytes.
    pub shared_memory_bytes: usize,
}

impl Default for AcceleratorConfig {
    fn default() -> Self {
        Self {
            name: "emulated-accelerator".to_string(),
            group_size: 64,
            max_resident_groups: 64,
            shared_memory_bytes: 48 * 1024,
        }
    }
}

/// Configuration for a CPU device.
#[derive(Debug, Clone, Default)]
pub struct CpuConfig {
    /// Number of workers (tiles). Defaults to rayon's thread count.
    pub workers: Option<usize>,
}

#[derive(Debug)]
struct DeviceInfo {
    id: u64,
    kind: DeviceKind,
    name: String,
    max_concurrency: usize,
    group_size: usize,
    shared_memory_bytes: usize,
}

/// Handle to a compute device. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Device {
    info: Arc<DeviceInfo>,
}

impl Device {
    /// Host device with one worker per rayon thread.
    pub fn cpu() -> Self {
        Self::cpu_with_config(CpuConfig::default())
    }

    /// Host device with an explicit worker count.
    pub fn cpu_with_config(config: CpuConfig) -> Self {
        let workers = config
            .workers
            .unwrap_or_else(rayon::current_num_threads)
            .max(1);
        Self::from_info(DeviceKind::Cpu, "host".to_string(), workers, 1, 0)
    }

    /// Accelerator device described by `config`.
    pub fn accelerator(config: AcceleratorConfig) -> Self {
        Self::from_info(
            DeviceKind::Accelerator,
            config.name,
            config.max_resident_groups.max(1),
            config.group_size.max(1),
            config.shared_memory_bytes,
        )
    }

    /// Pick a device from the `ACCEL_DEVICE` environment variable.
    ///
    /// `accelerator` (or `gpu`) selects the default accelerator; anything
    /// else, including an unset variable, selects the host.
    pub fn from_env() -> Self {
        match std::env::var(DEVICE_ENV).as_deref() {
            Ok("accelerator") | Ok("gpu") => Self::accelerator(AcceleratorConfig::default()),
            _ => Self::cpu(),
        }
    }

    fn from_info(
        kind: DeviceKind,
        name: String,
        max_concurrency: usize,
        group_size: usize,
        shared_memory_bytes: usize,
    ) -> Self {
        let id = NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            info: Arc::new(DeviceInfo {
                id,
                kind,
                name,
                max_concurrency,
                group_size,
                shared_memory_bytes,
            }),
        }
    }

    /// Unique id of this device instance.
    pub fn id(&self) -> u64 {
        self.info.id
    }

    pub fn kind(&self) -> DeviceKind {
        self.info.kind
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Workers on a CPU device, resident groups on an accelerator.
    pub fn max_concurrency(&self) -> usize {
        self.info.max_concurrency
    }

    /// Lanes per thread team (1 on CPU devices).
    pub fn group_size(&self) -> usize {
        self.info.group_size
    }

    pub fn shared_memory_bytes(&self) -> usize {
        self.info.shared_memory_bytes
    }

    /// Grid sizing for a grid-stride loop over `length` elements.
    ///
    /// The grid is never wider than the resident-group limit; the remaining
    /// work is covered by extra iterations of each group.
    pub fn grid_layout(&self, length: usize) -> GridLayout {
        let group_size = self.info.group_size;
        let chunks = length.max(1).div_ceil(group_size);
        let num_groups = chunks.min(self.info.max_concurrency).max(1);
        let iterations = chunks.div_ceil(num_groups);
        GridLayout {
            num_groups,
            group_size,
            iterations,
        }
    }

    /// Even partition of `length` elements across the device's workers.
    pub fn tile_layout(&self, length: usize) -> TileLayout {
        TileLayout::new(length, self.info.max_concurrency)
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.info.id == other.info.id
    }
}

impl Eq for Device {}

/// Shape of a grid-stride launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Groups launched.
    pub num_groups: usize,
    /// Lanes per group.
    pub group_size: usize,
    /// Grid-stride iterations each group performs.
    pub iterations: usize,
}

impl GridLayout {
    /// Distance between a lane's consecutive elements.
    pub fn grid_stride(&self) -> usize {
        self.num_groups * self.group_size
    }

    /// Number of group-sized chunks the whole grid covers.
    ///
    /// Chunk `iteration * num_groups + group` is handled by `group` during
    /// `iteration`, so chunks are ordered like the input.
    pub fn virtual_groups(&self) -> usize {
        self.num_groups * self.iterations
    }

    /// `length` rounded up to a whole number of groups.
    pub fn padded_length(&self, length: usize) -> usize {
        length.div_ceil(self.group_size) * self.group_size
    }
}

/// Contiguous partition of the input across CPU workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    pub num_tiles: usize,
    pub tile_len: usize,
    pub length: usize,
}

impl TileLayout {
    pub fn new(length: usize, workers: usize) -> Self {
        let num_tiles = workers.max(1);
        Self {
            num_tiles,
            tile_len: length / num_tiles,
            length,
        }
    }

    /// Element range owned by `tile`. The last tile absorbs the remainder.
    pub fn tile(&self, tile: usize) -> Range<usize> {
        let start = tile * self.tile_len;
        let end = if tile + 1 == self.num_tiles {
            self.length
        } else {
            start + self.tile_len
        };
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accelerator(group_size: usize, groups: usize) -> Device {
        Device::accelerator(AcceleratorConfig {
            group_size,
            max_resident_groups: groups,
            ..Default::default()
        })
    }

    #[test]
    fn test_grid_layout_small_input() {
        let layout = accelerator(32, 8).grid_layout(5);
        assert_eq!(layout.num_groups, 1);
        assert_eq!(layout.iterations, 1);
        assert_eq!(layout.padded_length(5), 32);
    }

    #[test]
    fn test_grid_layout_wraps_with_iterations() {
        // 1000 elements / 32 lanes = 32 chunks over at most 8 groups.
        let layout = accelerator(32, 8).grid_layout(1000);
        assert_eq!(layout.num_groups, 8);
        assert_eq!(layout.iterations, 4);
        assert_eq!(layout.grid_stride(), 256);
        assert!(layout.virtual_groups() * 32 >= layout.padded_length(1000));
    }

    #[test]
    fn test_grid_layout_empty_input_still_has_one_group() {
        let layout = accelerator(16, 4).grid_layout(0);
        assert_eq!(layout.num_groups, 1);
        assert_eq!(layout.iterations, 1);
    }

    #[test]
    fn test_tile_layout_remainder_goes_to_last_tile() {
        let layout = TileLayout::new(10, 3);
        assert_eq!(layout.tile(0), 0..3);
        assert_eq!(layout.tile(1), 3..6);
        assert_eq!(layout.tile(2), 6..10);
    }

    #[test]
    fn test_tile_layout_more_workers_than_elements() {
        let layout = TileLayout::new(2, 4);
        assert!(layout.tile(0).is_empty());
        assert!(layout.tile(2).is_empty());
        assert_eq!(layout.tile(3), 0..2);
    }

    #[test]
    fn test_cpu_device_workers() {
        let device = Device::cpu_with_config(CpuConfig { workers: Some(3) });
        assert_eq!(device.kind(), DeviceKind::Cpu);
        assert_eq!(device.max_concurrency(), 3);
        assert_eq!(device.group_size(), 1);
        assert_eq!(device.tile_layout(7).num_tiles, 3);
    }

    #[test]
    fn test_devices_compare_by_identity() {
        let a = Device::cpu();
        let b = Device::cpu();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
