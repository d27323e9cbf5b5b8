//! Host-emulated accelerator runtime.
//!
//! This crate provides the device-side collaborators used by `radix_sort`:
//! - Device capability queries (kind, concurrency, grid sizing)
//! - In-order execution streams with team and tile launches
//! - Thread teams with group-shared memory and barriers
//! - Device buffers, `int`-slot scratch storage and kernel write views
//! - A device-wide inclusive scan
//!
//! # Example
//!
//! ```ignore
//! use accel_runtime::{Device, InclusiveScan, Stream};
//!
//! let device = Device::from_env();
//! let stream = Stream::new(&device);
//! let scan = InclusiveScan::new(&device);
//! let mut temp = vec![0u32; scan.temp_storage_size(input.len())];
//! scan.scan(&stream, &input, &mut output, &mut temp)?;
//! stream.synchronize()?;
//! ```

pub mod device;
pub mod error;
pub mod memory;
pub mod scan;
pub mod stream;
pub mod team;

pub use device::{
    AcceleratorConfig, CpuConfig, Device, DeviceKind, GridLayout, TileLayout, DEVICE_ENV,
};
pub use error::{Result, RuntimeError};
pub use memory::{DeviceBuffer, GlobalView, ScratchBuffer, SCRATCH_ALIGN, SCRATCH_SLOT_BYTES};
pub use scan::{exclusive_scan_cpu, inclusive_scan_cpu, InclusiveScan, ScanConfig};
pub use stream::{LaunchDomain, Stream};
pub use team::{SharedMemory, Team};
