//! Data-parallel LSD radix sort for CPU and accelerator devices.
//!
//! Keys are sorted digit by digit, least significant first. Each pass counts
//! digits per virtual group, scans the counter table across groups and
//! scatters every key to its global slot. Two kernel families implement the
//! passes:
//! - [`gpu`]: cooperative thread teams with group-shared memory and barriers
//! - [`cpu`]: one sequential tile per worker
//!
//! The family is picked from the device kind; everything else (sizing,
//! scratch layout, pass loop, buffer roles) is shared.
//!
//! # Example
//!
//! ```ignore
//! use accel_runtime::{Device, DeviceBuffer, Stream};
//! use radix_sort::{create_radix_sort_provider, Ascending};
//!
//! let device = Device::from_env();
//! let stream = Stream::new(&device);
//! let provider = create_radix_sort_provider(&device);
//!
//! let mut keys = DeviceBuffer::from_slice(&device, &[5u32, 3, 1, 4, 2]);
//! provider.sort::<u32, Ascending>(&stream, &mut keys)?;
//! stream.synchronize()?;
//! ```

pub mod buffers;
pub mod counters;
pub mod cpu;
pub mod error;
pub mod gpu;
pub mod key;
pub mod provider;
pub mod reference;
pub mod sizing;
pub mod sort;
pub mod specialization;

use accel_runtime::Device;
use bytemuck::Pod;

pub use buffers::{BufferPair, Role, ScratchArena};
pub use error::{Result, SortError};
pub use key::{sort_key, Ascending, Descending, DigitExtractor, OrderedBits};
pub use provider::{RadixSortProvider, ScratchLease};
pub use sizing::{compute_temp_storage_size, TempStorageLayout};
pub use sort::{PassKernels, PassObserver, RadixSort};
pub use specialization::{Radix16, Radix4, Specialization};

/// Create a reusable 4-way radix sort for key type `T` on `device`.
pub fn create_radix_sort<T, E>(device: &Device) -> RadixSort<T, E, Radix4>
where
    T: Pod + Send + Sync,
    E: DigitExtractor<T>,
{
    RadixSort::new(device)
}

/// Create a provider that manages scratch storage itself.
pub fn create_radix_sort_provider(device: &Device) -> RadixSortProvider {
    RadixSortProvider::new(device)
}
