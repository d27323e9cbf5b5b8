//! Inclusive prefix sum over `u32` counters.
//!
//! # Algorithm (blocked scan)
//!
//! The input is split into blocks of `block_size` elements:
//! 1. **Reduce**: every block sums its elements into one temp slot (parallel)
//! 2. **Block offsets**: the block sums are exclusively scanned in place
//! 3. **Local scan**: every block scans its elements, seeded with its offset
//!
//! Each phase is a separate launch on the caller's stream, so the phases are
//! ordered like any other stream work. Temp storage is one `int` slot per
//! block.

use tracing::trace;

use crate::device::Device;
use crate::error::{Result, RuntimeError};
use crate::memory::GlobalView;
use crate::stream::Stream;

/// Configuration for [`InclusiveScan`].
#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    /// Elements per block.
    pub block_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { block_size: 1024 }
    }
}

/// Device-wide inclusive scan primitive.
#[derive(Debug, Clone)]
pub struct InclusiveScan {
    device: Device,
    config: ScanConfig,
}

impl InclusiveScan {
    pub fn new(device: &Device) -> Self {
        Self::with_config(device, ScanConfig::default())
    }

    pub fn with_config(device: &Device, config: ScanConfig) -> Self {
        Self {
            device: device.clone(),
            config: ScanConfig {
                block_size: config.block_size.max(1),
            },
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Temp storage, in `int` slots, needed to scan `len` elements.
    pub fn temp_storage_size(&self, len: usize) -> usize {
        len.div_ceil(self.config.block_size)
    }

    /// Compute `output[i] = input[0] + ... + input[i]`.
    ///
    /// # Arguments
    /// * `stream` - Stream the three phases are issued on
    /// * `input` - Values to scan
    /// * `output` - Destination, same length as `input`
    /// * `temp` - At least [`temp_storage_size`](Self::temp_storage_size) slots
    pub fn scan(
        &self,
        stream: &Stream,
        input: &[u32],
        output: &mut [u32],
        temp: &mut [u32],
    ) -> Result<()> {
        if stream.device() != &self.device {
            return Err(RuntimeError::DeviceMismatch {
                buffer: self.device.id(),
                stream: stream.device().id(),
            });
        }
        let n = input.len();
        if output.len() != n {
            return Err(RuntimeError::ScanSizeMismatch {
                input: n,
                output: output.len(),
            });
        }
        let blocks = self.temp_storage_size(n);
        if temp.len() < blocks {
            return Err(RuntimeError::TempTooSmall {
                required: blocks,
                provided: temp.len(),
            });
        }
        if n == 0 {
            return Ok(());
        }
        let block_size = self.config.block_size;
        trace!(len = n, blocks, "inclusive scan");

        {
            let sums = GlobalView::new(&mut temp[..blocks]);
            stream.launch_tiles("scan_reduce", blocks, |block| {
                let start = block * block_size;
                let end = (start + block_size).min(n);
                let sum: u32 = input[start..end].iter().sum();
                // SAFETY: one block per slot.
                unsafe { sums.store(block, sum) };
            })?;
        }

        {
            let sums = GlobalView::new(&mut temp[..blocks]);
            stream.launch_tiles("scan_block_offsets", 1, |_| {
                let mut running = 0u32;
                for block in 0..blocks {
                    // SAFETY: single tile owns every slot.
                    unsafe {
                        let sum = sums.load(block);
                        sums.store(block, running);
                        running += sum;
                    }
                }
            })?;
        }

        let offsets = &temp[..blocks];
        let out = GlobalView::new(output);
        stream.launch_tiles("scan_local", blocks, |block| {
            let start = block * block_size;
            let end = (start + block_size).min(n);
            let mut running = offsets[block];
            for i in start..end {
                running += input[i];
                // SAFETY: blocks cover disjoint ranges of the output.
                unsafe { out.store(i, running) };
            }
        })
    }
}

/// Perform exclusive prefix sum (CPU reference implementation).
///
/// Exclusive scan: output[i] = input[0] + input[1] + ... + input[i-1]
/// (output[0] = 0)
///
/// # Arguments
/// * `input` - Input slice of u32 values
///
/// # Returns
/// Vector with exclusive prefix sums.
pub fn exclusive_scan_cpu(input: &[u32]) -> Vec<u32> {
    input
        .iter()
        .scan(0u32, |sum, &x| {
            let before = *sum;
            *sum += x;
            Some(before)
        })
        .collect()
}

/// Perform inclusive prefix sum (CPU reference implementation).
///
/// Inclusive scan: output[i] = input[0] + input[1] + ... + input[i]
pub fn inclusive_scan_cpu(input: &[u32]) -> Vec<u32> {
    input
        .iter()
        .scan(0u32, |sum, &x| {
            *sum += x;
            Some(*sum)
        })
        .collect()
}
