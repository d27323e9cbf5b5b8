//! Tile repositioning pass.

use accel_runtime::{GlobalView, Stream, TileLayout};
use bytemuck::Pod;

use crate::counters::ScannedCounters;
use crate::error::Result;
use crate::key::DigitExtractor;
use crate::specialization::Specialization;

/// Move every key of the digit-partitioned tiles to its global position.
pub fn reposition<T, E, S>(
    stream: &Stream,
    layout: &TileLayout,
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
    let mask = S::digit_mask();
    let table = ScannedCounters::new(scanned, layout.num_tiles);
    let out = GlobalView::new(alternate);

    stream.launch_tiles("radix_reposition_tiles", layout.num_tiles, |tile| {
        let range = layout.tile(tile);
        for (position, &key) in keys[range].iter().enumerate() {
            let digit = E::extract_digit(key, shift, mask) as usize;
            let dest = table.destination(digit, tile, position);
            // SAFETY: destinations form a permutation of 0..n.
            unsafe { out.store(dest, key) };
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Ascending;
    use crate::specialization::Radix4;
    use accel_runtime::{inclusive_scan_cpu, CpuConfig, Device};

    #[test]
    fn test_reposition_merges_tiles() {
        let device = Device::cpu_with_config(CpuConfig { workers: Some(2) });
        let stream = Stream::new(&device);
        let partitioned = vec![0u8, 2, 3, 0, 1, 1, 3];
        let scanned = inclusive_scan_cpu(&[1, 1, 0, 2, 1, 0, 1, 1]);
        let layout = device.tile_layout(partitioned.len());

        let mut out = vec![0u8; partitioned.len()];
        reposition::<u8, Ascending, Radix4>(&stream, &layout, 0, &partitioned, &mut out, &scanned)
            .unwrap();
        assert_eq!(out, vec![0, 0, 1, 1, 2, 3, 3]);
    }
}
