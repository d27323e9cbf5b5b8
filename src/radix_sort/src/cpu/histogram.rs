//! Tile histogram pass.
//!
//! Each worker owns a contiguous tile, counts its digits, publishes the counts
//! to `counters[digit * W + tile]`, and then rewrites its tile into the
//! alternate buffer grouped by digit. No synchronization is needed inside the
//! pass since tiles are disjoint.

use accel_runtime::{GlobalView, Stream, TileLayout};
use bytemuck::Pod;

use crate::error::Result;
use crate::key::DigitExtractor;
use crate::specialization::Specialization;

pub fn histogram<T, E, S>(
    stream: &Stream,
    layout: &TileLayout,
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
    let digits = S::DIGIT_COUNT;
    let mask = S::digit_mask();
    let tiles = layout.num_tiles;
    let out = GlobalView::new(alternate);
    let table = GlobalView::new(counters);

    stream.launch_tiles("radix_histogram_tiles", tiles, |tile| {
        let range = layout.tile(tile);
        let tile_keys = &keys[range.clone()];

        let mut counts = vec![0u32; digits];
        for &key in tile_keys {
            counts[E::extract_digit(key, shift, mask) as usize] += 1;
        }
        for (digit, &count) in counts.iter().enumerate() {
            // SAFETY: one writer per (digit, tile).
            unsafe { table.store(digit * tiles + tile, count) };
        }

        let mut offsets = vec![0usize; digits];
        let mut sum = 0;
        for (offset, &count) in offsets.iter_mut().zip(&counts) {
            *offset = sum;
            sum += count as usize;
        }

        for &key in tile_keys {
            let digit = E::extract_digit(key, shift, mask) as usize;
            // SAFETY: offsets stay inside this tile's range.
            unsafe { out.store(range.start + offsets[digit], key) };
            offsets[digit] += 1;
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Ascending;
    use crate::specialization::Radix4;
    use accel_runtime::{CpuConfig, Device};

    #[test]
    fn test_tiles_are_partitioned_by_digit() {
        let device = Device::cpu_with_config(CpuConfig { workers: Some(2) });
        let stream = Stream::new(&device);
        let keys = vec![3u8, 0, 2, 0, 1, 3, 1];
        let layout = device.tile_layout(keys.len());

        let mut alternate = vec![0u8; keys.len()];
        let mut counters = vec![0u32; 4 * 2];
        histogram::<u8, Ascending, Radix4>(
            &stream,
            &layout,
            0,
            &keys,
            &mut alternate,
            &mut counters,
        )
        .unwrap();

        // tile 0 = [3,0,2], tile 1 = [0,1,3,1]
        assert_eq!(alternate, vec![0, 2, 3, 0, 1, 1, 3]);
        assert_eq!(counters, vec![1, 1, 0, 2, 1, 0, 1, 1]);
    }
}
