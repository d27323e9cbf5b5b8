//! Team histogram pass.
//!
//! # Algorithm
//!
//! Each group walks its grid-stride chunks. For chunk `c` (base `c * group_size`):
//! 1. **Mark**: every lane loads its key (or the neutral key past the end),
//!    extracts the digit and, when in range, sets its one-hot flag in the
//!    shared `DIGIT_COUNT x group_size` flag table
//! 2. **Rank**: each digit row is scanned cooperatively; a lane's rank among
//!    same-digit lanes is its inclusive count minus its own flag
//! 3. **Totals**: the last lane publishes each row's total to
//!    `counters[digit * G + c]`
//! 4. **Pre-scatter**: in-range lanes write their key to
//!    `base + lower_digit_totals + rank` of the alternate buffer, leaving the
//!    chunk partitioned by digit
//!
//! A barrier separates each shared-memory write phase from its readers.

use accel_runtime::{GlobalView, GridLayout, LaunchDomain, Stream};
use bytemuck::Pod;

use crate::error::Result;
use crate::key::DigitExtractor;
use crate::specialization::Specialization;

/// Shared bytes used by one team.
pub fn shared_bytes<S: Specialization>(group_size: usize) -> usize {
    S::DIGIT_COUNT * group_size * std::mem::size_of::<u32>()
}

/// Run the histogram pass for bit offset `shift`.
///
/// # Arguments
/// * `keys` - Current buffer
/// * `alternate` - Receives each chunk's digit-partitioned run
/// * `counters` - Zeroed `DIGIT_COUNT * G` counter table
pub fn histogram<T, E, S>(
    stream: &Stream,
    layout: &GridLayout,
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
    let n = keys.len();
    let digits = S::DIGIT_COUNT;
    let mask = S::digit_mask();
    let groups = layout.virtual_groups();
    let iterations = layout.iterations;
    debug_assert_eq!(counters.len(), digits * groups);

    let out = GlobalView::new(alternate);
    let table = GlobalView::new(counters);

    stream.launch_teams(
        "radix_histogram",
        LaunchDomain::from_grid(layout),
        shared_bytes::<S>(layout.group_size),
        |team| {
            let size = team.group_size();
            let mut flags = team.shared::<u32>(digits * size);

            for iteration in 0..iterations {
                let chunk = iteration * team.num_groups() + team.group_index();
                let base = chunk * size;

                for lane in team.lanes() {
                    for digit in 0..digits {
                        flags[digit * size + lane] = 0;
                    }
                    let index = base + lane;
                    let key = if index < n { keys[index] } else { E::neutral() };
                    let digit = E::extract_digit(key, shift, mask) as usize;
                    if index < n {
                        flags[digit * size + lane] = 1;
                    }
                }
                team.barrier();

                team.inclusive_scan_rows(&mut flags, digits);

                for lane in team.lanes() {
                    if team.is_last_lane(lane) {
                        for digit in 0..digits {
                            let total = flags[digit * size + lane];
                            // SAFETY: one writer per (digit, chunk).
                            unsafe { table.store(digit * groups + chunk, total) };
                        }
                    }
                }

                for lane in team.lanes() {
                    let index = base + lane;
                    if index >= n {
                        continue;
                    }
                    let key = keys[index];
                    let digit = E::extract_digit(key, shift, mask) as usize;
                    let rank = flags[digit * size + lane] as usize - 1;
                    let lower: usize = (0..digit)
                        .map(|d| flags[d * size + size - 1] as usize)
                        .sum();
                    // SAFETY: ranks are unique within a digit and digit runs
                    // tile the chunk window.
                    unsafe { out.store(base + lower + rank, key) };
                }
                // Flags are reused by the next chunk.
                team.barrier();
            }
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Ascending;
    use crate::specialization::Radix4;
    use accel_runtime::{AcceleratorConfig, Device};

    #[test]
    fn test_chunks_are_partitioned_by_digit() {
        let device = Device::accelerator(AcceleratorConfig {
            group_size: 4,
            max_resident_groups: 1,
            ..Default::default()
        });
        let stream = Stream::new(&device);
        let keys = vec![3u8, 0, 2, 0, 1, 3, 1];
        let layout = device.grid_layout(keys.len());
        assert_eq!(layout.virtual_groups(), 2);

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

        // chunk 0 = [3,0,2,0], chunk 1 = [1,3,1]
        assert_eq!(alternate, vec![0, 0, 2, 3, 1, 1, 3]);
        // digit-major: [d0c0, d0c1, d1c0, d1c1, ...]
        assert_eq!(counters, vec![2, 0, 0, 2, 1, 0, 1, 1]);
    }
}
