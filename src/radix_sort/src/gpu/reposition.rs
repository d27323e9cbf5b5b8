//! Team repositioning pass.
//!
//! Reads the digit-partitioned chunks left by the histogram pass and moves
//! every key to its global position. Lane `p` of chunk `c` holding digit `d`
//! goes to `exclusive(d, c) + p - lower_total(d, c)`; all three terms come
//! from the scanned counter table, so no shared memory is needed.

use accel_runtime::{GlobalView, GridLayout, LaunchDomain, Stream};
use bytemuck::Pod;

use crate::counters::ScannedCounters;
use crate::error::Result;
use crate::key::DigitExtractor;
use crate::specialization::Specialization;

pub fn reposition<T, E, S>(
    stream: &Stream,
    layout: &GridLayout,
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
    let n = keys.len();
    let mask = S::digit_mask();
    let iterations = layout.iterations;
    let table = ScannedCounters::new(scanned, layout.virtual_groups());
    let out = GlobalView::new(alternate);

    stream.launch_teams(
        "radix_reposition",
        LaunchDomain::from_grid(layout),
        0,
        |team| {
            let size = team.group_size();
            for iteration in 0..iterations {
                let chunk = iteration * team.num_groups() + team.group_index();
                let base = chunk * size;
                for lane in team.lanes() {
                    let index = base + lane;
                    if index >= n {
                        continue;
                    }
                    let key = keys[index];
                    let digit = E::extract_digit(key, shift, mask) as usize;
                    let dest = table.destination(digit, chunk, lane);
                    // SAFETY: destinations form a permutation of 0..n.
                    unsafe { out.store(dest, key) };
                }
            }
        },
    )?;
    Ok(())
}
