//! Cooperative thread teams.
//!
//! A [`Team`] is one group of a team launch: `group_size` lanes that share a
//! declared block of group-local memory and synchronize with
//! [`Team::barrier`]. Kernels are written phase by phase:
//!
//! ```ignore
//! for lane in team.lanes() { /* phase 1: every lane */ }
//! team.barrier();
//! for lane in team.lanes() { /* phase 2 sees all phase-1 writes */ }
//! ```
//!
//! Each phase runs to completion for all lanes before the next phase starts,
//! which is exactly the guarantee a barrier gives on real hardware.

use std::ops::{Deref, DerefMut, Range};

use bytemuck::Pod;

/// Group-local memory allocated from a team's shared budget.
#[derive(Debug)]
pub struct SharedMemory<T> {
    data: Vec<T>,
}

impl<T> Deref for SharedMemory<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> DerefMut for SharedMemory<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// One thread team of a launch.
#[derive(Debug)]
pub struct Team {
    group_index: usize,
    num_groups: usize,
    group_size: usize,
    shared_budget: usize,
    shared_used: usize,
    barriers: usize,
}

impl Team {
    pub(crate) fn new(
        group_index: usize,
        num_groups: usize,
        group_size: usize,
        shared_budget: usize,
    ) -> Self {
        Self {
            group_index,
            num_groups,
            group_size,
            shared_budget,
            shared_used: 0,
            barriers: 0,
        }
    }

    pub fn group_index(&self) -> usize {
        self.group_index
    }

    pub fn num_groups(&self) -> usize {
        self.num_groups
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Elements between a lane's consecutive grid-stride iterations.
    pub fn grid_stride(&self) -> usize {
        self.num_groups * self.group_size
    }

    /// Lane indices of this team.
    pub fn lanes(&self) -> Range<usize> {
        0..self.group_size
    }

    pub fn is_last_lane(&self, lane: usize) -> bool {
        lane + 1 == self.group_size
    }

    /// Allocate zeroed group-shared memory.
    ///
    /// # Panics
    /// If the kernel allocates more than it declared at launch.
    pub fn shared<T: Pod>(&mut self, len: usize) -> SharedMemory<T> {
        self.shared_used += len * std::mem::size_of::<T>();
        assert!(
            self.shared_used <= self.shared_budget,
            "team allocated {} shared bytes but declared {}",
            self.shared_used,
            self.shared_budget
        );
        SharedMemory {
            data: vec![T::zeroed(); len],
        }
    }

    /// Group-wide synchronization point.
    pub fn barrier(&mut self) {
        self.barriers += 1;
    }

    /// Barriers executed so far by this team.
    pub fn barrier_count(&self) -> usize {
        self.barriers
    }

    /// Cooperative inclusive scan over `rows` independent rows of
    /// `group_size` entries each, laid out row after row.
    ///
    /// Hillis-Steele: `log2(group_size)` steps, one barrier per step. Within
    /// a step lanes are visited from high to low so each lane still reads its
    /// neighbour's value from the previous step.
    pub fn inclusive_scan_rows(&mut self, data: &mut [u32], rows: usize) {
        let n = self.group_size;
        assert_eq!(data.len(), rows * n, "scan rows do not match team size");

        let mut offset = 1;
        while offset < n {
            for row in data.chunks_exact_mut(n) {
                for lane in (offset..n).rev() {
                    row[lane] += row[lane - offset];
                }
            }
            self.barrier();
            offset <<= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_scan_rows() {
        let mut team = Team::new(0, 1, 4, 0);
        let mut data = vec![1, 0, 1, 1, 0, 1, 0, 0];
        team.inclusive_scan_rows(&mut data, 2);
        assert_eq!(data, vec![1, 1, 2, 3, 0, 1, 1, 1]);
        // 4 lanes -> offsets 1 and 2.
        assert_eq!(team.barrier_count(), 2);
    }

    #[test]
    fn test_inclusive_scan_non_power_of_two() {
        let mut team = Team::new(0, 1, 5, 0);
        let mut data = vec![1u32; 5];
        team.inclusive_scan_rows(&mut data, 1);
        assert_eq!(data, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_shared_within_budget() {
        let mut team = Team::new(0, 1, 8, 64);
        let flags: SharedMemory<u32> = team.shared(8);
        let keys: SharedMemory<u64> = team.shared(4);
        assert_eq!(flags.len(), 8);
        assert!(keys.iter().all(|&k| k == 0));
    }

    #[test]
    #[should_panic(expected = "declared")]
    fn test_shared_over_budget_panics() {
        let mut team = Team::new(0, 1, 8, 16);
        let _flags: SharedMemory<u32> = team.shared(8);
    }
}
