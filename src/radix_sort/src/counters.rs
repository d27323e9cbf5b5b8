//! Lookups into the scanned counter table.
//!
//! The table is digit-major: entry `digit * groups + group` holds the count of
//! `digit` in `group`, so after an inclusive scan it holds the number of keys
//! that sort at or before the end of bucket `(digit, group)`.

/// Read-only view of an inclusively scanned counter table.
#[derive(Debug, Clone, Copy)]
pub struct ScannedCounters<'a> {
    scanned: &'a [u32],
    groups: usize,
}

impl<'a> ScannedCounters<'a> {
    pub fn new(scanned: &'a [u32], groups: usize) -> Self {
        debug_assert_eq!(scanned.len() % groups.max(1), 0);
        Self { scanned, groups }
    }

    #[inline]
    fn exclusive_at(&self, index: usize) -> usize {
        if index == 0 {
            0
        } else {
            self.scanned[index - 1] as usize
        }
    }

    /// Keys that sort before bucket `(digit, group)`.
    #[inline]
    pub fn exclusive(&self, digit: usize, group: usize) -> usize {
        self.exclusive_at(digit * self.groups + group)
    }

    /// Size of bucket `(digit, group)`.
    #[inline]
    pub fn count(&self, digit: usize, group: usize) -> usize {
        let index = digit * self.groups + group;
        self.scanned[index] as usize - self.exclusive_at(index)
    }

    /// Keys of `group` whose digit is below `digit`.
    #[inline]
    pub fn lower_total(&self, digit: usize, group: usize) -> usize {
        (0..digit).map(|d| self.count(d, group)).sum()
    }

    /// Final index of the key at local position `position` of `group`.
    ///
    /// `position` is taken in the group's locally partitioned run, so the keys
    /// of lower digits in the same group are subtracted back out.
    #[inline]
    pub fn destination(&self, digit: usize, group: usize, position: usize) -> usize {
        self.exclusive(digit, group) + position - self.lower_total(digit, group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accel_runtime::inclusive_scan_cpu;

    #[test]
    fn test_destination() {
        // Two groups, two digits:
        //   group 0 run: [d0, d1, d1]   group 1 run: [d0, d0, d1]
        let counts = vec![1, 2, 2, 1];
        let scanned = inclusive_scan_cpu(&counts);
        let table = ScannedCounters::new(&scanned, 2);

        assert_eq!(table.exclusive(0, 0), 0);
        assert_eq!(table.exclusive(0, 1), 1);
        assert_eq!(table.exclusive(1, 0), 3);
        assert_eq!(table.count(1, 0), 2);
        assert_eq!(table.lower_total(1, 1), 2);

        assert_eq!(table.destination(0, 0, 0), 0);
        assert_eq!(table.destination(1, 0, 1), 3);
        assert_eq!(table.destination(1, 0, 2), 4);
        assert_eq!(table.destination(0, 1, 0), 1);
        assert_eq!(table.destination(0, 1, 1), 2);
        assert_eq!(table.destination(1, 1, 2), 5);
    }
}
