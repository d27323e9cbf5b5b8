//! Sequential LSD radix sort (CPU reference).
//!
//! Sorts keys together with a payload of `u32` values (typically the original
//! indices) using the same extractor and specialization as the device sort.
//! It is a plain counting sort per digit, so it is stable, and is used to
//! check the parallel kernels.
//!
//! # Algorithm
//!
//! For each digit (LSB to MSB):
//! 1. **Histogram**: Count occurrences of each digit value
//! 2. **Scan**: Exclusive prefix sum gives each digit's first slot
//! 3. **Scatter**: Move elements to their slots in input order

use crate::key::DigitExtractor;
use crate::specialization::Specialization;

/// Result of a reference sort.
#[derive(Debug, Clone, PartialEq)]
pub struct RadixSortResult<T> {
    /// Sorted keys.
    pub keys: Vec<T>,
    /// Payload reordered with the keys.
    pub values: Vec<u32>,
    /// Passes executed.
    pub passes: u32,
}

/// Perform radix sort on keys with associated values (CPU reference).
///
/// # Arguments
/// * `keys` - Keys to sort
/// * `values` - Associated values, same length as `keys`
///
/// # Returns
/// Sorted keys and reordered values.
pub fn radix_sort_by_key_cpu<T, E, S>(keys: &[T], values: &[u32]) -> RadixSortResult<T>
where
    T: Copy,
    E: DigitExtractor<T>,
    S: Specialization,
{
    assert_eq!(keys.len(), values.len(), "keys and values differ in length");
    let n = keys.len();
    let passes = S::pass_count(E::TOTAL_BITS);
    if n == 0 {
        return RadixSortResult {
            keys: Vec::new(),
            values: Vec::new(),
            passes,
        };
    }

    let mask = S::digit_mask();
    let mut keys_a = keys.to_vec();
    let mut values_a = values.to_vec();
    let mut keys_b = keys_a.clone();
    let mut values_b = values_a.clone();

    for pass in 0..passes {
        let shift = pass * S::BIT_INCREMENT;

        let mut offsets = vec![0usize; S::DIGIT_COUNT];
        for &k in &keys_a {
            offsets[E::extract_digit(k, shift, mask) as usize] += 1;
        }

        let mut sum = 0;
        for offset in offsets.iter_mut() {
            let count = *offset;
            *offset = sum;
            sum += count;
        }

        for (&k, &v) in keys_a.iter().zip(&values_a) {
            let digit = E::extract_digit(k, shift, mask) as usize;
            keys_b[offsets[digit]] = k;
            values_b[offsets[digit]] = v;
            offsets[digit] += 1;
        }

        std::mem::swap(&mut keys_a, &mut keys_b);
        std::mem::swap(&mut values_a, &mut values_b);
    }

    RadixSortResult {
        keys: keys_a,
        values: values_a,
        passes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{Ascending, Descending};
    use crate::specialization::{Radix16, Radix4};

    #[test]
    fn test_radix_sort_cpu() {
        let keys = vec![5u64, 3, 8, 1, 9, 2, 7, 4, 6, 0];
        let values: Vec<u32> = (0..10).collect();

        let result = radix_sort_by_key_cpu::<u64, Ascending, Radix16>(&keys, &values);

        assert_eq!(result.keys, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(result.values, vec![9, 3, 5, 1, 7, 0, 8, 6, 2, 4]);
        assert_eq!(result.passes, 16);
    }

    #[test]
    fn test_radix_sort_preserves_order() {
        // Test stability: equal keys preserve original order
        let keys = vec![1i16, 1, 1, 1, 1];
        let values: Vec<u32> = vec![0, 1, 2, 3, 4];

        let result = radix_sort_by_key_cpu::<i16, Descending, Radix4>(&keys, &values);

        assert_eq!(result.values, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_radix_sort_signed() {
        let keys = vec![3i8, -128, 0, -1, 127];
        let values: Vec<u32> = (0..5).collect();
        let result = radix_sort_by_key_cpu::<i8, Ascending, Radix4>(&keys, &values);
        assert_eq!(result.keys, vec![-128, -1, 0, 3, 127]);
        assert_eq!(result.passes, 4);
    }

    #[test]
    fn test_radix_sort_empty() {
        let result = radix_sort_by_key_cpu::<u32, Ascending, Radix4>(&[], &[]);
        assert!(result.keys.is_empty());
    }
}
