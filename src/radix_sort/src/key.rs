//! Key abstraction and digit extraction.
//!
//! The sort never looks at a key's structure. Every key type is mapped to an
//! unsigned bit pattern whose unsigned order is the key's total order
//! ([`OrderedBits`]); a [`DigitExtractor`] then slices digits out of that
//! pattern and decides the direction of the sort.
//!
//! # Bias transforms
//!
//! - Unsigned integers: the raw bits.
//! - Signed integers: flip the sign bit, so `MIN` maps to 0.
//! - Floats: flip all bits of negative values and only the sign bit of
//!   non-negative values. This orders `-inf < -0.0 < +0.0 < +inf`, with
//!   NaNs placed by their bit pattern at either end.

use bytemuck::Pod;

/// A key type with a total order expressed as an unsigned bit pattern.
pub trait OrderedBits: Pod + Send + Sync {
    /// Width of the bit pattern.
    const BITS: u32;
    /// The key whose ordered bit pattern is all zeros.
    fn min_key() -> Self;
    /// The key whose ordered bit pattern is all ones.
    fn max_key() -> Self;

    /// Order-preserving bit pattern, zero-extended to 64 bits.
    fn to_ordered_bits(self) -> u64;
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl OrderedBits for $t {
            const BITS: u32 = <$t>::BITS;
            fn min_key() -> Self {
                <$t>::MIN
            }

            fn max_key() -> Self {
                <$t>::MAX
            }

            #[inline]
            fn to_ordered_bits(self) -> u64 {
                self as u64
            }
        }
    )*};
}

macro_rules! impl_signed {
    ($($t:ty => $u:ty),*) => {$(
        impl OrderedBits for $t {
            const BITS: u32 = <$t>::BITS;
            fn min_key() -> Self {
                <$t>::MIN
            }

            fn max_key() -> Self {
                <$t>::MAX
            }

            #[inline]
            fn to_ordered_bits(self) -> u64 {
                ((self as $u) ^ (1 << (<$t>::BITS - 1))) as u64
            }
        }
    )*};
}

macro_rules! impl_float {
    ($($t:ty => $u:ty, $i:ty),*) => {$(
        impl OrderedBits for $t {
            const BITS: u32 = <$u>::BITS;
            // Bit patterns that map to all-zeros / all-ones (negative and
            // positive quiet NaN with full payload).
            fn min_key() -> Self {
                <$t>::from_bits(<$u>::MAX)
            }

            fn max_key() -> Self {
                <$t>::from_bits(<$u>::MAX >> 1)
            }

            #[inline]
            fn to_ordered_bits(self) -> u64 {
                let bits = self.to_bits();
                // All ones when negative, just the sign bit otherwise.
                let mask = (((bits as $i) >> (<$u>::BITS - 1)) as $u) | (1 << (<$u>::BITS - 1));
                (bits ^ mask) as u64
            }
        }
    )*};
}

impl_unsigned!(u8, u16, u32, u64);
impl_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64);
impl_float!(f32 => u32, i32, f64 => u64, i64);

/// Digit extraction strategy for key type `T`.
///
/// Implementations are type-level: the sort is instantiated with an
/// extractor type and never holds an instance.
pub trait DigitExtractor<T>: Send + Sync + 'static {
    /// Bits consumed across all passes.
    const TOTAL_BITS: u32;

    /// Key used for out-of-range lanes. It sorts after every real key.
    fn neutral() -> T;

    /// Digit of `key` at bit offset `shift`, in `[0, mask]`.
    fn extract_digit(key: T, shift: u32, mask: u32) -> u32;
}

/// Ascending order by [`OrderedBits`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascending;

/// Descending order by [`OrderedBits`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Descending;

impl<T: OrderedBits> DigitExtractor<T> for Ascending {
    const TOTAL_BITS: u32 = T::BITS;

    fn neutral() -> T {
        T::max_key()
    }

    #[inline]
    fn extract_digit(key: T, shift: u32, mask: u32) -> u32 {
        ((key.to_ordered_bits() >> shift) as u32) & mask
    }
}

impl<T: OrderedBits> DigitExtractor<T> for Descending {
    const TOTAL_BITS: u32 = T::BITS;

    fn neutral() -> T {
        T::min_key()
    }

    #[inline]
    fn extract_digit(key: T, shift: u32, mask: u32) -> u32 {
        (!(key.to_ordered_bits() >> shift) as u32) & mask
    }
}

/// Full sort key of `key` under extractor `E`, assembled digit by digit.
///
/// Two keys compare by this value exactly as the sort orders them.
pub fn sort_key<T, E: DigitExtractor<T>>(key: T) -> u64
where
    T: Copy,
{
    let mut value = 0u64;
    let mut shift = 0;
    while shift < E::TOTAL_BITS {
        let width = (E::TOTAL_BITS - shift).min(8);
        let digit = E::extract_digit(key, shift, (1u32 << width) - 1) as u64;
        value |= digit << shift;
        shift += width;
    }
    value
}
