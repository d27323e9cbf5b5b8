//! Radix width policies.

/// Digit width and per-pass bit increment of a sort.
pub trait Specialization: Send + Sync + 'static {
    /// Bits per digit; the sort distinguishes `2^DIGIT_WIDTH` digit values.
    const DIGIT_WIDTH: u32;
    /// Bits consumed per pass.
    const BIT_INCREMENT: u32;
    /// Number of distinct digit values.
    const DIGIT_COUNT: usize = 1 << Self::DIGIT_WIDTH;

    fn digit_mask() -> u32 {
        (1u32 << Self::DIGIT_WIDTH) - 1
    }

    /// Passes needed to consume `total_bits`.
    fn pass_count(total_bits: u32) -> u32 {
        total_bits.div_ceil(Self::BIT_INCREMENT)
    }
}

/// 4-way digits, two bits per pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Radix4;

impl Specialization for Radix4 {
    const DIGIT_WIDTH: u32 = 2;
    const BIT_INCREMENT: u32 = 2;
}

/// 16-way digits, four bits per pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Radix16;

impl Specialization for Radix16 {
    const DIGIT_WIDTH: u32 = 4;
    const BIT_INCREMENT: u32 = 4;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radix4() {
        assert_eq!(Radix4::DIGIT_COUNT, 4);
        assert_eq!(Radix4::digit_mask(), 0b11);
        assert_eq!(Radix4::pass_count(32), 16);
        assert_eq!(Radix4::pass_count(8), 4);
    }

    #[test]
    fn test_radix16_rounds_up() {
        assert_eq!(Radix16::DIGIT_COUNT, 16);
        assert_eq!(Radix16::pass_count(64), 16);
        assert_eq!(Radix16::pass_count(6), 2);
    }
}
