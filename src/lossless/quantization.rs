//! Quantization table enhancement.
//!
//! Enhancement scales every coefficient by a row and a column factor and drops 6 bits of
//! precision. It consumes the raw table, so an enhanced table cannot be enhanced again:
//!
//! ```compile_fail
//! use jpeg_lossless_rs::segment::{QuantizationPrecision, RawQuantizationTable};
//!
//! let raw = RawQuantizationTable::new(0, QuantizationPrecision::Eight, [1; 64]);
//! let enhanced = raw.enhance();
//! let twice = enhanced.enhance();
//! ```

use crate::constants::{
    ENHANCEMENT_FACTORS, ENHANCEMENT_SHIFT, NATURAL_TO_ZIGZAG, QUANTIZATION_TABLE_SIZE,
};
use crate::segment::{QuantizationPrecision, RawQuantizationTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedQuantizationTable {
    pub id: u8,
    pub precision: QuantizationPrecision,
    values: [i32; QUANTIZATION_TABLE_SIZE],
}

impl EnhancedQuantizationTable {
    /// Scaled coefficients in zig-zag order.
    pub fn values(&self) -> &[i32; QUANTIZATION_TABLE_SIZE] {
        &self.values
    }
}

impl RawQuantizationTable {
    pub fn enhance(self) -> EnhancedQuantizationTable {
        let mut values = self.values.map(i32::from);
        for (row, &row_factor) in ENHANCEMENT_FACTORS.iter().enumerate() {
            for (column, &column_factor) in ENHANCEMENT_FACTORS.iter().enumerate() {
                values[NATURAL_TO_ZIGZAG[row * 8 + column]] *= row_factor * column_factor;
            }
        }
        for value in values.iter_mut() {
            *value >>= ENHANCEMENT_SHIFT;
        }
        EnhancedQuantizationTable {
            id: self.id,
            precision: self.precision,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn enhances_all_ones_table() {
        let raw = RawQuantizationTable::new(1, QuantizationPrecision::Eight, [1; 64]);
        let enhanced = raw.enhance();
        assert_eq!(enhanced.id, 1);
        assert_eq!(enhanced.values()[0], 126);
        assert_eq!(enhanced.values()[1], 177);
        assert_eq!(enhanced.values()[63], 9);
    }

    #[test]
    fn single_application_is_distinguishable_from_double() {
        let raw = RawQuantizationTable::new(0, QuantizationPrecision::Eight, [1; 64]);
        let once = raw.clone().enhance();

        // Re-enhancing requires going back through a raw table on purpose.
        let mut rescaled = [0u16; 64];
        for (dst, &src) in rescaled.iter_mut().zip(once.values()) {
            *dst = src as u16;
        }
        let twice = RawQuantizationTable::new(0, QuantizationPrecision::Eight, rescaled).enhance();

        assert_eq!(once.values()[0], 126);
        assert_eq!(twice.values()[0], 126 * 8100 >> 6);
        assert_ne!(once, twice);
        assert_eq!(raw.enhance(), once);
    }

    #[test]
    fn sixteen_bit_coefficients_do_not_overflow() {
        let raw = RawQuantizationTable::new(0, QuantizationPrecision::Sixteen, [u16::MAX; 64]);
        let enhanced = raw.enhance();
        assert_eq!(enhanced.values()[0], (65535 * 8100) >> 6);
    }
}
