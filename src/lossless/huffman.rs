//! Two-level Huffman lookup tables for entropy decoding.
//!
//! The root table resolves every code of up to 8 bits with one lookup of the next 8 bits of
//! input. Root slots covering longer codes hold the number of an extension table, which is then
//! indexed by the following 8 bits.

use crate::constants::HUFFMAN_CODE_LENGTHS;
use crate::error::{JpegError, Result};
use crate::segment::HuffmanTableSpec;

pub const LOOKUP_TABLE_SIZE: usize = 256;
const EXTENSION_FLAG: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Code { length: u8, value: u8 },
    Extension(usize),
    Empty,
}

/// Flattened lookup structure: root table at index 0, extension table `n` at `n * 256`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanLookupTable {
    entries: Vec<u32>,
}

impl HuffmanLookupTable {
    pub fn from_spec(spec: &HuffmanTableSpec) -> Result<Self> {
        Self::build(&spec.lengths, &spec.values)
    }

    pub fn build(lengths: &[u8; HUFFMAN_CODE_LENGTHS], values: &[u8]) -> Result<Self> {
        let mut entries = vec![0u32; LOOKUP_TABLE_SIZE];
        let mut symbols = values.iter().copied();
        let mut next_symbol = || {
            symbols
                .next()
                .ok_or(JpegError::HuffmanTableOverflow("fewer symbols than code lengths"))
        };

        let mut k = 0usize;
        for (i, &count) in lengths.iter().enumerate().take(8) {
            let length = i + 1;
            let fanout = LOOKUP_TABLE_SIZE >> length;
            for _ in 0..count {
                let value = next_symbol()?;
                if k + fanout > LOOKUP_TABLE_SIZE {
                    return Err(JpegError::HuffmanTableOverflow("root table overflow"));
                }
                entries[k..k + fanout].fill(value as u32 | (length as u32) << 8);
                k += fanout;
            }
        }

        let mut extension_count = 0usize;
        for entry in entries.iter_mut().skip(k) {
            extension_count += 1;
            *entry = extension_count as u32 | EXTENSION_FLAG;
        }
        entries.resize((extension_count + 1) * LOOKUP_TABLE_SIZE, 0);

        let mut current = 1usize;
        k = 0;
        for (i, &count) in lengths.iter().enumerate().skip(8) {
            let length = i + 1;
            let fanout = LOOKUP_TABLE_SIZE >> (length - 8);
            for _ in 0..count {
                let value = next_symbol()?;
                if current > extension_count || k + fanout > LOOKUP_TABLE_SIZE {
                    return Err(JpegError::HuffmanTableOverflow("extension table overflow"));
                }
                let start = current * LOOKUP_TABLE_SIZE + k;
                entries[start..start + fanout].fill(value as u32 | (length as u32) << 8);
                k += fanout;
                if k == LOOKUP_TABLE_SIZE {
                    k = 0;
                    current += 1;
                }
            }
        }

        Ok(Self { entries })
    }

    /// Looks up the next 8 bits of input, MSB first.
    pub fn lookup_root(&self, window: u8) -> Lookup {
        decode_entry(self.entries[window as usize])
    }

    /// Looks up the 8 bits following the root window in extension table `table`.
    pub fn lookup_extension(&self, table: usize, window: u8) -> Lookup {
        match self.entries.get(table * LOOKUP_TABLE_SIZE + window as usize) {
            Some(&entry) if table > 0 => decode_entry(entry),
            _ => Lookup::Empty,
        }
    }

    pub fn extension_table_count(&self) -> usize {
        self.entries.len() / LOOKUP_TABLE_SIZE - 1
    }
}

fn decode_entry(entry: u32) -> Lookup {
    if entry & EXTENSION_FLAG != 0 {
        return Lookup::Extension((entry & !EXTENSION_FLAG) as usize);
    }
    match (entry >> 8) as u8 {
        0 => Lookup::Empty,
        length => Lookup::Code {
            length,
            value: entry as u8,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    /// Standard DC luminance table (ITU T.81 table K.3).
    const STD_LUMINANCE_DC_LENGTHS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
    const STD_LUMINANCE_DC_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

    const STD_LUMINANCE_AC_LENGTHS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 125];
    const STD_LUMINANCE_AC_VALUES: [u8; 162] = [
        0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
        0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
        0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
        0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
        0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
        0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
        0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
        0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
        0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
        0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
        0xf9, 0xfa,
    ];

    /// Canonical (code, length, value) triples, assigned the way T.81 annex C does.
    fn canonical_codes(lengths: &[u8; 16], values: &[u8]) -> Vec<(u16, u8, u8)> {
        let mut codes = Vec::new();
        let mut code = 0u16;
        let mut symbols = values.iter();
        for (i, &count) in lengths.iter().enumerate() {
            for _ in 0..count {
                codes.push((code, i as u8 + 1, *symbols.next().unwrap()));
                code += 1;
            }
            code <<= 1;
        }
        codes
    }

    fn assert_every_code_resolves(lengths: &[u8; 16], values: &[u8]) {
        let table = HuffmanLookupTable::build(lengths, values).unwrap();
        for (code, length, value) in canonical_codes(lengths, values) {
            let expected = Lookup::Code { length, value };
            if length <= 8 {
                let window = (code << (8 - length)) as u8;
                assert_eq!(table.lookup_root(window), expected, "code {code:b}/{length}");
            } else {
                let root = (code >> (length - 8)) as u8;
                let Lookup::Extension(extension) = table.lookup_root(root) else {
                    panic!("code {code:b}/{length} has no extension entry");
                };
                let window = (code << (16 - length)) as u8;
                assert_eq!(table.lookup_extension(extension, window), expected, "code {code:b}/{length}");
            }
        }
    }

    #[test]
    fn resolves_short_codes_with_one_lookup() {
        assert_every_code_resolves(&STD_LUMINANCE_DC_LENGTHS, &STD_LUMINANCE_DC_VALUES);
        let table = HuffmanLookupTable::build(&STD_LUMINANCE_DC_LENGTHS, &STD_LUMINANCE_DC_VALUES).unwrap();
        // 111111110 is the only 9 bit code.
        assert_eq!(table.extension_table_count(), 1);
    }

    #[test]
    fn resolves_long_codes_with_two_lookups() {
        assert_every_code_resolves(&STD_LUMINANCE_AC_LENGTHS, &STD_LUMINANCE_AC_VALUES);

        let mut lengths = [0u8; 16];
        lengths[0] = 1;
        lengths[8] = 1;
        lengths[15] = 3;
        assert_every_code_resolves(&lengths, &[7, 8, 9, 10, 11]);
    }

    #[test]
    fn single_code_table() {
        let mut lengths = [0u8; 16];
        lengths[0] = 1;
        let table = HuffmanLookupTable::build(&lengths, &[0]).unwrap();
        assert_eq!(table.lookup_root(0x00), Lookup::Code { length: 1, value: 0 });
        assert_eq!(table.lookup_root(0x7F), Lookup::Code { length: 1, value: 0 });
        assert!(matches!(table.lookup_root(0x80), Lookup::Extension(_)));
        let Lookup::Extension(ext) = table.lookup_root(0xFF) else {
            panic!("expected extension");
        };
        assert_eq!(table.lookup_extension(ext, 0), Lookup::Empty);
    }

    #[test]
    fn rejects_oversubscribed_tables() {
        let mut lengths = [0u8; 16];
        lengths[0] = 3;
        let err = HuffmanLookupTable::build(&lengths, &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, JpegError::HuffmanTableOverflow(_)));

        let mut lengths = [0u8; 16];
        lengths[0] = 2;
        lengths[8] = 1;
        let err = HuffmanLookupTable::build(&lengths, &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, JpegError::HuffmanTableOverflow(_)));

        let mut lengths = [0u8; 16];
        lengths[0] = 2;
        assert!(HuffmanLookupTable::build(&lengths, &[0]).is_err());
    }
}
