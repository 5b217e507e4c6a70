use super::SegmentReader;
use crate::constants::{HUFFMAN_CODE_LENGTHS, MAXIMUM_TABLE_ID};
use crate::error::{JpegError, Result};
use num_enum::TryFromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum TableClass {
    Dc = 0,
    Ac = 1,
}

impl TableClass {
    pub fn name(self) -> &'static str {
        match self {
            TableClass::Dc => "DC",
            TableClass::Ac => "AC",
        }
    }
}

/// One table of a DHT segment in its canonical form: code counts per length and the symbols
/// in code order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTableSpec {
    pub class: TableClass,
    pub id: u8,
    pub lengths: [u8; HUFFMAN_CODE_LENGTHS],
    pub values: Vec<u8>,
}

impl HuffmanTableSpec {
    /// Reads every table packed into one DHT payload.
    pub fn read_all(reader: &mut SegmentReader) -> Result<Vec<Self>> {
        let mut tables = Vec::new();
        while reader.remaining() > 0 {
            tables.push(Self::read(reader)?);
        }
        reader.finish()?;
        Ok(tables)
    }

    fn read(reader: &mut SegmentReader) -> Result<Self> {
        let tc_th = reader.read_u8()?;
        let id = tc_th & 0x0F;
        if id > MAXIMUM_TABLE_ID {
            return Err(JpegError::InvalidTableId { segment: "DHT", id });
        }
        let class = TableClass::try_from(tc_th >> 4)
            .map_err(|_| JpegError::InvalidTableClass { class: tc_th >> 4 })?;

        let mut lengths = [0u8; HUFFMAN_CODE_LENGTHS];
        lengths.copy_from_slice(reader.read_bytes(HUFFMAN_CODE_LENGTHS)?);

        let count: usize = lengths.iter().map(|&n| n as usize).sum();
        if count > 256 {
            return Err(JpegError::HuffmanTableOverflow("more than 256 symbols"));
        }
        let values = reader.read_bytes(count)?.to_vec();

        Ok(Self {
            class,
            id,
            lengths,
            values,
        })
    }
}
