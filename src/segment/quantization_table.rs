use super::SegmentReader;
use crate::constants::{MAXIMUM_TABLE_ID, QUANTIZATION_TABLE_SIZE};
use crate::error::{JpegError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizationPrecision {
    Eight,
    Sixteen,
}

/// A DQT table exactly as stored in the stream, coefficients in zig-zag order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuantizationTable {
    pub id: u8,
    pub precision: QuantizationPrecision,
    pub(crate) values: [u16; QUANTIZATION_TABLE_SIZE],
}

impl RawQuantizationTable {
    pub fn new(
        id: u8,
        precision: QuantizationPrecision,
        values: [u16; QUANTIZATION_TABLE_SIZE],
    ) -> Self {
        Self {
            id,
            precision,
            values,
        }
    }

    /// Reads every table packed into one DQT payload.
    pub fn read_all(reader: &mut SegmentReader) -> Result<Vec<Self>> {
        let mut tables = Vec::new();
        while reader.remaining() > 0 {
            tables.push(Self::read(reader)?);
        }
        reader.finish()?;
        Ok(tables)
    }

    fn read(reader: &mut SegmentReader) -> Result<Self> {
        let pq_tq = reader.read_u8()?;
        let id = pq_tq & 0x0F;
        if id > MAXIMUM_TABLE_ID {
            return Err(JpegError::InvalidTableId { segment: "DQT", id });
        }
        let precision = match pq_tq >> 4 {
            0 => QuantizationPrecision::Eight,
            1 => QuantizationPrecision::Sixteen,
            other => {
                return Err(JpegError::InvalidQuantizationPrecision {
                    id,
                    precision: other,
                });
            }
        };

        let mut values = [0u16; QUANTIZATION_TABLE_SIZE];
        for value in values.iter_mut() {
            *value = match precision {
                QuantizationPrecision::Eight => reader.read_u8()? as u16,
                QuantizationPrecision::Sixteen => reader.read_u16()?,
            };
        }

        Ok(Self {
            id,
            precision,
            values,
        })
    }

    /// Coefficients in zig-zag order.
    pub fn values(&self) -> &[u16; QUANTIZATION_TABLE_SIZE] {
        &self.values
    }
}
