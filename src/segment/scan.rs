use super::SegmentReader;
use crate::error::{JpegError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanComponent {
    pub selector: u8,
    pub dc_table_selector: u8,
    pub ac_table_selector: u8,
}

/// Start of scan (SOS). In lossless mode `spectral_start` is the predictor selector and
/// `approx_low` the point transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub components: Vec<ScanComponent>,
    pub spectral_start: u8,
    pub spectral_end: u8,
    pub approx_high: u8,
    pub approx_low: u8,
}

impl Scan {
    pub fn read(reader: &mut SegmentReader) -> Result<Self> {
        let count = reader.read_u8()? as usize;

        let expected = 6 + 2 * count;
        if reader.declared_length() != expected {
            return Err(JpegError::BadSegmentLength {
                segment: "SOS",
                declared: reader.declared_length(),
                expected,
            });
        }

        let mut components = Vec::with_capacity(count);
        for _ in 0..count {
            let selector = reader.read_u8()?;
            let tables = reader.read_u8()?;
            components.push(ScanComponent {
                selector,
                dc_table_selector: tables >> 4,
                ac_table_selector: tables & 0x0F,
            });
        }

        let spectral_start = reader.read_u8()?;
        let spectral_end = reader.read_u8()?;
        let approx = reader.read_u8()?;
        reader.finish()?;

        Ok(Self {
            components,
            spectral_start,
            spectral_end,
            approx_high: approx >> 4,
            approx_low: approx & 0x0F,
        })
    }

    pub fn predictor_selector(&self) -> u8 {
        self.spectral_start
    }

    pub fn point_transform(&self) -> u8 {
        self.approx_low
    }
}
