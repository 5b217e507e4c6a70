use super::SegmentReader;
use crate::error::{JpegError, Result};
use crate::jpeg_marker_code::is_lossless_sof;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameComponent {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub quant_table_selector: u8,
}

/// Start of frame (SOFn).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub marker: u16,
    pub precision: u8,
    /// Zero when the height is deferred to a DNL segment.
    pub lines: u16,
    pub samples_per_line: u16,
    pub components: Vec<FrameComponent>,
}

impl Frame {
    pub fn read(marker: u16, reader: &mut SegmentReader) -> Result<Self> {
        let precision = reader.read_u8()?;
        let lines = reader.read_u16()?;
        let samples_per_line = reader.read_u16()?;
        let count = reader.read_u8()? as usize;

        let expected = 8 + 3 * count;
        if reader.declared_length() != expected {
            return Err(JpegError::BadSegmentLength {
                segment: "SOF",
                declared: reader.declared_length(),
                expected,
            });
        }

        let mut components = Vec::with_capacity(count);
        for _ in 0..count {
            let id = reader.read_u8()?;
            let sampling = reader.read_u8()?;
            let quant_table_selector = reader.read_u8()?;
            components.push(FrameComponent {
                id,
                h_sampling: sampling >> 4,
                v_sampling: sampling & 0x0F,
                quant_table_selector,
            });
        }
        reader.finish()?;

        Ok(Self {
            marker,
            precision,
            lines,
            samples_per_line,
            components,
        })
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn component(&self, id: u8) -> Option<&FrameComponent> {
        self.components.iter().find(|c| c.id == id)
    }

    /// SOF type, 0..=15.
    pub fn process(&self) -> u8 {
        (self.marker & 0x0F) as u8
    }

    pub fn is_lossless(&self) -> bool {
        is_lossless_sof(self.marker)
    }
}
