//! Marker segment model.
//!
//! Every segment between SOI and the entropy-coded data of the first scan is read into one
//! [`Segment`] variant. Each variant parses its own payload from a length-delimited byte range
//! and must consume it exactly.

pub mod application;
pub mod frame;
pub mod huffman_table;
pub mod quantization_table;
pub mod scan;

pub use application::{AdobeDct, AdobeTransform, Application, IccChunk, Jfif, Jfxx, JfxxThumbnail};
pub use frame::{Frame, FrameComponent};
pub use huffman_table::{HuffmanTableSpec, TableClass};
pub use quantization_table::{QuantizationPrecision, RawQuantizationTable};
pub use scan::{Scan, ScanComponent};

use crate::constants::SEGMENT_LENGTH_SIZE;
use crate::error::{JpegError, Result};
use crate::image_input::ImageInput;
use crate::jpeg_marker_code::{self as markers, COM, DHT, DNL, DQT, DRI, SOS};
use std::io::{Read, Seek};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Frame(Frame),
    Scan(Scan),
    HuffmanTable(Vec<HuffmanTableSpec>),
    QuantizationTable(Vec<RawQuantizationTable>),
    RestartInterval(u16),
    DefineNumberOfLines(u16),
    Application(Application),
    Comment(Vec<u8>),
    Unknown { marker: u16, data: Vec<u8> },
}

impl Segment {
    pub fn marker(&self) -> u16 {
        match self {
            Segment::Frame(frame) => frame.marker,
            Segment::Scan(_) => SOS,
            Segment::HuffmanTable(_) => DHT,
            Segment::QuantizationTable(_) => DQT,
            Segment::RestartInterval(_) => DRI,
            Segment::DefineNumberOfLines(_) => DNL,
            Segment::Application(app) => app.marker,
            Segment::Comment(_) => COM,
            Segment::Unknown { marker, .. } => *marker,
        }
    }

    /// Reads the payload of a segment whose marker and length field have just been consumed.
    /// `declared_length` is the value of the length field, which counts itself.
    pub fn read<R: Read + Seek>(
        marker: u16,
        input: &mut ImageInput<R>,
        declared_length: u16,
    ) -> Result<Segment> {
        let declared = declared_length as usize;
        if declared < SEGMENT_LENGTH_SIZE {
            return Err(JpegError::BadSegmentLength {
                segment: "marker segment",
                declared,
                expected: SEGMENT_LENGTH_SIZE,
            });
        }
        let payload = input.read_bytes(declared - SEGMENT_LENGTH_SIZE)?;
        Self::parse(marker, &payload)
    }

    /// Classifies a segment payload (the bytes after the length field).
    pub fn parse(marker: u16, payload: &[u8]) -> Result<Segment> {
        let segment = match marker {
            m if markers::is_sof(m) => {
                let mut reader = SegmentReader::new("SOF", payload);
                Segment::Frame(Frame::read(m, &mut reader)?)
            }
            SOS => {
                let mut reader = SegmentReader::new("SOS", payload);
                Segment::Scan(Scan::read(&mut reader)?)
            }
            DHT => {
                let mut reader = SegmentReader::new("DHT", payload);
                Segment::HuffmanTable(HuffmanTableSpec::read_all(&mut reader)?)
            }
            DQT => {
                let mut reader = SegmentReader::new("DQT", payload);
                Segment::QuantizationTable(RawQuantizationTable::read_all(&mut reader)?)
            }
            DRI => Segment::RestartInterval(read_single_u16("DRI", payload)?),
            DNL => Segment::DefineNumberOfLines(read_single_u16("DNL", payload)?),
            m if markers::is_app(m) => Segment::Application(Application::new(m, payload.to_vec())),
            COM => Segment::Comment(payload.to_vec()),
            m => Segment::Unknown {
                marker: m,
                data: payload.to_vec(),
            },
        };
        Ok(segment)
    }
}

fn read_single_u16(segment: &'static str, payload: &[u8]) -> Result<u16> {
    let mut reader = SegmentReader::new(segment, payload);
    let value = reader.read_u16()?;
    reader.finish()?;
    Ok(value)
}

/// Cursor over a segment payload. Reading past the end, or finishing with bytes left over,
/// is a bad segment length.
pub struct SegmentReader<'a> {
    segment: &'static str,
    data: &'a [u8],
    position: usize,
}

impl<'a> SegmentReader<'a> {
    pub fn new(segment: &'static str, data: &'a [u8]) -> Self {
        Self {
            segment,
            data,
            position: 0,
        }
    }

    /// Declared segment length, counting the two length bytes.
    pub fn declared_length(&self) -> usize {
        self.data.len() + SEGMENT_LENGTH_SIZE
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = self.read_bytes(1)?[0];
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(JpegError::BadSegmentLength {
                segment: self.segment,
                declared: self.declared_length(),
                expected: self.position + count + SEGMENT_LENGTH_SIZE,
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Fails unless the whole payload was consumed.
    pub fn finish(&self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(JpegError::BadSegmentLength {
                segment: self.segment,
                declared: self.declared_length(),
                expected: self.position + SEGMENT_LENGTH_SIZE,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg_marker_code::{APP14, SOF3};
    use test_log::test;

    #[test]
    fn classifies_by_marker() {
        let dri = Segment::parse(DRI, &[0x00, 0x10]).unwrap();
        assert_eq!(dri, Segment::RestartInterval(16));
        assert_eq!(dri.marker(), DRI);

        let com = Segment::parse(COM, b"hello").unwrap();
        assert_eq!(com, Segment::Comment(b"hello".to_vec()));

        let app = Segment::parse(APP14, b"Adobe\0").unwrap();
        assert_eq!(app.marker(), APP14);

        let unknown = Segment::parse(0xFFF0, &[1, 2]).unwrap();
        assert_eq!(unknown.marker(), 0xFFF0);
        assert!(matches!(unknown, Segment::Unknown { .. }));
    }

    #[test]
    fn restart_interval_requires_exact_length() {
        let err = Segment::parse(DRI, &[0x00, 0x10, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            JpegError::BadSegmentLength { segment: "DRI", declared: 5, expected: 4 }
        ));
        assert!(Segment::parse(DNL, &[0x00]).is_err());
    }

    #[test]
    fn reads_from_input() {
        let data = [0x08, 0x00, 0x02, 0x00, 0x03, 0x01, 0x01, 0x11, 0x00];
        let mut input = ImageInput::from_slice(&data);
        let segment = Segment::read(SOF3, &mut input, 11).unwrap();
        let Segment::Frame(frame) = segment else {
            panic!("expected frame");
        };
        assert_eq!(frame.samples_per_line, 3);
        assert_eq!(frame.lines, 2);
        assert!(Segment::read(SOF3, &mut input, 1).is_err());
    }
}
