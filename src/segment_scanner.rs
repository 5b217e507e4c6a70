//! Locates marker segments in a JPEG stream.
//!
//! The scanner is strict: every segment boundary must hold a marker. It yields segments from SOI
//! up to and including the first SOS (or EOI), without looking into entropy-coded data.

use crate::constants::SEGMENT_LENGTH_SIZE;
use crate::error::{JpegError, Result};
use crate::image_input::ImageInput;
use crate::jpeg_marker_code::{
    EOI, JPEG_MARKER_START_BYTE, SOI, SOS, is_app, is_standalone, marker_name,
};
use crate::segment::Segment;
use crate::segment::application::{
    ADOBE_IDENTIFIER, ICC_PROFILE_IDENTIFIER, JFIF_IDENTIFIER, identifier,
};
use crate::segment::{AdobeDct, Application, IccChunk, Jfif};
use crate::warning::{WarningListener, emit};
use std::io::{Read, Seek};
use tracing::trace;

/// Position of one segment in the physical stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedSegment {
    pub marker: u16,
    /// Offset of the 0xFF byte that starts the marker.
    pub offset: u64,
    /// Total size: marker, length field and payload. 2 for standalone markers.
    pub length: u64,
}

impl LocatedSegment {
    pub fn payload_offset(&self) -> u64 {
        if self.length > 2 {
            self.offset + 4
        } else {
            self.end()
        }
    }

    pub fn payload_length(&self) -> u64 {
        self.length.saturating_sub(4)
    }

    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Start,
    Segments(u64),
    Done,
}

#[derive(Debug)]
pub struct SegmentScanner {
    state: ScanState,
}

impl Default for SegmentScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Start,
        }
    }

    /// Next segment, or `None` after SOS, EOI or the end of the stream.
    pub fn next_segment<R: Read + Seek>(
        &mut self,
        input: &mut ImageInput<R>,
    ) -> Result<Option<LocatedSegment>> {
        let result = self.advance(input);
        match &result {
            Ok(None) | Err(_) => self.state = ScanState::Done,
            Ok(Some(segment)) => {
                self.state = if segment.marker == SOS || segment.marker == EOI {
                    ScanState::Done
                } else {
                    ScanState::Segments(segment.end())
                };
            }
        }
        result
    }

    fn advance<R: Read + Seek>(
        &mut self,
        input: &mut ImageInput<R>,
    ) -> Result<Option<LocatedSegment>> {
        let offset = match self.state {
            ScanState::Done => return Ok(None),
            ScanState::Start => {
                let offset = input.position()?;
                let soi = input.read_u16()?;
                if soi != SOI {
                    return Err(JpegError::NotAJpegStream { found: soi });
                }
                return Ok(Some(LocatedSegment {
                    marker: SOI,
                    offset,
                    length: 2,
                }));
            }
            ScanState::Segments(offset) => offset,
        };

        input.seek(offset)?;
        match read_marker_header(input, offset) {
            Err(e) if e.is_eof() => Ok(None),
            other => other.map(Some),
        }
    }
}

fn read_marker_header<R: Read + Seek>(
    input: &mut ImageInput<R>,
    boundary: u64,
) -> Result<LocatedSegment> {
    let lead = input.read_u8()?;
    let mut code = input.read_u8()?;
    if lead != JPEG_MARKER_START_BYTE {
        return Err(JpegError::BadMarker {
            marker: (lead as u16) << 8 | code as u16,
            offset: boundary,
        });
    }
    while code == JPEG_MARKER_START_BYTE {
        code = input.read_u8()?;
    }
    let offset = input.position()? - 2;
    let marker = (JPEG_MARKER_START_BYTE as u16) << 8 | code as u16;
    if code == 0x00 {
        return Err(JpegError::BadMarker { marker, offset });
    }

    let length = if is_standalone(marker) {
        2
    } else {
        let declared = input.read_u16()? as usize;
        if declared < SEGMENT_LENGTH_SIZE {
            return Err(JpegError::BadSegmentLength {
                segment: "marker segment",
                declared,
                expected: SEGMENT_LENGTH_SIZE,
            });
        }
        declared as u64 + 2
    };
    trace!(marker = %marker_name(marker), offset, length, "located segment");
    Ok(LocatedSegment {
        marker,
        offset,
        length,
    })
}

/// Iterator over the located segments of a stream. Stops after the first error.
pub struct LocatedSegments<'a, R> {
    scanner: SegmentScanner,
    input: &'a mut ImageInput<R>,
}

impl<R: Read + Seek> Iterator for LocatedSegments<'_, R> {
    type Item = Result<LocatedSegment>;

    fn next(&mut self) -> Option<Self::Item> {
        self.scanner.next_segment(self.input).transpose()
    }
}

pub fn scan_segments<R: Read + Seek>(input: &mut ImageInput<R>) -> LocatedSegments<'_, R> {
    LocatedSegments {
        scanner: SegmentScanner::new(),
        input,
    }
}

/// Reads and classifies every segment from SOI through the first SOS.
///
/// JFIF, Adobe and ICC profile segments that do not parse are dropped with a warning; any
/// other malformed segment is an error. The input is left after the last segment read.
pub fn read_header_segments<R: Read + Seek>(
    input: &mut ImageInput<R>,
    listener: &mut dyn WarningListener,
) -> Result<Vec<Segment>> {
    let mut located = Vec::new();
    for segment in scan_segments(input) {
        let segment = segment?;
        if segment.length > 2 {
            located.push(segment);
        }
    }

    let mut segments = Vec::with_capacity(located.len());
    for location in located {
        input.seek(location.payload_offset())?;
        let payload = input.read_bytes(location.payload_length() as usize)?;

        if is_app(location.marker) && is_bogus_application(location.marker, &payload) {
            emit(
                listener,
                format!(
                    "Bogus APP{}/{} segment, ignoring",
                    location.marker & 0x0F,
                    identifier(&payload).unwrap_or("null")
                ),
            );
            continue;
        }
        segments.push(Segment::parse(location.marker, &payload)?);
    }
    Ok(segments)
}

fn is_bogus_application(marker: u16, payload: &[u8]) -> bool {
    let app = Application::new(marker, payload.to_vec());
    match app.identifier() {
        Some(JFIF_IDENTIFIER) => Jfif::parse(&app).is_err(),
        Some(ICC_PROFILE_IDENTIFIER) => IccChunk::parse(&app).is_err(),
        _ if payload.starts_with(ADOBE_IDENTIFIER.as_bytes()) => AdobeDct::parse(&app).is_err(),
        _ => false,
    }
}
