//! Segment-aware virtual stream over a JPEG file.
//!
//! [`SegmentImageInput`] exposes a logical view of the physical stream: APPn segments the
//! [`AppSegmentFilter`] does not keep are removed, junk bytes between segments are dropped and
//! a few broken segments are rewritten into a form other decoders accept. Segments are found
//! lazily and cached, so seeking backwards never rescans the file.

use crate::decoder_options::AppSegmentFilter;
use crate::error::{JpegError, Result};
use crate::image_input::ImageInput;
use crate::jpeg_marker_code::{
    APP14, DQT, EOI, SOI, SOS, is_app, is_known_marker, is_sof, marker_name,
};
use crate::segment::AdobeDct;
use crate::segment::application::{ADOBE_IDENTIFIER, identifier};
use crate::segment_scanner::LocatedSegment;
use crate::warning::{NullWarningListener, WarningListener, emit};
use std::io::{self, Read, Seek, SeekFrom};
use tracing::{debug, trace};

/// Identifier bytes inspected when deciding whether to keep an APPn segment.
const APP_IDENTIFIER_PEEK: usize = 128;
/// Maximum number of distinct component ids tried when renumbering duplicates.
const MAX_COMPONENT_IDS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SegmentKind {
    /// Passed through from the physical stream.
    Marker,
    /// Rewritten segment, served from memory.
    Replacement(Vec<u8>),
    /// Everything after SOS.
    EntropyData,
    /// Stream that could not be segmented further; passed through as is.
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogicalSegment {
    marker: u16,
    real_start: u64,
    real_length: u64,
    start: u64,
    length: u64,
    kind: SegmentKind,
}

impl LogicalSegment {
    fn open_ended(real_start: u64, start: u64, kind: SegmentKind) -> Self {
        Self {
            marker: 0,
            real_start,
            real_length: u64::MAX - real_start,
            start,
            length: u64::MAX - start,
            kind,
        }
    }

    fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    fn real_end(&self) -> u64 {
        self.real_start.saturating_add(self.real_length)
    }

    fn contains(&self, position: u64) -> bool {
        position >= self.start && position < self.end()
    }

    fn is_open_ended(&self) -> bool {
        matches!(
            self.kind,
            SegmentKind::EntropyData | SegmentKind::Unreadable
        )
    }
}

pub struct SegmentImageInput<R, L = NullWarningListener> {
    input: ImageInput<R>,
    listener: L,
    filter: AppSegmentFilter,
    segments: Vec<LogicalSegment>,
    physical: Vec<LocatedSegment>,
    component_ids: Vec<u8>,
    position: u64,
}

impl<R: Read + Seek> SegmentImageInput<R> {
    pub fn new(inner: R) -> Self {
        Self::with_listener(inner, NullWarningListener)
    }
}

impl<R: Read + Seek, L: WarningListener> SegmentImageInput<R, L> {
    pub fn with_listener(inner: R, listener: L) -> Self {
        Self {
            input: ImageInput::new(inner),
            listener,
            filter: AppSegmentFilter::default(),
            segments: Vec::new(),
            physical: Vec::new(),
            component_ids: Vec::new(),
            position: 0,
        }
    }

    pub fn with_filter(mut self, filter: AppSegmentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn into_parts(self) -> (R, L) {
        (self.input.into_inner(), self.listener)
    }

    /// Every segment found so far in the physical stream, filtered ones included.
    pub fn physical_segments(&self) -> &[LocatedSegment] {
        &self.physical
    }

    /// Scans the remaining header segments so [`physical_segments`](Self::physical_segments)
    /// is complete.
    pub fn scan_all(&mut self) -> Result<()> {
        while self.segments.last().is_none_or(|last| !last.is_open_ended()) {
            self.scan_next()?;
        }
        Ok(())
    }

    /// Index of the cached segment containing `position`.
    fn find(&self, position: u64) -> Option<usize> {
        let index = self
            .segments
            .partition_point(|segment| segment.start <= position)
            .checked_sub(1)?;
        self.segments[index].contains(position).then_some(index)
    }

    /// Finds the segment containing the current position, scanning forward as needed.
    /// Returns `None` at the end of the logical stream.
    fn fetch(&mut self) -> Result<Option<usize>> {
        loop {
            if let Some(index) = self.find(self.position) {
                return Ok(Some(index));
            }
            if self.segments.last().is_some_and(LogicalSegment::is_open_ended) {
                return Ok(None);
            }
            self.scan_next()?;
        }
    }

    /// Scans one more segment. When the stream ends first, the rest of it is passed through
    /// unsegmented.
    fn scan_next(&mut self) -> Result<()> {
        match self.scan_forward() {
            Err(e) if e.is_eof() && !self.segments.is_empty() => {
                // Bad segment lengths. Keep what was found.
                let last = &self.segments[self.segments.len() - 1];
                debug!(offset = last.real_end(), "stream ended while scanning segments");
                let unreadable =
                    LogicalSegment::open_ended(last.real_end(), last.end(), SegmentKind::Unreadable);
                self.segments.push(unreadable);
                Ok(())
            }
            other => other,
        }
    }

    /// Appends the next kept segment to the cache.
    fn scan_forward(&mut self) -> Result<()> {
        let Some(last) = self.segments.last() else {
            return self.stream_init();
        };
        let (mut real_position, start) = (last.real_end(), last.end());

        loop {
            self.input.seek(real_position)?;
            let marker = self.read_marker()?;
            let offset = self.input.position()? - 2;

            if marker == EOI {
                self.physical.push(LocatedSegment {
                    marker,
                    offset,
                    length: 2,
                });
                self.push(LogicalSegment {
                    marker,
                    real_start: offset,
                    real_length: 2,
                    start,
                    length: 2,
                    kind: SegmentKind::Marker,
                });
                return Ok(());
            }

            let declared = self.input.read_u16()? as usize;
            if declared < 2 {
                return Err(JpegError::BadSegmentLength {
                    segment: "marker segment",
                    declared,
                    expected: 2,
                });
            }
            let length = declared as u64 + 2;
            self.physical.push(LocatedSegment {
                marker,
                offset,
                length,
            });

            let app_identifier = if is_app(marker) {
                Some(self.peek_identifier(length)?)
            } else {
                None
            };
            if let Some(id) = &app_identifier {
                if !self.filter.keeps(marker, id.as_deref()) {
                    trace!(marker = %marker_name(marker), identifier = ?id, offset, "filtering segment");
                    real_position = offset + length;
                    continue;
                }
            }

            let is_adobe = marker == APP14
                && app_identifier
                    .as_ref()
                    .and_then(|id| id.as_deref())
                    == Some(ADOBE_IDENTIFIER);
            let kind = if is_adobe && length != AdobeDct::SEGMENT_LENGTH as u64 + 2 {
                SegmentKind::Replacement(self.adobe_replacement(length)?)
            } else if marker == DQT {
                self.dqt_replacement(length)?
                    .map_or(SegmentKind::Marker, SegmentKind::Replacement)
            } else if is_sof(marker) {
                SegmentKind::Replacement(self.sof_replacement(marker, length)?)
            } else if marker == SOS {
                SegmentKind::Replacement(self.sos_replacement(length)?)
            } else {
                SegmentKind::Marker
            };

            let logical_length = match &kind {
                SegmentKind::Replacement(data) => data.len() as u64,
                _ => length,
            };
            self.push(LogicalSegment {
                marker,
                real_start: offset,
                real_length: length,
                start,
                length: logical_length,
                kind,
            });

            if marker == SOS {
                let last = &self.segments[self.segments.len() - 1];
                let entropy =
                    LogicalSegment::open_ended(last.real_end(), last.end(), SegmentKind::EntropyData);
                self.segments.push(entropy);
            }
            return Ok(());
        }
    }

    fn push(&mut self, segment: LogicalSegment) {
        trace!(
            marker = %marker_name(segment.marker),
            real_start = segment.real_start,
            start = segment.start,
            length = segment.length,
            "cached segment"
        );
        self.segments.push(segment);
    }

    fn stream_init(&mut self) -> Result<()> {
        self.input.seek(0)?;
        let soi = self.input.read_u16()?;
        if soi != SOI {
            return Err(JpegError::NotAJpegStream { found: soi });
        }
        self.physical.push(LocatedSegment {
            marker: SOI,
            offset: 0,
            length: 2,
        });
        self.push(LogicalSegment {
            marker: SOI,
            real_start: 0,
            real_length: 2,
            start: 0,
            length: 2,
            kind: SegmentKind::Marker,
        });
        Ok(())
    }

    /// Reads the next known marker, skipping junk and fill bytes.
    fn read_marker(&mut self) -> Result<u16> {
        let mut trash = 0usize;
        let mut marker = self.input.read_u8()? as u16;
        while !is_known_marker(marker) {
            marker &= 0xFF;
            while marker != 0xFF {
                marker = self.input.read_u8()? as u16;
                trash += 1;
            }
            marker = 0xFF00 | self.input.read_u8()? as u16;
            while marker == 0xFFFF {
                marker = 0xFF00 | self.input.read_u8()? as u16;
                trash += 1;
            }
        }
        if trash != 0 {
            emit(
                &mut self.listener,
                format!(
                    "Corrupt JPEG data: {trash} extraneous bytes before marker 0x{:02x}",
                    marker & 0xFF
                ),
            );
        }
        Ok(marker)
    }

    /// Identifier of the APPn segment whose length field was just read. The input position is
    /// left unchanged.
    fn peek_identifier(&mut self, length: u64) -> Result<Option<String>> {
        self.input.mark()?;
        let count = (length.saturating_sub(4) as usize).min(APP_IDENTIFIER_PEEK);
        let mut data = vec![0; count];
        let read = self.input.read_available(&mut data);
        self.input.reset()?;
        let read = read?;
        Ok(identifier(&data[..read]).map(str::to_owned))
    }

    /// Reads the rest of the segment whose length field was just read, prefixed with its
    /// marker and length.
    fn read_segment(&mut self, marker: u16, length: u64) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(length as usize);
        data.extend_from_slice(&marker.to_be_bytes());
        data.extend_from_slice(&((length - 2) as u16).to_be_bytes());
        data.extend(self.input.read_bytes(length as usize - 4)?);
        Ok(data)
    }

    /// Adobe segments must be exactly 12 bytes of payload.
    fn adobe_replacement(&mut self, length: u64) -> Result<Vec<u8>> {
        let canonical = AdobeDct::SEGMENT_LENGTH as usize + 2;
        let mut data = Vec::with_capacity(canonical);
        data.extend_from_slice(&APP14.to_be_bytes());
        data.extend_from_slice(&AdobeDct::SEGMENT_LENGTH.to_be_bytes());
        let available = (length as usize - 4).min(canonical - 4);
        data.extend(self.input.read_bytes(available)?);
        data.resize(canonical, 0);
        Ok(data)
    }

    /// 16-bit tables are rewritten as 8-bit tables keeping the low byte of each entry.
    fn dqt_replacement(&mut self, length: u64) -> Result<Option<Vec<u8>>> {
        if length <= 4 {
            return Ok(None);
        }
        self.input.mark()?;
        let info = self.input.read_u8();
        self.input.reset()?;
        if info? & 0x10 == 0 {
            return Ok(None);
        }
        emit(&mut self.listener, "16 bit DQT encountered");

        let original = self.read_segment(DQT, length)?;
        let count = length as usize / 128;
        let replacement_length = 2 + 65 * count;
        let mut data = Vec::with_capacity(replacement_length + 2);
        data.extend_from_slice(&DQT.to_be_bytes());
        data.extend_from_slice(&(replacement_length as u16).to_be_bytes());
        for table in original[4..].chunks(129).take(count) {
            data.push(table[0] & 0x0F);
            data.extend(table[1..].chunks(2).filter_map(|entry| entry.get(1).copied()));
        }
        data.resize(replacement_length + 2, 0);
        Ok(Some(data))
    }

    fn sof_replacement(&mut self, marker: u16, length: u64) -> Result<Vec<u8>> {
        let mut data = self.read_segment(marker, length)?;
        for offset in (10..data.len()).step_by(3) {
            let mut id = data[offset];
            if self.component_ids.contains(&id) {
                emit(
                    &mut self.listener,
                    format!("Duplicate component ID {id} in SOF"),
                );
                id = id.wrapping_add(1);
                while self.component_ids.contains(&id)
                    && self.component_ids.len() <= MAX_COMPONENT_IDS
                {
                    id = id.wrapping_add(1);
                }
                data[offset] = id;
            }
            if !self.component_ids.contains(&id) {
                self.component_ids.push(id);
            }
        }
        Ok(data)
    }

    fn sos_replacement(&mut self, length: u64) -> Result<Vec<u8>> {
        let mut data = self.read_segment(SOS, length)?;
        let end = data.len().saturating_sub(3);
        let mut selectors = Vec::new();
        let mut duplicates = false;
        for offset in (5..end).step_by(2) {
            let selector = data[offset];
            if selectors.contains(&selector) {
                emit(
                    &mut self.listener,
                    format!("Duplicate component ID {selector} in SOS"),
                );
                duplicates = true;
            } else {
                selectors.push(selector);
            }
        }
        if duplicates {
            for (offset, &id) in (5..end).step_by(2).zip(&self.component_ids) {
                data[offset] = id;
            }
        }
        Ok(data)
    }

    /// Logical length of the whole stream.
    fn logical_length(&mut self) -> Result<u64> {
        self.scan_all()?;
        let physical_length = self.input.length()?;
        Ok(self.segments.last().map_or(0, |last| {
            last.start + physical_length.saturating_sub(last.real_start)
        }))
    }

    fn read_segment_data(&mut self, index: usize, buf: &mut [u8]) -> Result<usize> {
        let segment = &self.segments[index];
        let offset = self.position - segment.start;
        let available = (segment.length - offset).min(buf.len() as u64) as usize;
        let count = match &segment.kind {
            SegmentKind::Replacement(data) => {
                let offset = offset as usize;
                buf[..available].copy_from_slice(&data[offset..offset + available]);
                available
            }
            _ => {
                let real = segment.real_start + offset;
                self.input.seek(real)?;
                self.input.read_available(&mut buf[..available])?
            }
        };
        Ok(count)
    }
}

impl<R: Read + Seek, L: WarningListener> Read for SegmentImageInput<R, L> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            let Some(index) = self.fetch().map_err(io::Error::from)? else {
                break;
            };
            let count = self
                .read_segment_data(index, &mut buf[total..])
                .map_err(io::Error::from)?;
            if count == 0 {
                break;
            }
            self.position += count as u64;
            total += count;
        }
        Ok(total)
    }
}

impl<R: Read + Seek, L: WarningListener> Seek for SegmentImageInput<R, L> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                let length = self.logical_length().map_err(io::Error::from)?;
                length.checked_add_signed(delta)
            }
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative position")
        })?;
        self.position = target;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}
