//! Lossless JPEG (ITU T.81 process 14) scan decoder.
//!
//! The decoder re-reads the stream from SOI, skips to the first SOS and decodes its
//! entropy-coded data into one plane per scan component. Tables, frame geometry and the
//! restart interval come from the header segments the caller already parsed.

use super::bit_reader::{Decoded, EntropyReader};
use super::huffman::HuffmanLookupTable;
use super::predictor::{Predictor, neighbours};
use super::quantization::EnhancedQuantizationTable;
use crate::constants::{MAXIMUM_BITS_PER_SAMPLE, MINIMUM_BITS_PER_SAMPLE};
use crate::decoder_options::DecoderOptions;
use crate::error::{JpegError, Result};
use crate::image_input::ImageInput;
use crate::jpeg_marker_code::{
    DNL, EOI, JPEG_MARKER_START_BYTE, SOI, SOS, is_restart, is_standalone, marker_name,
};
use crate::segment::{Frame, Scan, Segment, SegmentReader, TableClass};
use crate::warning::{WarningListener, emit};
use std::collections::HashMap;
use std::io::{Read, Seek};
use tracing::{debug, instrument, trace};

/// Result of a lossless decode: one row-major plane per scan component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub precision: u8,
    pub planes: Vec<Vec<u16>>,
}

impl DecodedImage {
    pub fn component_count(&self) -> usize {
        self.planes.len()
    }

    /// Samples in pixel order with components interleaved.
    pub fn interleaved(&self) -> Vec<u16> {
        let count = self.width * self.height;
        let mut samples = Vec::with_capacity(count * self.planes.len());
        for index in 0..count {
            samples.extend(self.planes.iter().map(|plane| plane[index]));
        }
        samples
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodePath {
    Single,
    Triple,
    Generic,
}

struct ScanTable<'t> {
    table: &'t HuffmanLookupTable,
    /// Data units per component per MCU (h * v).
    units: usize,
}

/// Per-scan mutable state.
struct ScanSession {
    width: usize,
    /// Unknown until a DNL segment when the frame declares zero lines.
    height: Option<usize>,
    mask: i32,
    first_value: i32,
    predictor: Predictor,
    planes: Vec<Vec<u16>>,
    position: usize,
    interval_start: bool,
}

impl ScanSession {
    fn is_complete(&self) -> bool {
        self.height
            .is_some_and(|height| self.position >= self.width * height)
    }

    fn xy(&self) -> (usize, usize) {
        (self.position % self.width, self.position / self.width)
    }

    fn prediction(&self, component: usize) -> i32 {
        if self.position == 0 || self.interval_start {
            return self.first_value;
        }
        let (x, y) = self.xy();
        let (ra, rb, rc) = neighbours(&self.planes[component], self.width, x, y);
        self.predictor.predict(ra, rb, rc)
    }

    fn store(&mut self, values: &[i32]) {
        for (plane, &value) in self.planes.iter_mut().zip(values) {
            plane.push((value & self.mask) as u16);
        }
        self.position += 1;
        self.interval_start = false;
    }
}

pub struct LosslessDecoder<'a, R> {
    input: &'a mut ImageInput<R>,
    frame: Frame,
    huffman_tables: HashMap<(TableClass, u8), HuffmanLookupTable>,
    quantization_tables: [Option<EnhancedQuantizationTable>; 4],
    restart_interval: usize,
    options: DecoderOptions,
    force_generic_path: bool,
}

impl<'a, R: Read + Seek> LosslessDecoder<'a, R> {
    /// Builds lookup tables from the header segments. `input` must be positioned at SOI
    /// when [`decode`](Self::decode) is called.
    pub fn new(
        segments: &[Segment],
        input: &'a mut ImageInput<R>,
        options: DecoderOptions,
    ) -> Result<Self> {
        let mut frame = None;
        let mut huffman_tables = HashMap::new();
        let mut quantization_tables: [Option<EnhancedQuantizationTable>; 4] = Default::default();
        let mut restart_interval = 0;

        for segment in segments {
            match segment {
                Segment::Frame(f) => frame = Some(f.clone()),
                Segment::HuffmanTable(specs) => {
                    for spec in specs {
                        let table = HuffmanLookupTable::from_spec(spec)?;
                        huffman_tables.insert((spec.class, spec.id), table);
                    }
                }
                Segment::QuantizationTable(tables) => {
                    for raw in tables {
                        quantization_tables[raw.id as usize] = Some(raw.clone().enhance());
                    }
                }
                Segment::RestartInterval(interval) => restart_interval = *interval as usize,
                _ => {}
            }
        }

        let frame = frame.ok_or(JpegError::MissingSegment("SOF"))?;
        if !(MINIMUM_BITS_PER_SAMPLE..=MAXIMUM_BITS_PER_SAMPLE).contains(&frame.precision) {
            return Err(JpegError::Unsupported(format!(
                "lossless JPEG with {} bit precision",
                frame.precision
            )));
        }

        if options.debug {
            let mut ids: Vec<_> = huffman_tables.keys().collect();
            ids.sort_by_key(|(class, id)| (*class as u8, *id));
            debug!(?frame, huffman_tables = ?ids, restart_interval, "lossless decoder setup");
            for table in quantization_tables.iter().flatten() {
                debug!(id = table.id, values = ?table.values(), "enhanced quantization table");
            }
        }

        Ok(Self {
            input,
            frame,
            huffman_tables,
            quantization_tables,
            restart_interval,
            options,
            force_generic_path: false,
        })
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn restart_interval(&self) -> usize {
        self.restart_interval
    }

    pub fn quantization_table(&self, id: u8) -> Option<&EnhancedQuantizationTable> {
        self.quantization_tables.get(id as usize)?.as_ref()
    }

    #[instrument(level = "debug", skip_all, err)]
    pub fn decode(&mut self, listener: &mut dyn WarningListener) -> Result<DecodedImage> {
        let soi = self.input.read_u16()?;
        if soi != SOI {
            return Err(JpegError::NotAJpegStream { found: soi });
        }
        let scan = self.read_until_scan()?;

        let predictor = Predictor::try_from(scan.predictor_selector())?;
        if scan.point_transform() != 0 {
            emit(
                listener,
                format!("Ignoring point transform {} in lossless scan", scan.point_transform()),
            );
        }

        let mut tables = Vec::with_capacity(scan.components.len());
        for component in &scan.components {
            let frame_component = self
                .frame
                .component(component.selector)
                .ok_or(JpegError::UnknownComponentId(component.selector))?;
            let table = dc_table(
                &self.huffman_tables,
                &self.frame,
                component.dc_table_selector,
                listener,
            )?;
            tables.push(ScanTable {
                table,
                units: frame_component.h_sampling as usize * frame_component.v_sampling as usize,
            });
        }

        let width = self.frame.samples_per_line as usize;
        if width == 0 || tables.is_empty() {
            return Err(JpegError::Unsupported(format!(
                "lossless scan with width {width} and {} component(s)",
                tables.len()
            )));
        }
        let height = match self.frame.lines {
            0 => None,
            lines => Some(lines as usize),
        };
        let pixels = width as u64 * height.unwrap_or(1) as u64;
        if pixels > self.options.max_image_pixels {
            return Err(JpegError::Unsupported(format!(
                "image of {pixels} pixels exceeds the limit of {}",
                self.options.max_image_pixels
            )));
        }

        let precision = self.frame.precision;
        let mut session = ScanSession {
            width,
            height,
            mask: if precision == 8 { 0xFF } else { 0xFFFF },
            first_value: 1 << (precision - 1),
            predictor,
            planes: vec![Vec::with_capacity(width * height.unwrap_or(0)); tables.len()],
            position: 0,
            interval_start: false,
        };

        let path = match tables.len() {
            _ if self.force_generic_path => DecodePath::Generic,
            1 => DecodePath::Single,
            3 => DecodePath::Triple,
            _ => DecodePath::Generic,
        };
        debug!(
            width,
            ?height,
            precision,
            ?predictor,
            components = tables.len(),
            restart_interval = self.restart_interval,
            ?path,
            "decoding lossless scan"
        );

        let terminator = decode_scan(
            &mut EntropyReader::new(self.input),
            &mut session,
            &tables,
            path,
            self.restart_interval,
            self.options.max_image_pixels,
            listener,
        )?;

        let (x, y) = session.xy();
        let premature = match session.height {
            Some(_) => !session.is_complete(),
            None => x != 0,
        };
        if premature {
            return Err(JpegError::PrematureMarker {
                marker: terminator,
                x,
                y,
            });
        }

        let height = self.finish_scan(terminator, &mut session, listener)?;
        Ok(DecodedImage {
            width,
            height,
            precision,
            planes: session.planes,
        })
    }

    /// Skips marker segments up to and including the first SOS header.
    fn read_until_scan(&mut self) -> Result<Scan> {
        loop {
            let marker = read_next_marker(self.input)?;
            match marker {
                EOI => return Err(JpegError::MissingSegment("SOS")),
                m if is_standalone(m) => continue,
                _ => {}
            }
            let length = self.input.read_u16()?;
            let payload = self
                .input
                .read_bytes((length as usize).saturating_sub(2))?;
            if marker == SOS {
                return Scan::read(&mut SegmentReader::new("SOS", &payload));
            }
        }
    }

    /// Handles DNL and the markers after the scan, leaving the input after EOI.
    /// Returns the final image height.
    fn finish_scan(
        &mut self,
        terminator: u16,
        session: &mut ScanSession,
        listener: &mut dyn WarningListener,
    ) -> Result<usize> {
        let mut marker = terminator;
        let decoded_rows = session.position / session.width;

        let height = if marker == DNL {
            let length = self.input.read_u16()?;
            let payload = self
                .input
                .read_bytes((length as usize).saturating_sub(2))?;
            let lines = SegmentReader::new("DNL", &payload).read_u16()? as usize;
            let height = match session.height {
                None if lines > decoded_rows || lines == 0 => {
                    return Err(JpegError::PrematureMarker {
                        marker: DNL,
                        x: 0,
                        y: decoded_rows,
                    });
                }
                None => {
                    for plane in session.planes.iter_mut() {
                        plane.truncate(lines * session.width);
                    }
                    lines
                }
                Some(height) => {
                    if height != lines {
                        emit(
                            listener,
                            format!("DNL declares {lines} lines but SOF declares {height}, using SOF"),
                        );
                    }
                    height
                }
            };
            marker = match read_next_marker(self.input) {
                Ok(marker) => marker,
                Err(e) if e.is_eof() => EOI,
                Err(e) => return Err(e),
            };
            height
        } else {
            session.height.ok_or(JpegError::MissingSegment("DNL"))?
        };

        loop {
            match marker {
                EOI => break,
                SOS => {
                    return Err(JpegError::Unsupported(
                        "multiple scans in a lossless JPEG stream".into(),
                    ));
                }
                m if is_standalone(m) => trace!(marker = %marker_name(m), "skipping marker after scan"),
                m => {
                    let length = self.input.read_u16()?;
                    trace!(marker = %marker_name(m), length, "skipping segment after scan");
                    self.input.skip((length as u64).saturating_sub(2))?;
                }
            }
            marker = match read_next_marker(self.input) {
                Ok(marker) => marker,
                Err(e) if e.is_eof() => {
                    emit(listener, "Missing EOI marker");
                    break;
                }
                Err(e) => return Err(e),
            };
        }
        Ok(height)
    }

    #[cfg(test)]
    fn with_generic_path(mut self) -> Self {
        self.force_generic_path = true;
        self
    }
}

/// DC table for `selector`. Some encoders label lossless tables as AC; when a lossless frame
/// has no DC table with that id, an AC table with the same id is used instead.
fn dc_table<'t>(
    tables: &'t HashMap<(TableClass, u8), HuffmanLookupTable>,
    frame: &Frame,
    selector: u8,
    listener: &mut dyn WarningListener,
) -> Result<&'t HuffmanLookupTable> {
    if let Some(table) = tables.get(&(TableClass::Dc, selector)) {
        return Ok(table);
    }
    if frame.is_lossless() {
        if let Some(table) = tables.get(&(TableClass::Ac, selector)) {
            emit(
                listener,
                "Lossless JPEG with no DC tables encountered. Assuming only tables present to be DC tables.",
            );
            return Ok(table);
        }
    }
    Err(JpegError::MissingHuffmanTable {
        class: TableClass::Dc.name(),
        id: selector,
    })
}

/// Reads a marker between segments, skipping 0xFF fill bytes.
fn read_next_marker<R: Read + Seek>(input: &mut ImageInput<R>) -> Result<u16> {
    let offset = input.position()?;
    let lead = input.read_u8()?;
    let mut code = input.read_u8()?;
    if lead != JPEG_MARKER_START_BYTE {
        return Err(JpegError::BadMarker {
            marker: (lead as u16) << 8 | code as u16,
            offset,
        });
    }
    while code == JPEG_MARKER_START_BYTE {
        code = input.read_u8()?;
    }
    Ok((JPEG_MARKER_START_BYTE as u16) << 8 | code as u16)
}

/// Decodes units until the image is complete or a marker interrupts, returning that marker.
fn decode_scan<R: Read + Seek>(
    reader: &mut EntropyReader<R>,
    session: &mut ScanSession,
    tables: &[ScanTable],
    path: DecodePath,
    restart_interval: usize,
    max_image_pixels: u64,
    listener: &mut dyn WarningListener,
) -> Result<u16> {
    let mut predictions = vec![0i32; tables.len()];
    let mut units_in_interval = 0usize;
    let mut expected_restart = 0u16;

    loop {
        if session.is_complete() {
            return reader.read_marker();
        }

        if restart_interval > 0 && units_in_interval == restart_interval {
            let marker = reader.read_marker()?;
            if !is_restart(marker) {
                if session.height.is_none() && session.xy().0 == 0 {
                    return Ok(marker);
                }
                return Err(JpegError::RestartMarkerNotFound { found: marker });
            }
            if marker & 0x07 != expected_restart {
                emit(
                    listener,
                    format!(
                        "Restart marker out of sequence: expected RST{expected_restart}, found {}",
                        marker_name(marker)
                    ),
                );
            }
            trace!(marker = %marker_name(marker), position = session.position, "restart");
            expected_restart = ((marker & 0x07) + 1) % 8;
            units_in_interval = 0;
            session.interval_start = true;
            continue;
        }

        if session.height.is_none() && session.position as u64 >= max_image_pixels {
            return Err(JpegError::Unsupported(format!(
                "image exceeds the limit of {max_image_pixels} pixels"
            )));
        }

        let interrupted = match path {
            DecodePath::Single => decode_fixed::<1, R>(reader, session, tables)?,
            DecodePath::Triple => decode_fixed::<3, R>(reader, session, tables)?,
            DecodePath::Generic => decode_unit(reader, session, tables, &mut predictions)?,
        };
        if let Some(marker) = interrupted {
            return Ok(marker);
        }
        units_in_interval += 1;
    }
}

fn decode_fixed<const N: usize, R: Read + Seek>(
    reader: &mut EntropyReader<R>,
    session: &mut ScanSession,
    tables: &[ScanTable],
) -> Result<Option<u16>> {
    let mut predictions = [0i32; N];
    decode_unit(reader, session, tables, &mut predictions)
}

/// Decodes one sample of every component: prediction plus the sum of the unit differences.
fn decode_unit<R: Read + Seek>(
    reader: &mut EntropyReader<R>,
    session: &mut ScanSession,
    tables: &[ScanTable],
    predictions: &mut [i32],
) -> Result<Option<u16>> {
    for (component, prediction) in predictions.iter_mut().enumerate() {
        *prediction = session.prediction(component);
    }
    for (component, scan_table) in tables.iter().enumerate() {
        for _ in 0..scan_table.units {
            let category = match reader.decode_symbol(scan_table.table)? {
                Decoded::Value(category) => category,
                Decoded::Marker(marker) => return Ok(Some(marker)),
            };
            match reader.decode_difference(category, predictions[component])? {
                Decoded::Value(difference) => predictions[component] += difference,
                Decoded::Marker(marker) => return Ok(Some(marker)),
            }
        }
    }
    session.store(predictions);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg_marker_code::{DHT, SOF3};
    use crate::segment_scanner::read_header_segments;
    use crate::test_util::{self, BitWriter, HuffmanCodes, JpegBuilder};
    use crate::warning::NullWarningListener;
    use test_log::test;

    fn decode_with(data: &[u8], generic: bool, warnings: &mut Vec<String>) -> Result<DecodedImage> {
        let mut input = ImageInput::from_slice(data);
        let segments = read_header_segments(&mut input, warnings)?;
        input.seek(0)?;
        let mut decoder = LosslessDecoder::new(&segments, &mut input, DecoderOptions::default())?;
        if generic {
            decoder = decoder.with_generic_path();
        }
        decoder.decode(warnings)
    }

    fn decode(data: &[u8]) -> Result<DecodedImage> {
        decode_with(data, false, &mut Vec::new())
    }

    fn gradient(width: usize, height: usize, seed: u16) -> Vec<u16> {
        (0..width * height)
            .map(|i| ((i * 37 + (i / width) * 11) as u16 + seed) % 256)
            .collect()
    }

    #[test]
    fn every_predictor_reconstructs_a_four_by_four_plane() {
        let plane: Vec<u16> = vec![
            10, 20, 30, 40, //
            15, 25, 35, 45, //
            200, 180, 160, 140, //
            0, 255, 0, 255,
        ];
        for selector in 0..=7 {
            let data = test_util::lossless_jpeg(&[plane.clone()], 4, 4, 8, selector, 0);
            let image = decode(&data).unwrap();
            assert_eq!((image.width, image.height), (4, 4));
            assert_eq!(image.planes, vec![plane.clone()], "selector {selector}");
        }
    }

    #[test]
    fn above_predictor_uses_edge_fallbacks() {
        // Differences 0, +5, 0, 0 on a 2x2 plane with predictor 2:
        // (0,0) = 128, (1,0) falls back to left = 133, (0,1) above = 128, (1,1) above = 133.
        let codes = HuffmanCodes::new(&test_util::STD_DC_LENGTHS, &test_util::STD_DC_VALUES);
        let mut writer = BitWriter::new();
        for difference in [0, 5, 0, 0] {
            test_util::write_difference(&mut writer, &codes, difference);
        }
        let data = JpegBuilder::new()
            .dht(0x00, &test_util::STD_DC_LENGTHS, &test_util::STD_DC_VALUES)
            .sof(SOF3, 8, 2, 2, &[(1, 0x11, 0)])
            .sos(&[(1, 0x00)], 2, 0)
            .raw(&writer.finish())
            .eoi()
            .build();
        let image = decode(&data).unwrap();
        assert_eq!(image.planes[0], vec![128, 133, 128, 133]);
    }

    #[test]
    fn single_three_and_generic_paths_agree() {
        let planes = vec![gradient(5, 3, 0), gradient(5, 3, 90), gradient(5, 3, 180)];
        let data = test_util::lossless_jpeg(&planes, 5, 3, 8, 4, 0);

        let fixed = decode_with(&data, false, &mut Vec::new()).unwrap();
        let generic = decode_with(&data, true, &mut Vec::new()).unwrap();
        assert_eq!(fixed, generic);
        assert_eq!(fixed.planes, planes);

        let single = test_util::lossless_jpeg(&planes[..1], 5, 3, 8, 4, 0);
        let fixed = decode_with(&single, false, &mut Vec::new()).unwrap();
        let generic = decode_with(&single, true, &mut Vec::new()).unwrap();
        assert_eq!(fixed, generic);
        assert_eq!(fixed.planes[0], planes[0]);
    }

    #[test]
    fn four_components_use_the_generic_path() {
        let planes: Vec<_> = (0..4).map(|c| gradient(3, 3, c * 50)).collect();
        let data = test_util::lossless_jpeg(&planes, 3, 3, 8, 7, 0);
        let image = decode(&data).unwrap();
        assert_eq!(image.component_count(), 4);
        assert_eq!(image.planes, planes);
    }

    #[test]
    fn sixteen_bit_samples_and_extreme_differences() {
        let plane: Vec<u16> = vec![0, 65535, 32768, 1, 40000, 0];
        let data = test_util::lossless_jpeg(&[plane.clone()], 3, 2, 16, 1, 0);
        let image = decode(&data).unwrap();
        assert_eq!(image.precision, 16);
        assert_eq!(image.planes[0], plane);
    }

    #[test]
    fn restart_intervals_reset_prediction() {
        let plane: Vec<u16> = vec![100, 110, 50, 60, 70, 80, 90, 10];
        let data = test_util::lossless_jpeg(&[plane.clone()], 4, 2, 8, 1, 2);
        let mut warnings = Vec::new();
        let image = decode_with(&data, false, &mut warnings).unwrap();
        assert_eq!(image.planes[0], plane);
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn restart_boundary_requires_restart_marker() {
        let plane: Vec<u16> = vec![100, 110, 50, 60];
        let data = test_util::lossless_jpeg(&[plane], 4, 1, 8, 1, 2);
        let rst = data
            .windows(2)
            .rposition(|w| w == [0xFF, 0xD0])
            .unwrap();

        let mut wrong_marker = data.clone();
        wrong_marker[rst + 1] = 0xC4;
        let err = decode(&wrong_marker).unwrap_err();
        assert!(matches!(err, JpegError::RestartMarkerNotFound { found: DHT }));

        let mut not_a_marker = data.clone();
        not_a_marker[rst] = 0x12;
        let err = decode(&not_a_marker).unwrap_err();
        assert!(matches!(err, JpegError::MarkerExpected { .. }));
    }

    #[test]
    fn junk_byte_before_restart_marker_is_fatal() {
        for plane in [vec![100u16, 110, 50, 60], vec![0, 255, 3, 200], vec![7, 7, 7, 7]] {
            let mut data = test_util::lossless_jpeg(&[plane.clone()], 4, 1, 8, 1, 2);
            assert_eq!(decode(&data).unwrap().planes, vec![plane.clone()]);

            let rst = data.windows(2).rposition(|w| w == [0xFF, 0xD0]).unwrap();
            data.insert(rst, 0x12);
            let err = decode(&data).unwrap_err();
            assert!(
                matches!(err, JpegError::MarkerExpected { .. }),
                "{plane:?}: {err}"
            );
        }
    }

    #[test]
    fn out_of_sequence_restart_marker_warns() {
        let plane: Vec<u16> = vec![100, 110, 50, 60];
        let mut data = test_util::lossless_jpeg(&[plane.clone()], 4, 1, 8, 1, 2);
        let rst = data.windows(2).rposition(|w| w == [0xFF, 0xD0]).unwrap();
        data[rst + 1] = 0xD3;
        let mut warnings = Vec::new();
        let image = decode_with(&data, false, &mut warnings).unwrap();
        assert_eq!(image.planes[0], plane);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("RST3"));
    }

    #[test]
    fn premature_marker_is_fatal() {
        let plane: Vec<u16> = (0..16).collect();
        let data = test_util::lossless_jpeg(&[plane], 4, 4, 8, 1, 0);
        let eoi = data.len() - 2;
        // Keep the first byte of entropy data only.
        let sos_end = data.windows(2).position(|w| w == [0xFF, 0xDA]).unwrap() + 2 + 8;
        let mut truncated = data[..sos_end + 1].to_vec();
        truncated.extend_from_slice(&data[eoi..]);
        let err = decode(&truncated).unwrap_err();
        assert!(matches!(err, JpegError::PrematureMarker { marker: EOI, .. }));
    }

    #[test]
    fn ac_labelled_table_is_used_for_dc() {
        let codes = HuffmanCodes::new(&test_util::STD_DC_LENGTHS, &test_util::STD_DC_VALUES);
        let mut writer = BitWriter::new();
        for difference in [-28, 2, 0, -1] {
            test_util::write_difference(&mut writer, &codes, difference);
        }
        let data = JpegBuilder::new()
            .dht(0x10, &test_util::STD_DC_LENGTHS, &test_util::STD_DC_VALUES)
            .sof(SOF3, 8, 1, 4, &[(1, 0x11, 0)])
            .sos(&[(1, 0x00)], 1, 0)
            .raw(&writer.finish())
            .eoi()
            .build();
        let mut warnings = Vec::new();
        let image = decode_with(&data, false, &mut warnings).unwrap();
        assert_eq!(image.planes[0], vec![100, 102, 102, 101]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Lossless JPEG with no DC tables"));
    }

    #[test]
    fn missing_table_and_unknown_component() {
        let data = JpegBuilder::new()
            .sof(SOF3, 8, 1, 1, &[(1, 0x11, 0)])
            .sos(&[(1, 0x00)], 1, 0)
            .raw(&[0x00])
            .eoi()
            .build();
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, JpegError::MissingHuffmanTable { class: "DC", id: 0 }));

        let data = JpegBuilder::new()
            .dht(0x00, &test_util::STD_DC_LENGTHS, &test_util::STD_DC_VALUES)
            .sof(SOF3, 8, 1, 1, &[(1, 0x11, 0)])
            .sos(&[(9, 0x00)], 1, 0)
            .raw(&[0x00])
            .eoi()
            .build();
        let err = decode(&data).unwrap_err();
        assert!(matches!(err, JpegError::UnknownComponentId(9)));
    }

    #[test]
    fn height_from_define_number_of_lines() {
        let plane: Vec<u16> = (0..12).map(|v| v * 20).collect();
        let data = test_util::lossless_jpeg(&[plane.clone()], 4, 3, 8, 1, 0);
        // Rewrite the SOF height to zero and append DNL before EOI.
        let sof = data.windows(2).position(|w| w == [0xFF, 0xC3]).unwrap();
        let mut deferred = data.clone();
        deferred[sof + 5] = 0;
        deferred[sof + 6] = 0;
        let eoi = deferred.len() - 2;
        deferred.splice(eoi..eoi, [0xFF, 0xDC, 0x00, 0x04, 0x00, 0x03]);

        let image = decode(&deferred).unwrap();
        assert_eq!(image.height, 3);
        assert_eq!(image.planes[0], plane);
    }

    #[test]
    fn second_scan_is_unsupported() {
        let plane: Vec<u16> = vec![1, 2, 3, 4];
        let data = test_util::lossless_jpeg(&[plane], 2, 2, 8, 1, 0);
        let eoi = data.len() - 2;
        let mut two_scans = data[..eoi].to_vec();
        two_scans.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x01, 0x00, 0x00]);
        two_scans.extend_from_slice(&[0xFF, 0xD9]);
        let err = decode(&two_scans).unwrap_err();
        assert!(matches!(err, JpegError::Unsupported(_)));
    }

    #[test]
    fn quantization_tables_are_enhanced_once() {
        let data = JpegBuilder::new()
            .dqt(0, &[1; 64])
            .dht(0x00, &test_util::STD_DC_LENGTHS, &test_util::STD_DC_VALUES)
            .sof(SOF3, 8, 1, 1, &[(1, 0x11, 0)])
            .build();
        let mut input = ImageInput::from_slice(&data);
        let segments = read_header_segments(&mut input, &mut NullWarningListener).unwrap();
        let decoder = LosslessDecoder::new(&segments, &mut input, DecoderOptions::default()).unwrap();
        assert_eq!(decoder.quantization_table(0).unwrap().values()[0], 126);
        assert!(decoder.quantization_table(1).is_none());
    }

    #[test]
    fn rejects_oversized_frames() {
        let data = test_util::lossless_jpeg(&[vec![0; 16]], 4, 4, 8, 1, 0);
        let mut input = ImageInput::from_slice(&data);
        let segments = read_header_segments(&mut input, &mut NullWarningListener).unwrap();
        input.seek(0).unwrap();
        let options = DecoderOptions::default().with_max_image_pixels(15);
        let mut decoder = LosslessDecoder::new(&segments, &mut input, options).unwrap();
        let err = decoder.decode(&mut NullWarningListener).unwrap_err();
        assert!(matches!(err, JpegError::Unsupported(_)));
    }
}
