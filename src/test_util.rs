//! Encoder-side helpers for building synthetic lossless JPEG streams in tests.
//!
//! Only depends on std so integration tests can include it as well.

#![allow(dead_code)]

/// Packs bits MSB first with 0xFF00 stuffing, padding the last byte with ones.
pub struct BitWriter {
    bytes: Vec<u8>,
    buffer: u32,
    count: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            buffer: 0,
            count: 0,
        }
    }

    pub fn write_bits(&mut self, value: u32, length: u32) {
        if length == 0 {
            return;
        }
        let mask = (1u32 << length) - 1;
        self.buffer = (self.buffer << length) | (value & mask);
        self.count += length;
        while self.count >= 8 {
            self.count -= 8;
            let byte = (self.buffer >> self.count) as u8;
            self.bytes.push(byte);
            if byte == 0xFF {
                self.bytes.push(0x00);
            }
            self.buffer &= (1u32 << self.count) - 1;
        }
    }

    pub fn finish(mut self) -> Vec<u8> {
        if self.count > 0 {
            let pad = 8 - self.count;
            self.write_bits((1 << pad) - 1, pad);
        }
        self.bytes
    }
}

/// Standard DC luminance table, categories 0..=11.
pub const STD_DC_LENGTHS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
pub const STD_DC_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// DC table covering every lossless category, 0..=16.
pub const FULL_DC_LENGTHS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0];
pub const FULL_DC_VALUES: [u8; 17] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];

/// Canonical code for every symbol of a (lengths, values) table.
pub struct HuffmanCodes {
    codes: [(u16, u8); 256],
}

impl HuffmanCodes {
    pub fn new(lengths: &[u8; 16], values: &[u8]) -> Self {
        let mut codes = [(0u16, 0u8); 256];
        let mut code = 0u16;
        let mut symbols = values.iter();
        for (i, &count) in lengths.iter().enumerate() {
            for _ in 0..count {
                let symbol = *symbols.next().expect("missing symbol");
                codes[symbol as usize] = (code, i as u8 + 1);
                code += 1;
            }
            code <<= 1;
        }
        Self { codes }
    }

    pub fn write(&self, writer: &mut BitWriter, symbol: u8) {
        let (code, length) = self.codes[symbol as usize];
        assert!(length > 0, "symbol {symbol} has no code");
        writer.write_bits(code as u32, length as u32);
    }
}

pub fn category(difference: i32) -> u8 {
    (32 - difference.unsigned_abs().leading_zeros()) as u8
}

/// Writes one difference: its category symbol, then the extra bits (ones' complement for
/// negative values).
pub fn write_difference(writer: &mut BitWriter, codes: &HuffmanCodes, difference: i32) {
    if difference == 32768 {
        codes.write(writer, 16);
        return;
    }
    let category = category(difference);
    codes.write(writer, category);
    if category > 0 {
        let bits = if difference >= 0 {
            difference
        } else {
            difference + (1 << category) - 1
        };
        writer.write_bits(bits as u32, category as u32);
    }
}

/// Reference prediction for sample `(x, y)` of a plane, independent of the decoder.
pub fn predict(plane: &[u16], width: usize, x: usize, y: usize, selector: u8) -> i32 {
    let at = |x: usize, y: usize| plane[y * width + x] as i32;
    let (ra, rb, rc) = match (x, y) {
        (0, 0) => unreachable!("first sample uses the first value"),
        (_, 0) => (at(x - 1, 0), at(x - 1, 0), at(x - 1, 0)),
        (0, _) => (at(0, y - 1), at(0, y - 1), at(0, y - 1)),
        _ => (at(x - 1, y), at(x, y - 1), at(x - 1, y - 1)),
    };
    match selector {
        0 | 1 => ra,
        2 => rb,
        3 => rc,
        4 => ra + rb - rc,
        5 => ra + ((rb - rc) >> 1),
        6 => rb + ((ra - rc) >> 1),
        7 => ((ra as i64 + rb as i64) / 2) as i32,
        _ => panic!("bad selector {selector}"),
    }
}

/// Differences for interleaved planes, grouped per restart interval
/// (`restart_interval == 0` gives one group).
pub fn lossless_differences(
    planes: &[Vec<u16>],
    width: usize,
    height: usize,
    selector: u8,
    precision: u8,
    restart_interval: usize,
) -> Vec<Vec<i32>> {
    let first_value = 1i32 << (precision - 1);
    let mut intervals = vec![Vec::new()];
    for index in 0..width * height {
        let (x, y) = (index % width, index / width);
        let interval_start = restart_interval > 0 && index % restart_interval == 0;
        if interval_start && index > 0 {
            intervals.push(Vec::new());
        }
        for plane in planes {
            let prediction = if index == 0 || interval_start {
                first_value
            } else {
                predict(plane, width, x, y, selector)
            };
            let mut difference = (plane[index] as i32 - prediction).rem_euclid(65536);
            if difference > 32768 {
                difference -= 65536;
            }
            intervals.last_mut().unwrap().push(difference);
        }
    }
    intervals
}

/// Entropy-coded data for the given intervals, separated by cycling RSTn markers.
pub fn encode_intervals(intervals: &[Vec<i32>], codes: &HuffmanCodes) -> Vec<u8> {
    let mut data = Vec::new();
    for (i, interval) in intervals.iter().enumerate() {
        if i > 0 {
            data.extend_from_slice(&[0xFF, 0xD0 + ((i - 1) % 8) as u8]);
        }
        let mut writer = BitWriter::new();
        for &difference in interval {
            write_difference(&mut writer, codes, difference);
        }
        data.extend(writer.finish());
    }
    data
}

/// Assembles marker segments into a JPEG byte stream.
pub struct JpegBuilder {
    bytes: Vec<u8>,
}

impl JpegBuilder {
    pub fn new() -> Self {
        Self {
            bytes: vec![0xFF, 0xD8],
        }
    }

    pub fn segment(mut self, marker: u16, payload: &[u8]) -> Self {
        self.bytes.extend_from_slice(&marker.to_be_bytes());
        self.bytes
            .extend_from_slice(&(payload.len() as u16 + 2).to_be_bytes());
        self.bytes.extend_from_slice(payload);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn dqt(self, id: u8, values: &[u8; 64]) -> Self {
        let mut payload = vec![id];
        payload.extend_from_slice(values);
        self.segment(0xFFDB, &payload)
    }

    /// `class_id` is the Tc/Th byte.
    pub fn dht(self, class_id: u8, lengths: &[u8; 16], values: &[u8]) -> Self {
        let mut payload = vec![class_id];
        payload.extend_from_slice(lengths);
        payload.extend_from_slice(values);
        self.segment(0xFFC4, &payload)
    }

    pub fn dri(self, interval: u16) -> Self {
        self.segment(0xFFDD, &interval.to_be_bytes())
    }

    /// `components` are (id, sampling byte, quantization table selector).
    pub fn sof(
        self,
        marker: u16,
        precision: u8,
        lines: u16,
        width: u16,
        components: &[(u8, u8, u8)],
    ) -> Self {
        let mut payload = vec![precision];
        payload.extend_from_slice(&lines.to_be_bytes());
        payload.extend_from_slice(&width.to_be_bytes());
        payload.push(components.len() as u8);
        for &(id, sampling, tq) in components {
            payload.extend_from_slice(&[id, sampling, tq]);
        }
        self.segment(marker, &payload)
    }

    /// `components` are (selector, Td/Ta byte).
    pub fn sos(self, components: &[(u8, u8)], predictor: u8, point_transform: u8) -> Self {
        let mut payload = vec![components.len() as u8];
        for &(selector, tables) in components {
            payload.extend_from_slice(&[selector, tables]);
        }
        payload.extend_from_slice(&[predictor, 0, point_transform]);
        self.segment(0xFFDA, &payload)
    }

    pub fn eoi(self) -> Self {
        self.raw(&[0xFF, 0xD9])
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Complete single-scan lossless stream for the given planes, all using DC table 0.
pub fn lossless_jpeg(
    planes: &[Vec<u16>],
    width: u16,
    height: u16,
    precision: u8,
    selector: u8,
    restart_interval: u16,
) -> Vec<u8> {
    let ids: Vec<u8> = (1..=planes.len() as u8).collect();
    let frame: Vec<(u8, u8, u8)> = ids.iter().map(|&id| (id, 0x11, 0)).collect();
    let scan: Vec<(u8, u8)> = ids.iter().map(|&id| (id, 0x00)).collect();
    let intervals = lossless_differences(
        planes,
        width as usize,
        height as usize,
        selector,
        precision,
        restart_interval as usize,
    );
    let codes = HuffmanCodes::new(&FULL_DC_LENGTHS, &FULL_DC_VALUES);

    let mut builder = JpegBuilder::new().dht(0x00, &FULL_DC_LENGTHS, &FULL_DC_VALUES);
    if restart_interval > 0 {
        builder = builder.dri(restart_interval);
    }
    builder
        .sof(0xFFC3, precision, height, width, &frame)
        .sos(&scan, selector, 0)
        .raw(&encode_intervals(&intervals, &codes))
        .eoi()
        .build()
}
