//! Entropy-coded segment reader: removes 0xFF00 stuffing and stops at markers.
//!
//! Bytes are pulled from the input only as needed. Once a marker is seen nothing further is
//! read; the remaining bits in the accumulator are decoded and a symbol that would need bits
//! beyond them yields the marker instead.

use super::huffman::{HuffmanLookupTable, Lookup};
use crate::error::{JpegError, Result};
use crate::image_input::ImageInput;
use crate::jpeg_marker_code::JPEG_MARKER_START_BYTE;
use std::io::{Read, Seek};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<T> {
    Value(T),
    /// Full two-byte marker that interrupted decoding.
    Marker(u16),
}

pub struct EntropyReader<'a, R> {
    input: &'a mut ImageInput<R>,
    bits: u64,
    count: u32,
    marker: Option<u8>,
}

impl<'a, R: Read + Seek> EntropyReader<'a, R> {
    pub fn new(input: &'a mut ImageInput<R>) -> Self {
        Self {
            input,
            bits: 0,
            count: 0,
            marker: None,
        }
    }

    fn fill(&mut self, needed: u32) -> Result<()> {
        while self.count < needed && self.marker.is_none() {
            let byte = self.input.read_u8()?;
            if byte == JPEG_MARKER_START_BYTE {
                let mut next = self.input.read_u8()?;
                if next != 0x00 {
                    while next == JPEG_MARKER_START_BYTE {
                        next = self.input.read_u8()?;
                    }
                    self.marker = Some(next);
                    break;
                }
            }
            self.bits = (self.bits << 8) | byte as u64;
            self.count += 8;
        }
        Ok(())
    }

    /// Next `n` bits, MSB first, padded with one bits past the real data.
    fn peek(&self, n: u32) -> u32 {
        let mask = (1u64 << n) - 1;
        if self.count >= n {
            ((self.bits >> (self.count - n)) & mask) as u32
        } else {
            let missing = n - self.count;
            (((self.bits << missing) | ((1 << missing) - 1)) & mask) as u32
        }
    }

    fn consume(&mut self, n: u32) {
        self.count -= n;
        self.bits &= (1u64 << self.count) - 1;
    }

    fn take_marker(&mut self) -> Option<u16> {
        self.marker
            .take()
            .map(|code| (JPEG_MARKER_START_BYTE as u16) << 8 | code as u16)
    }

    fn marker_or<T>(&mut self, error: JpegError) -> Result<Decoded<T>> {
        match self.take_marker() {
            Some(marker) => Ok(Decoded::Marker(marker)),
            None => Err(error),
        }
    }

    /// Decodes one Huffman symbol.
    pub fn decode_symbol(&mut self, table: &HuffmanLookupTable) -> Result<Decoded<u8>> {
        self.fill(16)?;
        let lookup = match table.lookup_root(self.peek(8) as u8) {
            Lookup::Extension(extension) => {
                table.lookup_extension(extension, self.peek(16) as u8)
            }
            other => other,
        };
        match lookup {
            Lookup::Code { length, value } if length as u32 <= self.count => {
                self.consume(length as u32);
                Ok(Decoded::Value(value))
            }
            _ => self.marker_or(JpegError::InvalidHuffmanCode),
        }
    }

    /// Reads the `category` extra bits of a difference and extends them to a signed value.
    /// Category 16 carries no extra bits and stands for 32768 with the sign opposite to the
    /// running prediction.
    pub fn decode_difference(&mut self, category: u8, prediction: i32) -> Result<Decoded<i32>> {
        match category {
            0 => Ok(Decoded::Value(0)),
            16 => Ok(Decoded::Value(if prediction >= 0 { -32768 } else { 32768 })),
            1..=15 => {
                let n = category as u32;
                self.fill(n)?;
                if self.count < n {
                    return self.marker_or(JpegError::InvalidHuffmanCode);
                }
                let raw = self.peek(n) as i32;
                self.consume(n);
                Ok(Decoded::Value(extend(raw, n)))
            }
            _ => Err(JpegError::InvalidHuffmanCode),
        }
    }

    /// Returns the next marker, skipping 0xFF fill bytes. Only the one-bit padding of the last
    /// byte may be left unconsumed.
    pub fn read_marker(&mut self) -> Result<u16> {
        if self.count >= 8 {
            return Err(JpegError::MarkerExpected {
                found: (self.bits >> (self.count - 8)) as u8,
            });
        }
        let padding = (1u64 << self.count) - 1;
        if self.bits != padding {
            return Err(JpegError::MarkerExpected {
                found: self.bits as u8,
            });
        }
        self.bits = 0;
        self.count = 0;
        if let Some(marker) = self.take_marker() {
            return Ok(marker);
        }
        let byte = self.input.read_u8()?;
        if byte != JPEG_MARKER_START_BYTE {
            return Err(JpegError::MarkerExpected { found: byte });
        }
        let mut code = self.input.read_u8()?;
        while code == JPEG_MARKER_START_BYTE {
            code = self.input.read_u8()?;
        }
        if code == 0x00 {
            return Err(JpegError::MarkerExpected {
                found: JPEG_MARKER_START_BYTE,
            });
        }
        Ok((JPEG_MARKER_START_BYTE as u16) << 8 | code as u16)
    }
}

fn extend(value: i32, n: u32) -> i32 {
    if value < 1 << (n - 1) {
        value + (-1 << n) + 1
    } else {
        value
    }
}
