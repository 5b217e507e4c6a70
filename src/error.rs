use thiserror::Error;

#[derive(Error, Debug)]
pub enum JpegError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a JPEG stream (expected SOI, found 0x{found:04x})")]
    NotAJpegStream { found: u16 },
    #[error("Bad marker 0x{marker:04x} at offset {offset}")]
    BadMarker { marker: u16, offset: u64 },
    #[error("Marker expected, found 0x{found:02x}")]
    MarkerExpected { found: u8 },
    #[error("Bad segment length for {segment}: declared {declared}, expected {expected}")]
    BadSegmentLength {
        segment: &'static str,
        declared: usize,
        expected: usize,
    },
    #[error("{segment} table id {id} out of range")]
    InvalidTableId { segment: &'static str, id: u8 },
    #[error("Huffman table class {class} out of range")]
    InvalidTableClass { class: u8 },
    #[error("Quantization table {id}: unsupported precision nibble {precision}")]
    InvalidQuantizationPrecision { id: u8, precision: u8 },
    #[error("Huffman table error: {0}")]
    HuffmanTableOverflow(&'static str),
    #[error("Invalid Huffman code in entropy-coded data")]
    InvalidHuffmanCode,
    #[error("No {class} Huffman table with id {id}")]
    MissingHuffmanTable { class: &'static str, id: u8 },
    #[error("Missing {0} segment")]
    MissingSegment(&'static str),
    #[error("Unknown component id {0} in scan")]
    UnknownComponentId(u8),
    #[error("Restart marker expected, found 0x{found:04x}")]
    RestartMarkerNotFound { found: u16 },
    #[error("Premature marker 0x{marker:04x} at pixel ({x}, {y})")]
    PrematureMarker { marker: u16, x: usize, y: usize },
    #[error("Unknown JFXX extension code 0x{0:02x}")]
    UnknownJfxxExtension(u8),
    #[error("Invalid {identifier} segment: {reason}")]
    InvalidApplicationSegment {
        identifier: &'static str,
        reason: &'static str,
    },
    #[error("Not supported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, JpegError>;

impl JpegError {
    /// True when the stream ended before the requested bytes were available.
    pub fn is_eof(&self) -> bool {
        matches!(self, JpegError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

impl From<JpegError> for std::io::Error {
    fn from(error: JpegError) -> Self {
        match error {
            JpegError::Io(e) => e,
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
