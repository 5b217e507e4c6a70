//! APPn segments and the typed views the reader understands.
//!
//! Application segments are kept verbatim. Views are parsed on demand from the raw payload.

use crate::error::{JpegError, Result};
use crate::jpeg_marker_code::{APP0, APP14, APP2};

pub const JFIF_IDENTIFIER: &str = "JFIF";
pub const JFXX_IDENTIFIER: &str = "JFXX";
pub const EXIF_IDENTIFIER: &str = "Exif";
pub const ADOBE_IDENTIFIER: &str = "Adobe";
pub const ICC_PROFILE_IDENTIFIER: &str = "ICC_PROFILE";

const MAX_IDENTIFIER_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub marker: u16,
    pub data: Vec<u8>,
}

impl Application {
    pub fn new(marker: u16, data: Vec<u8>) -> Self {
        Self { marker, data }
    }

    /// The NUL-terminated ASCII string at the start of the payload, if there is one.
    pub fn identifier(&self) -> Option<&str> {
        identifier(&self.data)
    }

    pub fn is(&self, marker: u16, identifier: &str) -> bool {
        self.marker == marker && self.identifier() == Some(identifier)
    }

    /// Bytes following the identifier and its terminator.
    pub fn payload(&self) -> &[u8] {
        match self.identifier() {
            Some(id) => &self.data[id.len() + 1..],
            None => &self.data,
        }
    }
}

pub(crate) fn identifier(data: &[u8]) -> Option<&str> {
    let end = data.iter().take(MAX_IDENTIFIER_LENGTH).position(|&b| b == 0)?;
    let id = &data[..end];
    if id.is_empty() || !id.is_ascii() {
        return None;
    }
    std::str::from_utf8(id).ok()
}

fn invalid(identifier: &'static str, reason: &'static str) -> JpegError {
    JpegError::InvalidApplicationSegment { identifier, reason }
}

/// APP0 "JFIF".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jfif {
    pub major_version: u8,
    pub minor_version: u8,
    pub units: u8,
    pub x_density: u16,
    pub y_density: u16,
    pub thumbnail_width: u8,
    pub thumbnail_height: u8,
    pub thumbnail: Vec<u8>,
}

impl Jfif {
    pub fn parse(app: &Application) -> Result<Self> {
        if !app.is(APP0, JFIF_IDENTIFIER) {
            return Err(invalid("JFIF", "not a JFIF segment"));
        }
        let data = app.payload();
        if data.len() < 9 {
            return Err(invalid("JFIF", "segment too short"));
        }
        let thumbnail_width = data[7];
        let thumbnail_height = data[8];
        let thumbnail_size = 3 * thumbnail_width as usize * thumbnail_height as usize;
        let thumbnail = data
            .get(9..9 + thumbnail_size)
            .ok_or_else(|| invalid("JFIF", "truncated thumbnail"))?
            .to_vec();

        Ok(Self {
            major_version: data[0],
            minor_version: data[1],
            units: data[2],
            x_density: u16::from_be_bytes([data[3], data[4]]),
            y_density: u16::from_be_bytes([data[5], data[6]]),
            thumbnail_width,
            thumbnail_height,
            thumbnail,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JfxxThumbnail {
    /// Extension code 0x10: the thumbnail is a complete JPEG stream.
    Jpeg(Vec<u8>),
    /// Extension code 0x11: one byte per pixel into a 256 entry RGB palette.
    Indexed {
        width: u8,
        height: u8,
        palette: Vec<u8>,
        pixels: Vec<u8>,
    },
    /// Extension code 0x13: three bytes per pixel.
    Rgb { width: u8, height: u8, pixels: Vec<u8> },
}

/// APP0 "JFXX" extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jfxx {
    pub extension_code: u8,
    pub thumbnail: JfxxThumbnail,
}

impl Jfxx {
    pub const JPEG: u8 = 0x10;
    pub const INDEXED: u8 = 0x11;
    pub const RGB: u8 = 0x13;

    pub fn parse(app: &Application) -> Result<Self> {
        if !app.is(APP0, JFXX_IDENTIFIER) {
            return Err(invalid("JFXX", "not a JFXX segment"));
        }
        let data = app.payload();
        let (&extension_code, rest) = data
            .split_first()
            .ok_or_else(|| invalid("JFXX", "missing extension code"))?;

        let thumbnail = match extension_code {
            Self::JPEG => JfxxThumbnail::Jpeg(rest.to_vec()),
            Self::INDEXED => {
                let (width, height, rest) = dimensions(rest)?;
                let pixel_count = width as usize * height as usize;
                if rest.len() < 768 + pixel_count {
                    return Err(invalid("JFXX", "truncated palette thumbnail"));
                }
                JfxxThumbnail::Indexed {
                    width,
                    height,
                    palette: rest[..768].to_vec(),
                    pixels: rest[768..768 + pixel_count].to_vec(),
                }
            }
            Self::RGB => {
                let (width, height, rest) = dimensions(rest)?;
                let size = 3 * width as usize * height as usize;
                let pixels = rest
                    .get(..size)
                    .ok_or_else(|| invalid("JFXX", "truncated RGB thumbnail"))?
                    .to_vec();
                JfxxThumbnail::Rgb {
                    width,
                    height,
                    pixels,
                }
            }
            other => return Err(JpegError::UnknownJfxxExtension(other)),
        };

        Ok(Self {
            extension_code,
            thumbnail,
        })
    }
}

fn dimensions(data: &[u8]) -> Result<(u8, u8, &[u8])> {
    match data {
        [width, height, rest @ ..] => Ok((*width, *height, rest)),
        _ => Err(invalid("JFXX", "missing thumbnail dimensions")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdobeTransform {
    /// RGB for three components, CMYK for four.
    Unknown,
    YCC,
    YCCK,
    Other(u8),
}

impl From<u8> for AdobeTransform {
    fn from(value: u8) -> Self {
        match value {
            0 => AdobeTransform::Unknown,
            1 => AdobeTransform::YCC,
            2 => AdobeTransform::YCCK,
            other => AdobeTransform::Other(other),
        }
    }
}

/// APP14 "Adobe" DCT encoding information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdobeDct {
    pub version: u16,
    pub flags0: u16,
    pub flags1: u16,
    pub transform: AdobeTransform,
}

impl AdobeDct {
    /// Length of the canonical segment, counting the length field.
    pub const SEGMENT_LENGTH: u16 = 14;

    pub fn parse(app: &Application) -> Result<Self> {
        // The version's high byte doubles as the identifier terminator.
        if app.marker != APP14 || !app.data.starts_with(ADOBE_IDENTIFIER.as_bytes()) {
            return Err(invalid("Adobe", "not an Adobe segment"));
        }
        let data = &app.data[ADOBE_IDENTIFIER.len()..];
        if data.len() < 7 {
            return Err(invalid("Adobe", "segment too short"));
        }
        Ok(Self {
            version: u16::from_be_bytes([data[0], data[1]]),
            flags0: u16::from_be_bytes([data[2], data[3]]),
            flags1: u16::from_be_bytes([data[4], data[5]]),
            transform: AdobeTransform::from(data[6]),
        })
    }
}

/// One APP2 "ICC_PROFILE" chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IccChunk<'a> {
    /// 1-based.
    pub sequence: u8,
    pub count: u8,
    pub data: &'a [u8],
}

impl<'a> IccChunk<'a> {
    pub fn parse(app: &'a Application) -> Result<Self> {
        if !app.is(APP2, ICC_PROFILE_IDENTIFIER) {
            return Err(invalid("ICC_PROFILE", "not an ICC profile segment"));
        }
        match app.payload() {
            [sequence, count, data @ ..] => Ok(Self {
                sequence: *sequence,
                count: *count,
                data,
            }),
            _ => Err(invalid("ICC_PROFILE", "missing chunk header")),
        }
    }
}
