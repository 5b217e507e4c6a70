use crate::jpeg_marker_code::{APP1, APP14};
use crate::segment::application::{ADOBE_IDENTIFIER, EXIF_IDENTIFIER};

/// Decoder configuration, passed in at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Dump tables and scan parameters at `debug` level.
    pub debug: bool,
    /// Upper bound on `width * height`; larger frames are rejected before allocation.
    pub max_image_pixels: u64,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            debug: false,
            max_image_pixels: i32::MAX as u64,
        }
    }
}

impl DecoderOptions {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_image_pixels(mut self, max_image_pixels: u64) -> Self {
        self.max_image_pixels = max_image_pixels;
        self
    }
}

/// APPn segments the filtered stream passes through. Everything else in the APP0..APP15 range
/// is hidden from the logical stream but still listed among the physical segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSegmentFilter {
    keep: Vec<(u16, String)>,
}

impl Default for AppSegmentFilter {
    fn default() -> Self {
        Self {
            keep: vec![
                (APP1, EXIF_IDENTIFIER.to_owned()),
                (APP14, ADOBE_IDENTIFIER.to_owned()),
            ],
        }
    }
}

impl AppSegmentFilter {
    /// Filters every APPn segment.
    pub fn none() -> Self {
        Self { keep: Vec::new() }
    }

    pub fn with(mut self, marker: u16, identifier: impl Into<String>) -> Self {
        self.keep.push((marker, identifier.into()));
        self
    }

    pub fn keeps(&self, marker: u16, identifier: Option<&str>) -> bool {
        identifier.is_some_and(|identifier| {
            self.keep
                .iter()
                .any(|(m, id)| *m == marker && id == identifier)
        })
    }
}
