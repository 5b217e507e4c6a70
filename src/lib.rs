pub mod color;
pub mod constants;
pub mod decoder_options;
pub mod error;
pub mod icc;
pub mod image_input;
pub mod jpeg_marker_code;
pub mod lossless;
pub mod pixels;
pub mod quality;
pub mod reader;
pub mod segment;
pub mod segment_image_input;
pub mod segment_scanner;
pub mod warning;

#[cfg(test)]
mod test_util;

pub use color::JpegColorSpace;
pub use decoder_options::{AppSegmentFilter, DecoderOptions};
pub use error::{JpegError, Result};
pub use image_input::ImageInput;
pub use lossless::{DecodedImage, LosslessDecoder, Slices};
pub use pixels::{ChannelOrder, Image, PixelBuffer};
pub use reader::LosslessJpegReader;
pub use segment::Segment;
pub use segment_image_input::SegmentImageInput;
pub use segment_scanner::{LocatedSegment, SegmentScanner, read_header_segments, scan_segments};
pub use warning::{NullWarningListener, WarningFn, WarningListener};
