//! High-level reader for lossless JPEG streams.

use crate::color::{JpegColorSpace, resolve_color_space};
use crate::decoder_options::DecoderOptions;
use crate::error::{JpegError, Result};
use crate::icc::assemble_icc_profile;
use crate::image_input::ImageInput;
use crate::jpeg_marker_code::{SOF3, marker_name};
use crate::lossless::{DecodedImage, LosslessDecoder, Slices, unslice};
use crate::pixels::{ChannelOrder, Image, assemble};
use crate::quality::{estimate_quality, quantization_tables};
use crate::segment::{Frame, Segment};
use crate::segment_scanner::read_header_segments;
use crate::warning::WarningListener;
use std::io::{Read, Seek};
use tracing::{debug, instrument};

/// Reads the header segments once on construction; decoding re-reads the stream from SOI.
pub struct LosslessJpegReader<R> {
    input: ImageInput<R>,
    options: DecoderOptions,
    segments: Vec<Segment>,
    start: u64,
}

impl<R: Read + Seek> LosslessJpegReader<R> {
    pub fn new(
        inner: R,
        options: DecoderOptions,
        listener: &mut dyn WarningListener,
    ) -> Result<Self> {
        let mut input = ImageInput::new(inner);
        let start = input.position()?;
        let segments = read_header_segments(&mut input, listener)?;
        debug!(count = segments.len(), "read header segments");
        Ok(Self {
            input,
            options,
            segments,
            start,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn frame(&self) -> Result<&Frame> {
        self.segments
            .iter()
            .find_map(|segment| match segment {
                Segment::Frame(frame) => Some(frame),
                _ => None,
            })
            .ok_or(JpegError::MissingSegment("SOF"))
    }

    pub fn color_space(&self, listener: &mut dyn WarningListener) -> Result<JpegColorSpace> {
        resolve_color_space(&self.segments, self.frame()?, listener)
    }

    pub fn icc_profile(&self, listener: &mut dyn WarningListener) -> Option<Vec<u8>> {
        assemble_icc_profile(&self.segments, listener)
    }

    pub fn quality(&self) -> Option<u8> {
        estimate_quality(&quantization_tables(&self.segments))
    }

    /// Decodes the first scan into component planes.
    #[instrument(level = "debug", skip_all, err)]
    pub fn decode(&mut self, listener: &mut dyn WarningListener) -> Result<DecodedImage> {
        let marker = self.frame()?.marker;
        if marker != SOF3 {
            return Err(JpegError::Unsupported(format!(
                "{} frames; only lossless Huffman (SOF3) is decoded",
                marker_name(marker)
            )));
        }
        self.input.seek(self.start)?;
        let mut decoder = LosslessDecoder::new(&self.segments, &mut self.input, self.options)?;
        decoder.decode(listener)
    }

    pub fn read_image(
        &mut self,
        order: ChannelOrder,
        listener: &mut dyn WarningListener,
    ) -> Result<Image> {
        let decoded = self.decode(listener)?;
        assemble(&decoded, order)
    }

    /// Decodes a CR2 raw image stored in vertical slices. The interleaved samples are
    /// rearranged into a single plane `slices.row_width()` samples wide.
    pub fn unslice(
        &mut self,
        slices: &Slices,
        listener: &mut dyn WarningListener,
    ) -> Result<DecodedImage> {
        let decoded = self.decode(listener)?;
        let samples = decoded.interleaved();
        let height = samples.len() / slices.row_width().max(1);
        let plane = unslice(&samples, slices, height)?;
        Ok(DecodedImage {
            width: slices.row_width(),
            height,
            precision: decoded.precision,
            planes: vec![plane],
        })
    }

    pub fn into_inner(self) -> R {
        self.input.into_inner()
    }
}
