//! Pixel assembly: turns decoded component planes into a concrete pixel buffer.

use crate::error::{JpegError, Result};
use crate::lossless::DecodedImage;

/// Byte order of the three channels in an [`PixelBuffer::Rgb24`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelBuffer {
    Gray8(Vec<u8>),
    /// Samples keep their declared depth; `bits_per_sample` is between 9 and 16.
    Gray16 {
        data: Vec<u16>,
        bits_per_sample: u8,
    },
    Rgb24 {
        data: Vec<u8>,
        order: ChannelOrder,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub buffer: PixelBuffer,
}

impl Image {
    pub fn component_count(&self) -> usize {
        match self.buffer {
            PixelBuffer::Gray8(_) | PixelBuffer::Gray16 { .. } => 1,
            PixelBuffer::Rgb24 { .. } => 3,
        }
    }

    pub fn bits_per_sample(&self) -> u8 {
        match self.buffer {
            PixelBuffer::Gray16 {
                bits_per_sample, ..
            } => bits_per_sample,
            _ => 8,
        }
    }
}

pub fn assemble(image: &DecodedImage, order: ChannelOrder) -> Result<Image> {
    let buffer = match (image.component_count(), image.precision) {
        (1, 8) => PixelBuffer::Gray8(image.planes[0].iter().map(|&v| v as u8).collect()),
        (1, 9..=16) => PixelBuffer::Gray16 {
            data: image.planes[0].clone(),
            bits_per_sample: image.precision,
        },
        (3, 8) => {
            let channels = match order {
                ChannelOrder::Rgb => [0, 1, 2],
                ChannelOrder::Bgr => [2, 1, 0],
            };
            let count = image.width * image.height;
            let mut data = Vec::with_capacity(count * 3);
            for index in 0..count {
                data.extend(channels.iter().map(|&c| image.planes[c][index] as u8));
            }
            PixelBuffer::Rgb24 { data, order }
        }
        (components, precision) => {
            return Err(JpegError::Unsupported(format!(
                "JPEG Lossless with {precision} bit precision and {components} component(s) not supported"
            )));
        }
    };
    Ok(Image {
        width: image.width,
        height: image.height,
        buffer,
    })
}
