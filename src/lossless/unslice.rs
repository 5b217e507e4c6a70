//! CR2 slice descrambling.
//!
//! Canon raw files store the sensor image as vertical slices: `count` slices of `width` samples
//! followed by one slice of `last_width` samples, each slice stored top to bottom before the
//! next one starts. The decoder sees that storage as an ordinary raster; this module maps it
//! back to row-major order. Widths count samples, so interleaved components are moved as-is.

use crate::error::{JpegError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slices {
    pub count: usize,
    pub width: usize,
    pub last_width: usize,
}

impl Slices {
    pub fn new(count: usize, width: usize, last_width: usize) -> Self {
        Self {
            count,
            width,
            last_width,
        }
    }

    /// Samples per output row.
    pub fn row_width(&self) -> usize {
        self.count * self.width + self.last_width
    }

    fn widths(&self) -> impl Iterator<Item = usize> {
        std::iter::repeat_n(self.width, self.count).chain(std::iter::once(self.last_width))
    }
}

pub fn unslice<T: Copy>(samples: &[T], slices: &Slices, height: usize) -> Result<Vec<T>> {
    let row_width = slices.row_width();
    if row_width == 0 || samples.len() != row_width * height {
        return Err(JpegError::Unsupported(format!(
            "{} samples do not fill {} slices of width {} and one of width {} over {height} rows",
            samples.len(),
            slices.count,
            slices.width,
            slices.last_width
        )));
    }

    let mut output = Vec::with_capacity(samples.len());
    output.extend_from_slice(samples);

    let mut source = 0;
    let mut column = 0;
    for width in slices.widths() {
        for row in 0..height {
            let target = row * row_width + column;
            output[target..target + width].copy_from_slice(&samples[source..source + width]);
            source += width;
        }
        column += width;
    }
    Ok(output)
}
