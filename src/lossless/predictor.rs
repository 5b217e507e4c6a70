use crate::error::{JpegError, Result};

/// Lossless predictor, selected by the scan's spectral selection start (Ss).
/// Ra is the sample to the left, Rb the sample above, Rc the sample to the upper-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predictor {
    /// Selector 0. Only the first sample of a scan or restart interval has no reference;
    /// after that the left neighbour is used.
    None,
    Left,
    Above,
    UpperLeft,
    Plane,
    LeftPlusHalfVertical,
    AbovePlusHalfHorizontal,
    Average,
}

impl TryFrom<u8> for Predictor {
    type Error = JpegError;
    fn try_from(selector: u8) -> Result<Self> {
        match selector {
            0 => Ok(Self::None),
            1 => Ok(Self::Left),
            2 => Ok(Self::Above),
            3 => Ok(Self::UpperLeft),
            4 => Ok(Self::Plane),
            5 => Ok(Self::LeftPlusHalfVertical),
            6 => Ok(Self::AbovePlusHalfHorizontal),
            7 => Ok(Self::Average),
            other => Err(JpegError::Unsupported(format!(
                "lossless predictor selection value {other}"
            ))),
        }
    }
}

impl Predictor {
    pub fn predict(self, ra: i32, rb: i32, rc: i32) -> i32 {
        match self {
            Self::None | Self::Left => ra,
            Self::Above => rb,
            Self::UpperLeft => rc,
            Self::Plane => ra + rb - rc,
            Self::LeftPlusHalfVertical => ra + ((rb - rc) >> 1),
            Self::AbovePlusHalfHorizontal => rb + ((ra - rc) >> 1),
            Self::Average => ((ra as i64 + rb as i64) / 2) as i32,
        }
    }
}

/// Neighbours of sample `(x, y)` in a row-major plane of `width` columns, with the edge
/// fallbacks: left falls back to above, above to left, upper-left to above. `(0, 0)` has no
/// neighbours and is never asked for.
pub fn neighbours(plane: &[u16], width: usize, x: usize, y: usize) -> (i32, i32, i32) {
    let index = y * width + x;
    let left = if x > 0 {
        plane[index - 1] as i32
    } else {
        plane[index - width] as i32
    };
    let above = if y > 0 { plane[index - width] as i32 } else { left };
    let upper_left = if x > 0 && y > 0 {
        plane[index - width - 1] as i32
    } else {
        above
    };
    (left, above, upper_left)
}
