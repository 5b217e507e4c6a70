//! Source color space inference.
//!
//! JPEG carries no reliable color space field. The guess combines the JFIF and Adobe APP
//! segments with the SOF component count and ids, following libjpeg's `jdapimin.c` heuristics.

use crate::error::{JpegError, Result};
use crate::jpeg_marker_code::{APP0, APP14};
use crate::segment::application::{ADOBE_IDENTIFIER, JFIF_IDENTIFIER};
use crate::segment::{AdobeDct, AdobeTransform, Frame, Segment};
use crate::warning::{WarningListener, emit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    Gray,
    GrayA,
    YCbCr,
    Rgb,
    PhotoYcc,
    YCbCrA,
    Rgba,
    PhotoYcca,
    Cmyk,
    Ycck,
}

pub fn source_color_space(
    jfif_present: bool,
    adobe: Option<&AdobeDct>,
    frame: &Frame,
) -> Result<JpegColorSpace> {
    let ids: Vec<u8> = frame.components.iter().map(|c| c.id).collect();
    let color_space = match ids.as_slice() {
        [_] => JpegColorSpace::Gray,
        [_, _] => JpegColorSpace::GrayA,
        [_, _, _] if jfif_present => JpegColorSpace::YCbCr,
        [_, _, _] if adobe.is_some() => match adobe.map(|a| a.transform) {
            Some(AdobeTransform::Unknown) => JpegColorSpace::Rgb,
            _ => JpegColorSpace::YCbCr,
        },
        [1, 2, 3] => JpegColorSpace::YCbCr,
        [b'R', b'G', b'B'] => JpegColorSpace::Rgb,
        [b'Y', b'C', b'c'] => JpegColorSpace::PhotoYcc,
        [_, _, _] => JpegColorSpace::YCbCr,
        [_, _, _, _] if adobe.is_some() => match adobe.map(|a| a.transform) {
            Some(AdobeTransform::Unknown) => JpegColorSpace::Cmyk,
            _ => JpegColorSpace::Ycck,
        },
        [1, 2, 3, 4] => JpegColorSpace::YCbCrA,
        [b'R', b'G', b'B', b'A'] => JpegColorSpace::Rgba,
        [b'Y', b'C', b'c', b'A'] => JpegColorSpace::PhotoYcca,
        [_, _, _, _] => JpegColorSpace::Cmyk,
        _ => {
            return Err(JpegError::Unsupported(
                "Cannot determine source color space".into(),
            ));
        }
    };
    Ok(color_space)
}

/// Finds the JFIF and Adobe segments, drops the ones that contradict the frame and infers the
/// color space from what is left.
pub fn resolve_color_space(
    segments: &[Segment],
    frame: &Frame,
    listener: &mut dyn WarningListener,
) -> Result<JpegColorSpace> {
    let components = frame.component_count();
    let applications = segments.iter().filter_map(|segment| match segment {
        Segment::Application(app) => Some(app),
        _ => None,
    });

    let mut jfif_present = false;
    let mut adobe = None;
    for app in applications {
        if app.is(APP0, JFIF_IDENTIFIER) {
            jfif_present = true;
        } else if app.marker == APP14 && app.data.starts_with(ADOBE_IDENTIFIER.as_bytes()) {
            adobe = adobe.or(AdobeDct::parse(app).ok());
        }
    }

    if jfif_present && components != 1 && components != 3 {
        emit(
            listener,
            format!(
                "SOF{} has {components} color components, JFIF allows only 1 or 3 components. Ignoring JFIF marker.",
                frame.process()
            ),
        );
        jfif_present = false;
    }

    if let Some(dct) = adobe {
        let described = match dct.transform {
            AdobeTransform::YCC if components != 3 => Some("YCC/RGB"),
            AdobeTransform::YCCK if components != 4 => Some("YCCK/CMYK"),
            _ => None,
        };
        if let Some(described) = described {
            emit(
                listener,
                format!(
                    "Invalid Adobe App14 marker. Indicates {described} data, but SOF{} has {components} color component(s). Ignoring Adobe App14 marker.",
                    frame.process()
                ),
            );
            adobe = None;
        }
    }

    source_color_space(jfif_present, adobe.as_ref(), frame)
}
