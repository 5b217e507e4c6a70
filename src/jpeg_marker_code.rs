use num_enum::TryFromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum JpegMarkerCode {
    /// TEM: Temporary private use in arithmetic coding.
    Temporary = 0x01,

    /// SOF0: Baseline DCT, Huffman coding.
    StartOfFrameBaseline = 0xC0,
    /// SOF1: Extended sequential DCT, Huffman coding.
    StartOfFrameExtendedSequential = 0xC1,
    /// SOF2: Progressive DCT, Huffman coding.
    StartOfFrameProgressive = 0xC2,
    /// SOF3: Lossless (sequential), Huffman coding.
    StartOfFrameLossless = 0xC3,
    /// DHT: Defines one or more Huffman tables.
    DefineHuffmanTable = 0xC4,
    /// SOF5: Differential sequential DCT, Huffman coding.
    StartOfFrameDifferentialSequential = 0xC5,
    /// SOF6: Differential progressive DCT, Huffman coding.
    StartOfFrameDifferentialProgressive = 0xC6,
    /// SOF7: Differential lossless, Huffman coding.
    StartOfFrameDifferentialLossless = 0xC7,
    /// JPG: Reserved for JPEG extensions.
    JpegExtension = 0xC8,
    /// SOF9: Extended sequential DCT, arithmetic coding.
    StartOfFrameExtendedSequentialArithmetic = 0xC9,
    /// SOF10: Progressive DCT, arithmetic coding.
    StartOfFrameProgressiveArithmetic = 0xCA,
    /// SOF11: Lossless (sequential), arithmetic coding.
    StartOfFrameLosslessArithmetic = 0xCB,
    /// DAC: Defines arithmetic coding conditioning.
    DefineArithmeticCoding = 0xCC,
    /// SOF13: Differential sequential DCT, arithmetic coding.
    StartOfFrameDifferentialSequentialArithmetic = 0xCD,
    /// SOF14: Differential progressive DCT, arithmetic coding.
    StartOfFrameDifferentialProgressiveArithmetic = 0xCE,
    /// SOF15: Differential lossless, arithmetic coding.
    StartOfFrameDifferentialLosslessArithmetic = 0xCF,

    /// RST0..RST7: Restart markers inside entropy-coded data.
    Restart0 = 0xD0,
    Restart1 = 0xD1,
    Restart2 = 0xD2,
    Restart3 = 0xD3,
    Restart4 = 0xD4,
    Restart5 = 0xD5,
    Restart6 = 0xD6,
    Restart7 = 0xD7,

    /// SOI: Marks the start of an image.
    StartOfImage = 0xD8,
    /// EOI: Marks the end of an image.
    EndOfImage = 0xD9,
    /// SOS: Marks the start of scan.
    StartOfScan = 0xDA,
    /// DQT: Defines one or more quantization tables.
    DefineQuantizationTable = 0xDB,
    /// DNL: Defines the number of lines in a scan.
    DefineNumberOfLines = 0xDC,
    /// DRI: Defines the restart interval used in succeeding scans.
    DefineRestartInterval = 0xDD,
    /// DHP: Defines the hierarchical progression.
    DefineHierarchicalProgression = 0xDE,
    /// EXP: Expands reference components.
    ExpandReferenceComponents = 0xDF,

    /// APP0: Application data 0: used for JFIF header.
    ApplicationData0 = 0xE0,
    /// APP1: Application data 1: used for EXIF or XMP header.
    ApplicationData1 = 0xE1,
    /// APP2: Application data 2: used for ICC profile.
    ApplicationData2 = 0xE2,
    /// APP3: Application data 3: used for meta info
    ApplicationData3 = 0xE3,
    ApplicationData4 = 0xE4,
    ApplicationData5 = 0xE5,
    ApplicationData6 = 0xE6,
    ApplicationData7 = 0xE7,
    ApplicationData8 = 0xE8,
    ApplicationData9 = 0xE9,
    ApplicationData10 = 0xEA,
    ApplicationData11 = 0xEB,
    ApplicationData12 = 0xEC,
    /// APP13: Application data 13: used by PhotoShop IRB
    ApplicationData13 = 0xED,
    /// APP14: Application data 14: used by Adobe
    ApplicationData14 = 0xEE,
    ApplicationData15 = 0xEF,

    /// SOF55: Marks the start of a JPEG-LS encoded frame.
    StartOfFrameJpegls = 0xF7,
    /// LSE: Marks the start of a JPEG-LS preset parameters segment.
    JpeglsPresetParameters = 0xF8,

    /// COM: Comment block.
    Comment = 0xFE,
}

pub const JPEG_MARKER_START_BYTE: u8 = 0xFF;
pub const JPEG_RESTART_MARKER_BASE: u8 = 0xD0;
pub const JPEG_RESTART_MARKER_RANGE: u8 = 8;

pub const SOI: u16 = 0xFFD8;
pub const EOI: u16 = 0xFFD9;
pub const SOS: u16 = 0xFFDA;
pub const DQT: u16 = 0xFFDB;
pub const DNL: u16 = 0xFFDC;
pub const DRI: u16 = 0xFFDD;
pub const DHT: u16 = 0xFFC4;
pub const SOF0: u16 = 0xFFC0;
pub const SOF3: u16 = 0xFFC3;
pub const APP0: u16 = 0xFFE0;
pub const APP1: u16 = 0xFFE1;
pub const APP2: u16 = 0xFFE2;
pub const APP14: u16 = 0xFFEE;
pub const COM: u16 = 0xFFFE;

impl JpegMarkerCode {
    /// Full two-byte marker value.
    pub fn marker(self) -> u16 {
        0xFF00 | self as u16
    }

    /// Looks up a full two-byte marker; the high byte must be 0xFF.
    pub fn from_marker(marker: u16) -> Option<Self> {
        if marker >> 8 != JPEG_MARKER_START_BYTE as u16 {
            return None;
        }
        Self::try_from((marker & 0xFF) as u8).ok()
    }
}

/// SOF0..SOF15 except DHT (C4), JPG (C8) and DAC (CC).
pub fn is_sof(marker: u16) -> bool {
    matches!(marker, 0xFFC0..=0xFFCF) && !matches!(marker, DHT | 0xFFC8 | 0xFFCC)
}

/// SOF3, SOF7, SOF11 and SOF15.
pub fn is_lossless_sof(marker: u16) -> bool {
    matches!(marker, 0xFFC3 | 0xFFC7 | 0xFFCB | 0xFFCF)
}

pub fn is_app(marker: u16) -> bool {
    matches!(marker, 0xFFE0..=0xFFEF)
}

pub fn is_restart(marker: u16) -> bool {
    let [lead, code] = marker.to_be_bytes();
    lead == JPEG_MARKER_START_BYTE
        && code.wrapping_sub(JPEG_RESTART_MARKER_BASE) < JPEG_RESTART_MARKER_RANGE
}

/// Markers that are not followed by a length field.
pub fn is_standalone(marker: u16) -> bool {
    matches!(marker, 0xFF01 | 0xFFD0..=0xFFD9)
}

/// Markers the physical segment scanner accepts at a segment boundary.
/// Restart markers and JPG (C8) only occur inside entropy-coded data and are not accepted.
pub fn is_known_marker(marker: u16) -> bool {
    match JpegMarkerCode::from_marker(marker) {
        Some(JpegMarkerCode::JpegExtension) => false,
        Some(_) => !is_restart(marker),
        None => false,
    }
}

/// Short mnemonic such as `SOF3` or `APP14`, for diagnostics.
pub fn marker_name(marker: u16) -> String {
    match marker {
        m if is_sof(m) => format!("SOF{}", m & 0x0F),
        m if is_app(m) => format!("APP{}", m & 0x0F),
        m if is_restart(m) => format!("RST{}", m & 0x07),
        0xFF01 => "TEM".into(),
        DHT => "DHT".into(),
        0xFFC8 => "JPG".into(),
        0xFFCC => "DAC".into(),
        SOI => "SOI".into(),
        EOI => "EOI".into(),
        SOS => "SOS".into(),
        DQT => "DQT".into(),
        DNL => "DNL".into(),
        DRI => "DRI".into(),
        0xFFDE => "DHP".into(),
        0xFFDF => "EXP".into(),
        0xFFF7 => "SOF55".into(),
        0xFFF8 => "LSE".into(),
        COM => "COM".into(),
        m => format!("0x{m:04X}"),
    }
}
