pub const MINIMUM_BITS_PER_SAMPLE: u8 = 2;
pub const MAXIMUM_BITS_PER_SAMPLE: u8 = 16;
pub const MAXIMUM_TABLE_ID: u8 = 3;

// The size in bytes of the segment length field.
pub const SEGMENT_LENGTH_SIZE: usize = 2;

pub const HUFFMAN_CODE_LENGTHS: usize = 16;
pub const QUANTIZATION_TABLE_SIZE: usize = 64;

/// Position in zig-zag order of each coefficient, indexed in natural (row-major) order.
pub const NATURAL_TO_ZIGZAG: [usize; QUANTIZATION_TABLE_SIZE] = [
    0, 1, 5, 6, 14, 15, 27, 28, //
    2, 4, 7, 13, 16, 26, 29, 42, //
    3, 8, 12, 17, 25, 30, 41, 43, //
    9, 11, 18, 24, 31, 40, 44, 53, //
    10, 19, 23, 32, 39, 45, 52, 54, //
    20, 22, 33, 38, 46, 51, 55, 60, //
    21, 34, 37, 47, 50, 56, 59, 61, //
    35, 36, 48, 49, 57, 58, 62, 63,
];

/// Row and column scale factors applied by quantization table enhancement.
pub const ENHANCEMENT_FACTORS: [i32; 8] = [90, 126, 118, 106, 90, 71, 49, 25];
pub const ENHANCEMENT_SHIFT: u32 = 6;
