//! Approximate compression quality from the quantization tables.
//!
//! Compares a hash of a few coefficients and the coefficient sum against the tables libjpeg
//! produces at each quality setting, as ImageMagick's `coders/jpeg.c` does. The result is only
//! meaningful for DCT streams encoded with scaled standard tables.

use crate::constants::MAXIMUM_TABLE_ID;
use crate::segment::{RawQuantizationTable, Segment};

const DUAL_TABLE_HASH: [u32; 101] = [
    1020, 1015, 932, 848, 780, 735, 702, 679, 660, 645,
    632, 623, 613, 607, 600, 594, 589, 585, 581, 571,
    555, 542, 529, 514, 494, 474, 457, 439, 424, 410,
    397, 386, 373, 364, 351, 341, 334, 324, 317, 309,
    299, 294, 287, 279, 274, 267, 262, 257, 251, 247,
    243, 237, 232, 227, 222, 217, 213, 207, 202, 198,
    192, 188, 183, 177, 173, 168, 163, 157, 153, 148,
    143, 139, 132, 128, 125, 119, 115, 108, 104, 99,
    94, 90, 84, 79, 74, 70, 64, 59, 55, 49,
    45, 40, 34, 30, 25, 20, 15, 11, 6, 4,
    0,
];

const DUAL_TABLE_SUMS: [u32; 101] = [
    32640, 32635, 32266, 31495, 30665, 29804, 29146, 28599, 28104, 27670,
    27225, 26725, 26210, 25716, 25240, 24789, 24373, 23946, 23572, 22846,
    21801, 20842, 19949, 19121, 18386, 17651, 16998, 16349, 15800, 15247,
    14783, 14321, 13859, 13535, 13081, 12702, 12423, 12056, 11779, 11513,
    11135, 10955, 10676, 10392, 10208, 9928, 9747, 9564, 9369, 9193,
    9017, 8822, 8639, 8458, 8270, 8084, 7896, 7710, 7527, 7347,
    7156, 6977, 6788, 6607, 6422, 6236, 6054, 5867, 5684, 5495,
    5305, 5128, 4945, 4751, 4638, 4442, 4248, 4065, 3888, 3698,
    3509, 3326, 3139, 2957, 2775, 2586, 2405, 2216, 2037, 1846,
    1666, 1483, 1297, 1109, 927, 735, 554, 375, 201, 128,
    0,
];

const SINGLE_TABLE_HASH: [u32; 101] = [
    510, 505, 422, 380, 355, 338, 326, 318, 311, 305,
    300, 297, 293, 291, 288, 286, 284, 283, 281, 280,
    279, 278, 277, 273, 262, 251, 243, 233, 225, 218,
    211, 205, 198, 193, 186, 181, 177, 172, 168, 164,
    158, 156, 152, 148, 145, 142, 139, 136, 133, 131,
    129, 126, 123, 120, 118, 115, 113, 110, 107, 105,
    102, 100, 97, 94, 92, 89, 87, 83, 81, 79,
    76, 74, 70, 68, 66, 63, 61, 57, 55, 52,
    50, 48, 44, 42, 39, 37, 34, 31, 29, 26,
    24, 21, 18, 16, 13, 11, 8, 6, 3, 2,
    0,
];

const SINGLE_TABLE_SUMS: [u32; 101] = [
    16320, 16315, 15946, 15277, 14655, 14073, 13623, 13230, 12859, 12560,
    12240, 11861, 11456, 11081, 10714, 10360, 10027, 9679, 9368, 9056,
    8680, 8331, 7995, 7668, 7376, 7084, 6823, 6562, 6345, 6125,
    5939, 5756, 5571, 5421, 5240, 5086, 4976, 4829, 4719, 4616,
    4463, 4393, 4280, 4166, 4092, 3980, 3909, 3835, 3755, 3688,
    3621, 3541, 3467, 3396, 3323, 3247, 3170, 3096, 3021, 2952,
    2874, 2804, 2727, 2657, 2583, 2509, 2437, 2362, 2290, 2211,
    2136, 2068, 1996, 1915, 1858, 1773, 1692, 1620, 1552, 1477,
    1398, 1326, 1251, 1179, 1109, 1031, 961, 884, 814, 736,
    667, 592, 518, 441, 369, 292, 221, 151, 86, 64,
    0,
];

/// The last table with each id wins.
pub fn quantization_tables(segments: &[Segment]) -> [Option<&RawQuantizationTable>; 4] {
    let mut tables = [None; MAXIMUM_TABLE_ID as usize + 1];
    for segment in segments {
        if let Segment::QuantizationTable(dqt) = segment {
            for table in dqt {
                tables[table.id as usize] = Some(table);
            }
        }
    }
    tables
}

/// Estimated quality in `1..=100`, `None` when table 0 is missing or nothing matches.
pub fn estimate_quality(tables: &[Option<&RawQuantizationTable>; 4]) -> Option<u8> {
    let sum: u32 = tables
        .iter()
        .flatten()
        .flat_map(|table| table.values().iter())
        .map(|&v| v as u32)
        .sum();

    let (hash, sums, qvalue): (&[u32], &[u32], u32) = match (tables[0], tables[1]) {
        (Some(luma), Some(chroma)) => (
            &DUAL_TABLE_HASH[..],
            &DUAL_TABLE_SUMS[..],
            luma.values()[2] as u32
                + luma.values()[53] as u32
                + chroma.values()[0] as u32
                + chroma.values()[63] as u32,
        ),
        (Some(luma), None) => (
            &SINGLE_TABLE_HASH[..],
            &SINGLE_TABLE_SUMS[..],
            luma.values()[2] as u32 + luma.values()[53] as u32,
        ),
        _ => return None,
    };

    for i in 0..100 {
        if qvalue < hash[i] && sum < sums[i] {
            continue;
        }
        if (qvalue <= hash[i] && sum <= sums[i]) || i >= 50 {
            return Some(i as u8 + 1);
        }
        break;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NATURAL_TO_ZIGZAG;
    use crate::segment::QuantizationPrecision;
    use test_log::test;

    const STD_LUMINANCE: [u16; 64] = [
        16, 11, 10, 16, 24, 40, 51, 61, //
        12, 12, 14, 19, 26, 58, 60, 55, //
        14, 13, 16, 24, 40, 57, 69, 56, //
        14, 17, 22, 29, 51, 87, 80, 62, //
        18, 22, 37, 56, 68, 109, 103, 77, //
        24, 35, 55, 64, 81, 104, 113, 92, //
        49, 64, 78, 87, 103, 121, 120, 101, //
        72, 92, 95, 98, 112, 100, 103, 99,
    ];

    fn std_chrominance() -> [u16; 64] {
        let mut table = [99u16; 64];
        let corner = [[17, 18, 24, 47], [18, 21, 26, 66], [24, 26, 56, 99], [47, 66, 99, 99]];
        for (row, values) in corner.iter().enumerate() {
            table[row * 8..row * 8 + 4].copy_from_slice(values);
        }
        table
    }

    /// libjpeg quality scaling, stored in zig-zag order like a DQT segment.
    fn scaled(id: u8, natural: &[u16; 64], quality: u32) -> RawQuantizationTable {
        let scale = if quality < 50 { 5000 / quality } else { 200 - 2 * quality };
        let mut values = [0u16; 64];
        for (i, &v) in natural.iter().enumerate() {
            values[NATURAL_TO_ZIGZAG[i]] = ((v as u32 * scale + 50) / 100).clamp(1, 255) as u16;
        }
        RawQuantizationTable::new(id, QuantizationPrecision::Eight, values)
    }

    #[test]
    fn recognises_standard_qualities() {
        for quality in [50, 75, 90, 100] {
            let luma = scaled(0, &STD_LUMINANCE, quality);
            let chroma = scaled(1, &std_chrominance(), quality);
            let both = [Some(&luma), Some(&chroma), None, None];
            assert_eq!(estimate_quality(&both), Some(quality as u8));
            let single = [Some(&luma), None, None, None];
            assert_eq!(estimate_quality(&single), Some(quality as u8));
        }
    }

    #[test]
    fn low_or_missing_tables_give_none() {
        let luma = scaled(0, &STD_LUMINANCE, 10);
        let chroma = scaled(1, &std_chrominance(), 10);
        assert_eq!(estimate_quality(&[Some(&luma), Some(&chroma), None, None]), None);
        assert_eq!(estimate_quality(&[None, Some(&chroma), None, None]), None);

        let coarsest = RawQuantizationTable::new(0, QuantizationPrecision::Eight, [255; 64]);
        assert_eq!(estimate_quality(&[Some(&coarsest), None, None, None]), Some(1));
    }

    #[test]
    fn collects_tables_from_segments() {
        let first = scaled(0, &STD_LUMINANCE, 50);
        let second = scaled(0, &STD_LUMINANCE, 90);
        let chroma = scaled(1, &std_chrominance(), 90);
        let segments = [
            Segment::QuantizationTable(vec![first]),
            Segment::RestartInterval(0),
            Segment::QuantizationTable(vec![second.clone(), chroma.clone()]),
        ];
        let tables = quantization_tables(&segments);
        assert_eq!(tables[0], Some(&second));
        assert_eq!(tables[1], Some(&chroma));
        assert_eq!(estimate_quality(&tables), Some(90));
    }
}
