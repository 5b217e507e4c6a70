//! Reassembles an embedded ICC profile from its APP2 chunks.
//!
//! The profile is passed through as bytes; nothing here interprets it.

use crate::segment::{IccChunk, Segment};
use crate::warning::{WarningListener, emit};

pub fn assemble_icc_profile(
    segments: &[Segment],
    listener: &mut dyn WarningListener,
) -> Option<Vec<u8>> {
    let chunks: Vec<IccChunk> = segments
        .iter()
        .filter_map(|segment| match segment {
            Segment::Application(app) => IccChunk::parse(app).ok(),
            _ => None,
        })
        .collect();

    match chunks.as_slice() {
        [] => None,
        [chunk] => {
            if chunk.sequence != 1 && chunk.count != 1 {
                emit(
                    listener,
                    format!(
                        "Unexpected number of 'ICC_PROFILE' chunks: {} of {}. Ignoring ICC profile.",
                        chunk.sequence, chunk.count
                    ),
                );
                return None;
            }
            Some(chunk.data.to_vec())
        }
        [first, ..] => {
            let count = first.count;
            if count as usize != chunks.len() {
                emit(
                    listener,
                    format!("Bad 'ICC_PROFILE' chunk count: {count}. Ignoring ICC profile."),
                );
                return None;
            }

            let mut ordered: Vec<Option<&[u8]>> = vec![None; chunks.len()];
            for chunk in &chunks {
                if chunk.count != count {
                    emit(
                        listener,
                        format!(
                            "Bad number of 'ICC_PROFILE' chunks: {} of {}. Ignoring ICC profile.",
                            chunk.sequence, chunk.count
                        ),
                    );
                    return None;
                }
                let slot = (chunk.sequence as usize)
                    .checked_sub(1)
                    .and_then(|index| ordered.get_mut(index))
                    .filter(|slot| slot.is_none());
                match slot {
                    Some(slot) => *slot = Some(chunk.data),
                    None => {
                        emit(
                            listener,
                            format!(
                                "Invalid 'ICC_PROFILE' chunk index: {}. Ignoring ICC profile.",
                                chunk.sequence
                            ),
                        );
                        return None;
                    }
                }
            }

            // Every slot is filled: the indexes are distinct and in range.
            Some(ordered.into_iter().flatten().flatten().copied().collect())
        }
    }
}
