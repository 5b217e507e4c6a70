//! Lossless JPEG decoding: Huffman lookup, entropy reading, prediction and reconstruction.

pub mod bit_reader;
pub mod decoder;
pub mod huffman;
pub mod predictor;
pub mod quantization;
pub mod unslice;

pub use decoder::{DecodedImage, LosslessDecoder};
pub use huffman::HuffmanLookupTable;
pub use predictor::Predictor;
pub use quantization::EnhancedQuantizationTable;
pub use unslice::{Slices, unslice};
