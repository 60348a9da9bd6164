//! Streaming Viterbi decoder for rate-1/n convolutional codes: hard-decision
//! Hamming-distance branch metrics, a bounded-memory sliding trellis window,
//! and per-window traceback and emission.

mod decoder;
mod error;

pub use decoder::{DecodedBlockSink, Viterbi, INFINITY, MAX_K, MAX_N, TRELLIS_WINDOW};
pub use error::{Error, Result};
