//! Radix-2 decimation-in-time FFT driven by a precomputed butterfly table.

mod butterfly;
mod engine;

// Re-export public types
pub use butterfly::{bit_reverse, bit_reversed_indices, ButterflyEntry, ButterflyTable};
pub use engine::{FftAxis, FftDirection, FftEngine, PingPong};
