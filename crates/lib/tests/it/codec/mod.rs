//! Codec integration tests
//!
//! Covers block verification, zero-copy reads and the encoder.

mod block_tests;
mod encoder_tests;
