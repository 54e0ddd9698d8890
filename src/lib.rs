//! This crate implements a streaming Viterbi decoder for rate-1/2 convolutional codes, modelled
//! on a pipelined hardware architecture. Each input step flows through a bank of branch metric
//! units, an optional branch metric register, a path metric unit (add-compare-select butterflies
//! with optional normalization) and a traceback engine. The traceback engine stores survivor
//! vectors in a circular memory split into three regions and reads them at a multiple of the
//! input rate, reordering decoded bits with a LIFO buffer.
//!
//! A shift-register [`encoder`] and channel [`utils`] are included for generating test vectors,
//! and the [`sim`] module evaluates the bit and block error rates of the decoder over a
//! BPSK-AWGN channel.
//!
//! # Examples
//!
//! ```
//! use viterbi::{encoder, Code, DecoderConfig};
//!
//! let code = Code::standard(7)?;
//! let info_bits = viterbi::utils::random_bits(100);
//! let symbols = encoder::encoder(&info_bits, &code);
//! let bits = viterbi::decoder(&symbols, DecoderConfig::new(code, 1))?;
//! assert_eq!(bits[.. 100], info_bits);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

mod acs;
mod branch_metric;
mod common;
mod config;
mod decoder;
pub mod encoder;
mod minimum;
mod path_metric;
pub mod sim;
mod traceback;
pub mod utils;

pub use acs::add_compare_select;
pub use branch_metric::{BranchMetricBank, BranchMetricUnit};
pub use common::{Bit, Error, SymbolPair};
pub use config::{
    Code, DecoderConfig, Normalization, MAX_CONSTRAINT_LEN, MAX_PM_WIDTH, MAX_SYMBOL_WIDTH,
    MIN_CONSTRAINT_LEN, MIN_TRACEBACK_RATE,
};
pub use decoder::{decoder, Decoder};
pub use minimum::MinimumTree;
pub use path_metric::PathMetricUnit;
pub use traceback::{BitStack, PhaseSynchronizer, TracebackEngine};
