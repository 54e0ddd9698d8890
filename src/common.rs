//! Types needed in multiple modules

use serde::{Deserialize, Serialize};

/// Enumeration of binary symbol values
#[derive(Clone, Eq, PartialEq, Debug, Copy, Hash, Deserialize, Serialize)]
pub enum Bit {
    /// Binary symbol `0`
    Zero = 0,
    /// Binary symbol `1`
    One = 1,
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        if value {
            Bit::One
        } else {
            Bit::Zero
        }
    }
}

impl From<Bit> for bool {
    fn from(bit: Bit) -> Self {
        bit == Bit::One
    }
}

/// Returns the parity (XOR of all bits) of given integer.
pub(crate) fn parity(num: usize) -> Bit {
    match num.count_ones() % 2 {
        0 => Bit::Zero,
        _ => Bit::One,
    }
}

/// Pair of quantized symbols received in one step
///
/// Each symbol lies in `[0, x_max]`, with `0` standing for a strong `Zero` and `x_max` for a
/// strong `One`. Symbol `x0` carries the code bit of the first generator polynomial, and `x1`
/// that of the second.
#[derive(Clone, Eq, PartialEq, Debug, Copy, Default, Hash, Deserialize, Serialize)]
pub struct SymbolPair {
    /// Symbol for the first generator polynomial
    pub x0: u32,
    /// Symbol for the second generator polynomial
    pub x1: u32,
}

impl SymbolPair {
    /// Returns symbol pair with given symbols.
    #[must_use]
    pub fn new(x0: u32, x1: u32) -> Self {
        Self { x0, x1 }
    }

    /// Returns hard-decision symbol pair (`0` or `1`) for given code bits.
    #[must_use]
    pub fn from_bits(c0: Bit, c1: Bit) -> Self {
        Self {
            x0: c0 as u32,
            x1: c1 as u32,
        }
    }
}

/// Custom error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
    /// File read/write error
    #[error("{0}")]
    FileReadWriteError(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
    /// Unknown error
    #[error("Unknown error")]
    Unknown,
}
