//! Code and decoder configuration
//!
//! A [`Code`] fixes the constraint length and the two generator polynomials of the rate-1/2
//! convolutional code. A [`DecoderConfig`] adds everything else the decoder pipeline needs: the
//! symbol width, whether branch metrics are registered, the path metric normalization policy
//! and the traceback geometry. Both are validated before any data is processed, and both can be
//! (de)serialized with `serde`, so that a decoder can be described in a JSON file.
//!
//! # Examples
//!
//! ```
//! use viterbi::{Code, DecoderConfig, Normalization, MAX_CONSTRAINT_LEN, MIN_TRACEBACK_RATE};
//!
//! let code = Code::new(3, 0b111, 0b101)?;
//! let mut config = DecoderConfig::new(code, 3);
//! config.normalization = Normalization::EveryStep;
//! assert_eq!(config.pm_width(), 7);
//! assert_eq!(config.traceback_length(), 16);
//! assert_eq!(config.traceback_rate, MIN_TRACEBACK_RATE);
//! let too_long = 1 << MAX_CONSTRAINT_LEN;
//! assert!(Code::new(MAX_CONSTRAINT_LEN + 1, too_long, too_long).is_err());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Smallest supported constraint length
pub const MIN_CONSTRAINT_LEN: usize = 2;

/// Largest supported constraint length (keeps `5 * k` within the usual 64-entry traceback)
pub const MAX_CONSTRAINT_LEN: usize = 11;

/// Largest supported symbol width
pub const MAX_SYMBOL_WIDTH: u32 = 16;

/// Largest supported path metric register width
pub const MAX_PM_WIDTH: u32 = 31;

/// Smallest supported number of traceback ticks per input step (the traceback walks `2L`
/// survivor vectors for every `L` written)
pub const MIN_TRACEBACK_RATE: usize = 2;

/// Rate-1/2 convolutional code
#[derive(Clone, Eq, PartialEq, Debug, Copy, Hash, Deserialize, Serialize)]
#[serde(try_from = "RawCode", into = "RawCode")]
pub struct Code {
    /// Constraint length
    constraint_len: usize,
    /// First generator polynomial
    g1: usize,
    /// Second generator polynomial
    g2: usize,
}

impl Code {
    /// Returns code with given constraint length and generator polynomials.
    ///
    /// # Parameters
    ///
    /// - `constraint_len`: Constraint length `k`, i.e., the number of input bits (current bit
    ///   plus `k - 1` previous bits) that influence each pair of code bits. Must be in the range
    ///   `[2, 11]`.
    ///
    /// - `g1`, `g2`: Integer representations of the two generator polynomials. Each must fit
    ///   in `k` bits and have its MSB (bit `k - 1`) set; the MSB multiplies the current input
    ///   bit, and the traceback relies on every code bit depending on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the constraint length is out of range, or if either polynomial does
    /// not fit in `k` bits or has its MSB unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use viterbi::Code;
    ///
    /// let code = Code::new(7, 0b111_1001, 0b101_1011)?;
    /// assert_eq!(code.num_states(), 64);
    /// assert!(Code::new(3, 0b011, 0b101).is_err());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(constraint_len: usize, g1: usize, g2: usize) -> Result<Self, Error> {
        if !(MIN_CONSTRAINT_LEN ..= MAX_CONSTRAINT_LEN).contains(&constraint_len) {
            return Err(Error::InvalidInput(format!(
                "Constraint length must be in the range [{MIN_CONSTRAINT_LEN}, \
                {MAX_CONSTRAINT_LEN}] (found {constraint_len})",
            )));
        }
        for (name, poly) in [("g1", g1), ("g2", g2)] {
            check_generator_polynomial(name, poly, constraint_len)?;
        }
        Ok(Self {
            constraint_len,
            g1,
            g2,
        })
    }

    /// Returns the standard test code for given constraint length.
    ///
    /// # Errors
    ///
    /// Returns an error if `constraint_len` is not one of `3`, `4`, `5` and `7`.
    pub fn standard(constraint_len: usize) -> Result<Self, Error> {
        match constraint_len {
            3 => Self::new(3, 0b111, 0b101),
            4 => Self::new(4, 0b1101, 0b1010),
            5 => Self::new(5, 0b1_0011, 0b1_1101),
            7 => Self::new(7, 0b111_1001, 0b101_1011),
            _ => Err(Error::InvalidInput(format!(
                "No standard code for constraint length {constraint_len} (expected 3, 4, 5 or 7)"
            ))),
        }
    }

    /// Returns the constraint length.
    #[must_use]
    pub fn constraint_len(&self) -> usize {
        self.constraint_len
    }

    /// Returns the first generator polynomial.
    #[must_use]
    pub fn g1(&self) -> usize {
        self.g1
    }

    /// Returns the second generator polynomial.
    #[must_use]
    pub fn g2(&self) -> usize {
        self.g2
    }

    /// Returns the memory length `k - 1`.
    #[must_use]
    pub fn memory_len(&self) -> usize {
        self.constraint_len - 1
    }

    /// Returns the number of trellis states `2^(k-1)`.
    #[must_use]
    pub fn num_states(&self) -> usize {
        1 << (self.constraint_len - 1)
    }

    /// Returns the number of branch metrics per step `2^k`.
    #[must_use]
    pub fn num_branch_metrics(&self) -> usize {
        1 << self.constraint_len
    }
}

/// Serialized form of a [`Code`], validated on the way in
#[derive(Clone, Debug, Copy, Deserialize, Serialize)]
struct RawCode {
    constraint_len: usize,
    g1: usize,
    g2: usize,
}

impl TryFrom<RawCode> for Code {
    type Error = Error;

    fn try_from(raw: RawCode) -> Result<Self, Error> {
        Code::new(raw.constraint_len, raw.g1, raw.g2)
    }
}

impl From<Code> for RawCode {
    fn from(code: Code) -> Self {
        Self {
            constraint_len: code.constraint_len,
            g1: code.g1,
            g2: code.g2,
        }
    }
}

/// Enumeration of path metric normalization policies
#[derive(Clone, Eq, PartialEq, Debug, Copy, Hash, Deserialize, Serialize)]
pub enum Normalization {
    /// Never normalize (adequate for hard decisions on short windows only)
    Off,
    /// Subtract the global minimum on every valid step
    EveryStep,
    /// Subtract the global minimum only on steps where the input is not valid
    ///
    /// The caller must deassert input validity at least once every
    /// [`DecoderConfig::max_steps_between_idle_slots`] valid steps.
    IdleSlot,
}

impl std::fmt::Display for Normalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Normalization::Off => "disabled",
            Normalization::EveryStep => "every step",
            Normalization::IdleSlot => "idle slots only",
        };
        write!(f, "{name}")
    }
}

/// Configuration of the decoder pipeline
///
/// Fields left as `None` take values derived from the code and symbol width; see the
/// accessor methods for the rules.
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct DecoderConfig {
    /// Convolutional code
    pub code: Code,
    /// Symbol width `w` in bits (`1` for hard decisions)
    pub symbol_width: u32,
    /// Largest symbol value (defaults to `2^w - 1`)
    #[serde(default)]
    pub x_max: Option<u32>,
    /// Whether branch metrics are registered for one step before the path metric unit
    #[serde(default = "default_register_bm")]
    pub register_bm: bool,
    /// Path metric normalization policy
    #[serde(default = "default_normalization")]
    pub normalization: Normalization,
    /// Path metric register width (defaults to `3 + w + k/2`)
    #[serde(default)]
    pub pm_width: Option<u32>,
    /// Number of low-order bits ignored when searching for the minimum path metric
    #[serde(default = "default_minimum_lsb")]
    pub minimum_lsb: u32,
    /// Traceback length, a power of two (defaults to the smallest power of two `>= 5k`)
    #[serde(default)]
    pub traceback_length: Option<usize>,
    /// Number of traceback ticks per input step
    #[serde(default = "default_traceback_rate")]
    pub traceback_rate: usize,
}

impl DecoderConfig {
    /// Returns configuration with default settings for given code and symbol width.
    ///
    /// Defaults: branch metrics registered, normalization on every step, minimum search
    /// ignoring the 4 lowest bits, traceback rate 2, and derived `x_max`, path metric width and
    /// traceback length.
    #[must_use]
    pub fn new(code: Code, symbol_width: u32) -> Self {
        Self {
            code,
            symbol_width,
            x_max: None,
            register_bm: default_register_bm(),
            normalization: default_normalization(),
            pm_width: None,
            minimum_lsb: default_minimum_lsb(),
            traceback_length: None,
            traceback_rate: default_traceback_rate(),
        }
    }

    /// Returns configuration read from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the configuration it holds
    /// is invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.check()?;
        Ok(config)
    }

    /// Returns the largest symbol value.
    #[must_use]
    pub fn x_max(&self) -> u32 {
        self.x_max
            .unwrap_or_else(|| (1 << self.symbol_width.min(MAX_SYMBOL_WIDTH)) - 1)
    }

    /// Returns the largest branch metric value `2 * x_max`.
    #[must_use]
    pub fn max_branch_metric(&self) -> u32 {
        2 * self.x_max()
    }

    /// Returns the path metric register width.
    #[must_use]
    pub fn pm_width(&self) -> u32 {
        self.pm_width.unwrap_or_else(|| {
            // OK to cast `usize` to `u32`: Constraint length is small.
            #[allow(clippy::cast_possible_truncation)]
            let half_k = (self.code.constraint_len() / 2) as u32;
            3 + self.symbol_width + half_k
        })
    }

    /// Returns the traceback length.
    #[must_use]
    pub fn traceback_length(&self) -> usize {
        self.traceback_length
            .unwrap_or_else(|| (5 * self.code.constraint_len()).next_power_of_two())
    }

    /// Returns the largest number of consecutive valid steps allowed between idle slots.
    ///
    /// This is the largest `N` with `N * max_branch_metric < 2^pm_width`; it only matters
    /// under [`Normalization::IdleSlot`].
    #[must_use]
    pub fn max_steps_between_idle_slots(&self) -> usize {
        let pm_max = (1u64 << self.pm_width().min(MAX_PM_WIDTH)) - 1;
        let bm_max = u64::from(self.max_branch_metric().max(1));
        usize::try_from(pm_max / bm_max).unwrap_or(usize::MAX)
    }

    /// Checks validity of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol width, largest symbol value, path metric width, minimum
    /// search LSB, traceback length or traceback rate is invalid.
    pub fn check(&self) -> Result<(), Error> {
        if self.symbol_width == 0 || self.symbol_width > MAX_SYMBOL_WIDTH {
            return Err(Error::InvalidInput(format!(
                "Symbol width must be in the range [1, {MAX_SYMBOL_WIDTH}] (found {})",
                self.symbol_width
            )));
        }
        if let Some(x_max) = self.x_max {
            let limit = (1 << self.symbol_width) - 1;
            if x_max == 0 || x_max > limit {
                return Err(Error::InvalidInput(format!(
                    "For symbol width {}, largest symbol value must be in the range [1, \
                    {limit}] (found {x_max})",
                    self.symbol_width
                )));
            }
        }
        self.check_pm_width()?;
        let tb_len = self.traceback_length();
        if tb_len < 2 || !tb_len.is_power_of_two() {
            return Err(Error::InvalidInput(format!(
                "Traceback length must be a power of 2 no less than 2 (found {tb_len})"
            )));
        }
        if self.traceback_rate < MIN_TRACEBACK_RATE {
            return Err(Error::InvalidInput(format!(
                "Traceback rate must be at least {MIN_TRACEBACK_RATE} (found {})",
                self.traceback_rate
            )));
        }
        Ok(())
    }

    /// Checks validity of the path metric width against the minimum search LSB and the
    /// largest branch metric.
    fn check_pm_width(&self) -> Result<(), Error> {
        let pm_width = self.pm_width();
        if pm_width > MAX_PM_WIDTH {
            return Err(Error::InvalidInput(format!(
                "Path metric width cannot exceed {MAX_PM_WIDTH} (found {pm_width})"
            )));
        }
        if self.minimum_lsb >= pm_width {
            return Err(Error::InvalidInput(format!(
                "Minimum search LSB ({}) must be less than the path metric width ({pm_width})",
                self.minimum_lsb
            )));
        }
        if u64::from(self.max_branch_metric()) >= 1u64 << pm_width {
            return Err(Error::InvalidInput(format!(
                "Path metric width {pm_width} cannot hold a branch metric of {}",
                self.max_branch_metric()
            )));
        }
        Ok(())
    }
}

/// Checks that a generator polynomial fits the constraint length and has its MSB set.
fn check_generator_polynomial(name: &str, poly: usize, constraint_len: usize) -> Result<(), Error> {
    let msb = 1 << (constraint_len - 1);
    if poly >= msb << 1 || poly & msb == 0 {
        return Err(Error::InvalidInput(format!(
            "For constraint length of {constraint_len}, generator polynomial {name} must be in \
            the range [{msb}, {}) so that its MSB is set (found {poly})",
            msb << 1
        )));
    }
    Ok(())
}

fn default_register_bm() -> bool {
    true
}

fn default_normalization() -> Normalization {
    Normalization::EveryStep
}

fn default_minimum_lsb() -> u32 {
    4
}

fn default_traceback_rate() -> usize {
    MIN_TRACEBACK_RATE
}

#[cfg(test)]
mod tests_of_code {
    use super::*;

    #[test]
    fn test_new() {
        // Invalid inputs
        assert!(Code::new(1, 0b1, 0b1).is_err());
        assert!(Code::new(12, 0x800, 0x801).is_err());
        assert!(Code::new(3, 0b011, 0b101).is_err());
        assert!(Code::new(3, 0b111, 0b001).is_err());
        assert!(Code::new(3, 0b1111, 0b101).is_err());
        // Valid inputs
        let code = Code::new(3, 0b111, 0b101).unwrap();
        assert_eq!(code.constraint_len(), 3);
        assert_eq!(code.g1(), 0b111);
        assert_eq!(code.g2(), 0b101);
        assert_eq!(code.memory_len(), 2);
        assert_eq!(code.num_states(), 4);
        assert_eq!(code.num_branch_metrics(), 8);
        assert!(Code::new(2, 0b11, 0b10).is_ok());
        assert!(Code::new(11, 0x400, 0x7FF).is_ok());
    }

    #[test]
    fn test_standard() {
        assert!(Code::standard(6).is_err());
        for k in [3, 4, 5, 7] {
            let code = Code::standard(k).unwrap();
            assert_eq!(code.constraint_len(), k);
        }
        assert_eq!(Code::standard(4).unwrap().g2(), 0b1010);
    }

    #[test]
    fn test_serde() {
        let code = Code::standard(5).unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(serde_json::from_str::<Code>(&json).unwrap(), code);
        let bad = r#"{"constraint_len":3,"g1":3,"g2":5}"#;
        assert!(serde_json::from_str::<Code>(bad).is_err());
    }
}
