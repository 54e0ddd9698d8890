//! # Some useful functions for simulating decoder performance
//!
//! The [`random_bits`] function returns a given number of random bits; the [`bpsk_awgn_channel`]
//! function returns the samples at the output of a BPSK-AWGN channel corresponding to given
//! code symbols; the [`quantize`] function maps channel output samples to `q`-bit symbols; the
//! [`symbol_pairs`] function groups symbols into the pairs fed to the decoder; and the
//! [`error_count`] function returns the number of errors in a sequence with respect to a
//! reference sequence.
//!
//! # Examples
//!
//! The code below illustrates the usage of the functions in this module.
//! ```
//! use viterbi::{encoder, utils, Code, DecoderConfig};
//!
//! let code = Code::standard(7)?;
//! let info_bits = utils::random_bits(40);
//! let code_symbols = encoder::encoder(&info_bits, &code);
//! let samples = utils::bpsk_awgn_channel(&code_symbols, 10.0);
//! let symbols = utils::symbol_pairs(&utils::quantize(&samples, 3));
//! let bits = viterbi::decoder(&symbols, DecoderConfig::new(code, 3))?;
//! let err_count = utils::error_count(&bits[.. 40], &info_bits);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use itertools::Itertools;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::{Bit, SymbolPair};

/// Returns given number of random bits.
///
/// # Parameters
///
/// - `num_bits`: Number of random bits to be generated.
///
/// # Returns
///
/// - `bits`: Random bits.
#[must_use]
pub fn random_bits(num_bits: usize) -> Vec<Bit> {
    let mut rng = rand::rng();
    (0 .. num_bits)
        .map(|_| Bit::from(rng.random_bool(0.5)))
        .collect()
}

/// Returns samples at BPSK-AWGN channel output corresponding to given hard-decision symbols.
///
/// # Parameters
///
/// - `symbols`: Hard-decision symbol pairs to be transmitted over the BPSK-AWGN channel. Symbol
///   `0` is sent as `-1.0`, and any other symbol as `+1.0`; `x0` is sent before `x1`.
///
/// - `es_over_n0_db`: Ratio (dB) of symbol energy to noise power spectral density at the BPSK-AWGN
///   channel output (since the BPSK symbols are `+1.0` and `-1.0`, the noise variance is
///   `0.5 / 10f64.powf(0.1 * es_over_n0_db)`).
///
/// # Returns
///
/// - `samples`: Channel output samples, two per symbol pair.
#[must_use]
pub fn bpsk_awgn_channel(symbols: &[SymbolPair], es_over_n0_db: f64) -> Vec<f64> {
    let mut rng = rand::rng();
    let noise_var = 0.5 / 10f64.powf(0.1 * es_over_n0_db);
    symbols
        .iter()
        .flat_map(|pair| [pair.x0, pair.x1])
        .map(|x| if x == 0 { -1f64 } else { 1f64 })
        .map(|x| x + noise_var.sqrt() * rng.sample::<f64, _>(StandardNormal))
        .collect()
}

/// Returns quantized symbols for given channel output samples.
///
/// # Parameters
///
/// - `samples`: Channel output samples. Samples are clipped to the range `[-1.0, 1.0]`, which is
///   then split into `2^q` equal intervals.
///
/// - `q`: Symbol width. With `q = 1`, this is a hard-decision slicer (positive samples map to
///   `1`, others to `0`).
///
/// # Returns
///
/// - `symbols`: Quantized symbols in the range `[0, 2^q - 1]`, with `0` for the strongest
///   negative samples.
#[must_use]
pub fn quantize(samples: &[f64], q: u32) -> Vec<u32> {
    let scale = f64::from(1u32 << q.saturating_sub(1));
    samples
        .iter()
        .map(|&s| quantize_sample(s, scale))
        .collect()
}

/// Returns quantization level of a sample for given scale `2^(q-1)`.
// OK to cast `f64` to `u32`: Level is in the range `[0, 2^q - 1]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize_sample(sample: f64, scale: f64) -> u32 {
    ((sample.clamp(-1.0, 1.0) + 0.999_999_999) * scale)
        .floor()
        .max(0.0) as u32
}

/// Returns symbol pairs made of consecutive symbols.
///
/// # Parameters
///
/// - `symbols`: Symbols, with `x0` of each pair preceding its `x1`. A trailing unpaired symbol
///   is ignored.
///
/// # Returns
///
/// - `pairs`: Symbol pairs.
#[must_use]
pub fn symbol_pairs(symbols: &[u32]) -> Vec<SymbolPair> {
    symbols
        .iter()
        .tuples()
        .map(|(&x0, &x1)| SymbolPair::new(x0, x1))
        .collect()
}

/// Returns number of errors in a sequence with respect to a reference sequence.
///
/// # Parameters
///
/// - `seq`: Sequence in which errors must be counted.
///
/// - `ref_seq`: Reference sequence to which the given sequence is compared.
///
/// # Returns
///
/// - `err_count`: Number of positions in which the two sequences differ. If they are of different
///   lengths, then the longer sequence is effectively truncated to the length of the shorter one.
pub fn error_count<T: PartialEq>(seq: &[T], ref_seq: &[T]) -> usize {
    ref_seq
        .iter()
        .zip(seq.iter())
        .filter(|&(x, y)| x != y)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use Bit::{One, Zero};

    #[test]
    fn test_random_bits() {
        assert!(random_bits(0).is_empty());
        let num_bits = 10000;
        let bits = random_bits(num_bits);
        let num_zeros = bits.iter().filter(|&b| *b == Zero).count();
        let num_ones = bits.iter().filter(|&b| *b == One).count();
        assert!(num_zeros > 9 * num_bits / 20 && num_ones > 9 * num_bits / 20);
    }

    #[test]
    fn test_bpsk_awgn_channel() {
        assert!(bpsk_awgn_channel(&[], 0.0).is_empty());
        let es_over_n0_db = 10f64;
        let num_pairs = 5000;
        let symbols: Vec<SymbolPair> = (0 .. num_pairs)
            .map(|n| SymbolPair::new(n % 2, (n / 2) % 2))
            .collect();
        let samples = bpsk_awgn_channel(&symbols, es_over_n0_db);
        assert_eq!(samples.len(), 2 * symbols.len());
        let noise_var_est = samples
            .iter()
            .zip(symbols.iter().flat_map(|pair| [pair.x0, pair.x1]))
            .map(|(y, x)| if x == 0 { y + 1.0 } else { y - 1.0 })
            .map(|e| e * e)
            .sum::<f64>()
            / f64::from(2 * num_pairs);
        assert_float_eq!(noise_var_est, 0.05, abs <= 0.005);
    }

    #[test]
    fn test_quantize() {
        assert!(quantize(&[], 3).is_empty());
        assert_eq!(quantize(&[-2.0, -0.5, 0.0, 0.001, 0.7, 5.0], 1), [0, 0, 0, 1, 1, 1]);
        assert_eq!(quantize(&[-1.0, -0.74, -0.2, 0.0, 0.26, 1.0], 3), [0, 1, 3, 3, 5, 7]);
        assert!(quantize(&[-1.0, 1.0, 0.3, -0.3], 8).iter().all(|&x| x <= 255));
    }

    #[test]
    fn test_symbol_pairs() {
        assert!(symbol_pairs(&[]).is_empty());
        assert_eq!(
            symbol_pairs(&[1, 2, 3, 4, 5]),
            [SymbolPair::new(1, 2), SymbolPair::new(3, 4)]
        );
    }

    #[test]
    fn test_error_count() {
        assert_eq!(error_count(&[], &[One, Zero]), 0);
        assert_eq!(error_count(&[One, Zero], &[]), 0);
        // Longer `seq`
        let ref_seq = [One, Zero, Zero, One, One, One, Zero, Zero];
        let seq = [One, One, Zero, Zero, One, One, Zero, Zero, Zero, One];
        assert_eq!(error_count(&seq, &ref_seq), 2);
        // Shorter `seq`
        let ref_seq = [One, Zero, Zero, One, One, One, Zero, Zero, Zero, One];
        let seq = [One, One, Zero, Zero, One, One, Zero, Zero];
        assert_eq!(error_count(&seq, &ref_seq), 2);
    }
}
