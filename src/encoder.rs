//! Rate-1/2 convolutional encoder
//!
//! The encoder is a shift register holding the `k - 1` most recent input bits. For each input
//! bit, the code bits are the parities of the register contents (with the input bit as MSB)
//! masked by the two generator polynomials. It produces the test vectors for the decoder, and
//! its state numbering matches the transition groups of the branch metric unit: from state `s`,
//! input bit `b` leads through branch metric `2s + b`.

use crate::{common::parity, Bit, Code, SymbolPair};

/// Shift-register encoder for a rate-1/2 convolutional code
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub struct ConvolutionalEncoder {
    /// Code
    code: Code,
    /// Previous `k - 1` input bits, the most recent one being the MSB
    state: usize,
}

impl ConvolutionalEncoder {
    /// Returns encoder for given code, in state `0`.
    #[must_use]
    pub fn new(code: Code) -> Self {
        Self { code, state: 0 }
    }

    /// Returns the encoder state.
    #[must_use]
    pub fn state(&self) -> usize {
        self.state
    }

    /// Returns code bits for given input bit, and updates state.
    pub fn encode_bit(&mut self, input_bit: Bit) -> (Bit, Bit) {
        let aug_state = (usize::from(bool::from(input_bit)) << self.code.memory_len()) | self.state;
        self.state = aug_state >> 1;
        (
            parity(aug_state & self.code.g1()),
            parity(aug_state & self.code.g2()),
        )
    }
}

/// Returns code symbols for given information bits, followed by those of the tail bits.
///
/// # Parameters
///
/// - `info_bits`: Information bits to be encoded.
///
/// - `code`: Convolutional code.
///
/// # Returns
///
/// - `symbols`: Hard-decision symbol pairs, one per information bit followed by one per tail
///   bit. The `k - 1` tail bits are all `Zero`, returning the encoder to state `0`.
///
/// # Examples
///
/// ```
/// use viterbi::{encoder, Bit, Code};
///
/// let code = Code::standard(3)?;
/// let symbols = encoder::encoder(&[Bit::One, Bit::One, Bit::Zero], &code);
/// let pairs: Vec<(u32, u32)> = symbols.iter().map(|pair| (pair.x0, pair.x1)).collect();
/// assert_eq!(pairs, [(1, 1), (0, 1), (0, 1), (1, 1), (0, 0)]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[must_use]
pub fn encoder(info_bits: &[Bit], code: &Code) -> Vec<SymbolPair> {
    let mut encoder = ConvolutionalEncoder::new(*code);
    let tail_bits = std::iter::repeat(Bit::Zero).take(code.memory_len());
    info_bits
        .iter()
        .copied()
        .chain(tail_bits)
        .map(|bit| {
            let (c0, c1) = encoder.encode_bit(bit);
            SymbolPair::from_bits(c0, c1)
        })
        .collect()
}

#[cfg(test)]
mod tests_of_convolutional_encoder {
    use super::*;
    use crate::BranchMetricBank;
    use Bit::{One, Zero};

    #[test]
    fn test_encode_bit() {
        let mut encoder = ConvolutionalEncoder::new(Code::standard(3).unwrap());
        assert_eq!(encoder.encode_bit(One), (One, One));
        assert_eq!(encoder.state(), 0b10);
        assert_eq!(encoder.encode_bit(One), (Zero, One));
        assert_eq!(encoder.state(), 0b11);
        assert_eq!(encoder.encode_bit(Zero), (Zero, One));
        assert_eq!(encoder.encode_bit(Zero), (One, One));
        assert_eq!(encoder.encode_bit(Zero), (Zero, Zero));
        assert_eq!(encoder.state(), 0);
    }

    #[test]
    fn test_copy_keeps_state() {
        let mut encoder = ConvolutionalEncoder::new(Code::standard(3).unwrap());
        encoder.encode_bit(One);
        let mut copy = encoder;
        assert_eq!(copy.encode_bit(One), encoder.encode_bit(One));
        assert_eq!(copy, encoder);
        copy.encode_bit(Zero);
        assert_ne!(copy.state(), encoder.state());
    }

    #[test]
    fn test_matches_branch_metrics() {
        for k in [3, 4, 5, 7] {
            let code = Code::standard(k).unwrap();
            let bank = BranchMetricBank::new(&code, 1).unwrap();
            let mut metrics = vec![0; code.num_branch_metrics()];
            for state in 0 .. code.num_states() {
                for input_bit in [Zero, One] {
                    let mut encoder = ConvolutionalEncoder::new(code);
                    encoder.state = state;
                    let (c0, c1) = encoder.encode_bit(input_bit);
                    bank.compute(Some(SymbolPair::from_bits(c0, c1)), &mut metrics);
                    assert_eq!(metrics[2 * state + input_bit as usize], 0);
                    assert_eq!(metrics[2 * state + 1 - input_bit as usize], 2);
                }
            }
        }
    }
}
