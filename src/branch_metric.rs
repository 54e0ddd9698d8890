//! Branch metrics
//!
//! For each received symbol pair, the decoder needs the distance between the pair and the code
//! bits of every trellis transition. Transitions come in groups of two: group `n` holds the two
//! transitions leaving the `k - 1` bits of state history `n`, one for input bit `0` (the "low"
//! transition) and one for input bit `1` (the "high" transition). Since every generator
//! polynomial has its MSB set, the code bits of the high transition are the complements of
//! those of the low transition, so a single [`BranchMetricUnit`] per group computes both metrics.
//!
//! A [`BranchMetricBank`] holds all `2^(k-1)` units and fills the `2^k` branch metrics of a
//! step, with index `2n` holding the low metric and `2n + 1` the high metric of group `n`.

use crate::{common::parity, Bit, Code, Error, SymbolPair};

/// Branch metric computation for one group of two trellis transitions
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub struct BranchMetricUnit {
    /// Code bit of the low transition for the first generator polynomial
    c0: Bit,
    /// Code bit of the low transition for the second generator polynomial
    c1: Bit,
    /// Largest symbol value
    x_max: u32,
}

impl BranchMetricUnit {
    /// Returns branch metric unit for given code, transition group and largest symbol value.
    ///
    /// # Errors
    ///
    /// Returns an error if `group` is not less than the number of trellis states.
    pub fn new(code: &Code, group: usize, x_max: u32) -> Result<Self, Error> {
        if group >= code.num_states() {
            return Err(Error::InvalidInput(format!(
                "Transition group must be less than {} (found {group})",
                code.num_states()
            )));
        }
        let mask = code.num_states() - 1;
        Ok(Self {
            c0: parity(group & code.g1() & mask),
            c1: parity(group & code.g2() & mask),
            x_max,
        })
    }

    /// Returns the low and high branch metrics for given symbol pair.
    ///
    /// # Examples
    ///
    /// ```
    /// use viterbi::{BranchMetricUnit, Code, SymbolPair};
    ///
    /// let code = Code::new(3, 0b111, 0b101)?;
    /// let bmu = BranchMetricUnit::new(&code, 1, 7)?;
    /// assert_eq!(bmu.metrics(SymbolPair::new(0, 7)), (7, 7));
    /// assert_eq!(bmu.metrics(SymbolPair::new(7, 7)), (0, 14));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn metrics(&self, symbols: SymbolPair) -> (u32, u32) {
        let d0 = self.distance(symbols.x0, self.c0);
        let d1 = self.distance(symbols.x1, self.c1);
        (d0 + d1, 2 * self.x_max - d0 - d1)
    }

    /// Returns distance between a symbol and a code bit.
    fn distance(&self, x: u32, c: Bit) -> u32 {
        let x = x.min(self.x_max);
        match c {
            Bit::Zero => x,
            Bit::One => self.x_max - x,
        }
    }
}

/// Bank of branch metric units covering every transition group of a code
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct BranchMetricBank {
    /// One unit per transition group
    units: Vec<BranchMetricUnit>,
}

impl BranchMetricBank {
    /// Returns branch metric bank for given code and largest symbol value.
    ///
    /// # Errors
    ///
    /// Returns an error if `x_max` is `0`.
    pub fn new(code: &Code, x_max: u32) -> Result<Self, Error> {
        if x_max == 0 {
            return Err(Error::InvalidInput(
                "Largest symbol value must be positive".to_string(),
            ));
        }
        let units = (0 .. code.num_states())
            .map(|group| BranchMetricUnit::new(code, group, x_max))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { units })
    }

    /// Returns the number of branch metrics per step.
    #[must_use]
    pub fn num_metrics(&self) -> usize {
        2 * self.units.len()
    }

    /// Fills branch metrics for given symbol pair, or zeros if there is none.
    ///
    /// # Panics
    ///
    /// Panics if `metrics` does not hold exactly [`Self::num_metrics`] values.
    pub fn compute(&self, symbols: Option<SymbolPair>, metrics: &mut [u32]) {
        assert_eq!(metrics.len(), self.num_metrics(), "Branch metric bank size mismatch");
        match symbols {
            Some(symbols) => {
                for (unit, pair) in self.units.iter().zip(metrics.chunks_exact_mut(2)) {
                    (pair[0], pair[1]) = unit.metrics(symbols);
                }
            }
            None => metrics.fill(0),
        }
    }
}

#[cfg(test)]
mod tests_of_branch_metric_unit {
    use super::*;

    #[test]
    fn test_new() {
        let code = Code::standard(3).unwrap();
        assert!(BranchMetricUnit::new(&code, 4, 1).is_err());
        let bmu = BranchMetricUnit::new(&code, 2, 1).unwrap();
        assert_eq!(bmu.c0, Bit::One);
        assert_eq!(bmu.c1, Bit::Zero);
    }

    #[test]
    fn test_metrics_symmetry() {
        for k in [3, 4, 5, 7] {
            let code = Code::standard(k).unwrap();
            for x_max in [1, 5, 7, 15] {
                for group in 0 .. code.num_states() {
                    let bmu = BranchMetricUnit::new(&code, group, x_max).unwrap();
                    for x0 in 0 ..= x_max {
                        for x1 in 0 ..= x_max {
                            let (low, high) = bmu.metrics(SymbolPair::new(x0, x1));
                            assert_eq!(low + high, 2 * x_max);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests_of_branch_metric_bank {
    use super::*;

    #[test]
    fn test_new() {
        let code = Code::standard(5).unwrap();
        assert!(BranchMetricBank::new(&code, 0).is_err());
        let bank = BranchMetricBank::new(&code, 7).unwrap();
        assert_eq!(bank.num_metrics(), 32);
    }

    #[test]
    fn test_compute_hard_decision() {
        // Transitions of the (7, 5) code: 00 -> 00, 00 -> 10, 01 -> 00, 01 -> 10, 10 -> 01,
        // 10 -> 11, 11 -> 01, 11 -> 11
        let bank = BranchMetricBank::new(&Code::standard(3).unwrap(), 1).unwrap();
        let mut metrics = [0; 8];
        let expected = [
            [0, 2, 2, 0, 1, 1, 1, 1],
            [1, 1, 1, 1, 0, 2, 2, 0],
            [1, 1, 1, 1, 2, 0, 0, 2],
            [2, 0, 0, 2, 1, 1, 1, 1],
        ];
        for (s, expected_metrics) in expected.iter().enumerate() {
            let (x0, x1) = (s & 1, s >> 1);
            let symbols = SymbolPair::new(u32::try_from(x0).unwrap(), u32::try_from(x1).unwrap());
            bank.compute(Some(symbols), &mut metrics);
            assert_eq!(&metrics, expected_metrics);
        }
        bank.compute(None, &mut metrics);
        assert_eq!(metrics, [0; 8]);
    }

    #[test]
    fn test_compute_soft_decision() {
        let bank = BranchMetricBank::new(&Code::standard(3).unwrap(), 7).unwrap();
        let mut metrics = [0; 8];
        bank.compute(Some(SymbolPair::new(2, 6)), &mut metrics);
        assert_eq!(metrics, [8, 6, 6, 8, 11, 3, 3, 11]);
    }
}
