//! Combinatorial minimum over a bank of metrics
//!
//! The minimum is found by a balanced pairwise reduction tree. Each node compares the operands
//! with their `lsb` lowest bits discarded, so the result is only approximate: it is never
//! larger than the true minimum, and smaller by less than `2^lsb`. With `lsb = 0` it is exact.

use crate::Error;

/// Balanced reduction tree computing an approximate minimum
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct MinimumTree {
    /// Number of metrics
    num: usize,
    /// Metric width in bits
    width: u32,
    /// Number of low-order bits ignored in comparisons
    lsb: u32,
    /// Scratch buffer holding one level of the tree
    level: Vec<u32>,
}

impl MinimumTree {
    /// Returns reduction tree for given number of metrics, metric width and truncation index.
    ///
    /// # Parameters
    ///
    /// - `num`: Number of metrics. Must be a power of 2 no less than 2.
    ///
    /// - `width`: Metric width in bits.
    ///
    /// - `lsb`: Number of low-order bits ignored in comparisons. Must be less than `width`.
    ///
    /// # Errors
    ///
    /// Returns an error if `num` is not a power of 2 no less than 2, or if `lsb` is not less
    /// than `width`.
    ///
    /// # Examples
    ///
    /// ```
    /// use viterbi::MinimumTree;
    ///
    /// let mut tree = MinimumTree::new(4, 8, 0)?;
    /// assert_eq!(tree.minimum(&[7, 3, 9, 4]), 3);
    /// let mut tree = MinimumTree::new(4, 8, 2)?;
    /// assert_eq!(tree.minimum(&[7, 5, 9, 6]), 4);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(num: usize, width: u32, lsb: u32) -> Result<Self, Error> {
        if num < 2 || !num.is_power_of_two() {
            return Err(Error::InvalidInput(format!(
                "Number of metrics must be a power of 2 no less than 2 (found {num})"
            )));
        }
        if lsb >= width {
            return Err(Error::InvalidInput(format!(
                "Truncation index ({lsb}) must be less than the metric width ({width})"
            )));
        }
        Ok(Self {
            num,
            width,
            lsb,
            level: vec![0; num / 2],
        })
    }

    /// Returns the number of metrics.
    #[must_use]
    pub fn num(&self) -> usize {
        self.num
    }

    /// Returns the metric width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the truncation index.
    #[must_use]
    pub fn lsb(&self) -> u32 {
        self.lsb
    }

    /// Returns the approximate minimum of the metrics, with its `lsb` lowest bits zeroed.
    ///
    /// # Panics
    ///
    /// Panics if `metrics` does not hold exactly `num` values.
    pub fn minimum(&mut self, metrics: &[u32]) -> u32 {
        assert_eq!(metrics.len(), self.num, "Metric bank size mismatch");
        let lsb = self.lsb;
        let select = |a: u32, b: u32| if a < b { a } else { b };
        for (node, pair) in self.level.iter_mut().zip(metrics.chunks_exact(2)) {
            *node = select(pair[0] >> lsb, pair[1] >> lsb);
        }
        let mut len = self.num / 2;
        while len > 1 {
            for n in 0 .. len / 2 {
                self.level[n] = select(self.level[2 * n], self.level[2 * n + 1]);
            }
            len /= 2;
        }
        self.level[0] << lsb
    }
}

#[cfg(test)]
mod tests_of_minimum_tree {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_new() {
        assert!(MinimumTree::new(0, 8, 0).is_err());
        assert!(MinimumTree::new(1, 8, 0).is_err());
        assert!(MinimumTree::new(6, 8, 0).is_err());
        assert!(MinimumTree::new(4, 8, 8).is_err());
        let tree = MinimumTree::new(16, 8, 4).unwrap();
        assert_eq!(tree.num(), 16);
        assert_eq!(tree.width(), 8);
        assert_eq!(tree.lsb(), 4);
    }

    #[test]
    fn test_minimum_exact() {
        let mut tree = MinimumTree::new(2, 4, 0).unwrap();
        assert_eq!(tree.minimum(&[5, 5]), 5);
        assert_eq!(tree.minimum(&[15, 0]), 0);
        let mut tree = MinimumTree::new(8, 6, 0).unwrap();
        assert_eq!(tree.minimum(&[33, 41, 17, 60, 18, 17, 44, 63]), 17);
        let mut rng = rand::rng();
        for _ in 0 .. 100 {
            let metrics: Vec<u32> = (0 .. 8).map(|_| rng.random_range(0 .. 64)).collect();
            assert_eq!(tree.minimum(&metrics), *metrics.iter().min().unwrap());
        }
    }

    #[test]
    fn test_minimum_truncated() {
        let mut rng = rand::rng();
        for lsb in 1 .. 6 {
            let mut tree = MinimumTree::new(32, 10, lsb).unwrap();
            for _ in 0 .. 100 {
                let metrics: Vec<u32> = (0 .. 32).map(|_| rng.random_range(0 .. 1024)).collect();
                let true_min = *metrics.iter().min().unwrap();
                let approx_min = tree.minimum(&metrics);
                assert!(approx_min <= true_min);
                assert!(true_min - approx_min < 1 << lsb);
                assert_eq!(approx_min % (1 << lsb), 0);
            }
        }
    }

    #[test]
    fn test_minimum_monotonic() {
        let mut tree = MinimumTree::new(4, 8, 2).unwrap();
        let mut metrics = [200, 100, 150, 120];
        let mut prev = tree.minimum(&metrics);
        for n in 0 .. 4 {
            metrics[n] += 37;
            let curr = tree.minimum(&metrics);
            assert!(curr >= prev);
            prev = curr;
        }
    }
}
