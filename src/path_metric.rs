//! Path metrics
//!
//! The [`PathMetricUnit`] holds one path metric per trellis state and advances them by one
//! trellis step per valid input. The add-compare-select operations are arranged as a butterfly
//! network: butterfly `j` reads the metrics of states `j` and `j + 2^(k-2)` (which differ only in
//! their most significant bit) and produces the metrics of states `2j` and `2j + 1`. The branch
//! metrics for butterfly `j` are read from transition group `2 * vdc[j]`, where `vdc` is the
//! base-2 Van der Corput sequence (bit reversal over `k - 2` bits), and the survivor bit of each
//! new state records which of the two predecessors won.
//!
//! Metrics live in `pm_width`-bit registers. Unless normalized, they grow without bound and
//! eventually wrap; the [`Normalization`] policy decides when the (approximate) minimum metric
//! is subtracted from every register.

use bitvec::prelude::*;
use tracing::{debug, warn};

use crate::{add_compare_select, Bit, DecoderConfig, Error, MinimumTree, Normalization};

/// Path metric registers with a butterfly network of add-compare-select operations
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PathMetricUnit {
    /// Number of butterflies `2^(k-2)`
    num_butterflies: usize,
    /// Van der Corput permutation of the butterflies
    vdc: Vec<usize>,
    /// Path metric registers
    metrics: Vec<u32>,
    /// Scratch buffer for the metrics of the next step
    next_metrics: Vec<u32>,
    /// Survivor bits of the latest valid step
    survivors: BitVec,
    /// Largest value a register can hold
    pm_max: u32,
    /// Normalization policy
    normalization: Normalization,
    /// Reduction tree for the minimum metric
    minimum_tree: MinimumTree,
    /// Number of steps in which a metric exceeded the register width
    overflow_count: usize,
    /// Number of valid steps since the latest idle slot
    steps_since_idle_slot: usize,
    /// Largest allowed number of valid steps between idle slots
    max_steps_between_idle_slots: usize,
}

impl PathMetricUnit {
    /// Returns path metric unit for given decoder configuration, with all metrics set to `0`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use viterbi::{Code, DecoderConfig, PathMetricUnit};
    ///
    /// let config = DecoderConfig::new(Code::standard(3)?, 1);
    /// let mut pmu = PathMetricUnit::new(&config)?;
    /// // All-zeros path is the only one with zero metric after a few all-zeros steps.
    /// let branch_metrics = [0, 2, 2, 0, 1, 1, 1, 1];
    /// for _ in 0 .. 3 {
    ///     pmu.step(&branch_metrics, true);
    /// }
    /// assert_eq!(pmu.metrics()[0], 0);
    /// assert!(pmu.metrics()[1 ..].iter().all(|&m| m > 0));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(config: &DecoderConfig) -> Result<Self, Error> {
        config.check()?;
        let num_states = config.code.num_states();
        let num_butterflies = num_states / 2;
        let pm_width = config.pm_width();
        debug!(
            pm_width,
            explicit = config.pm_width.is_some(),
            normalization = %config.normalization,
            "path metric unit"
        );
        Ok(Self {
            num_butterflies,
            vdc: van_der_corput(num_butterflies),
            metrics: vec![0; num_states],
            next_metrics: vec![0; num_states],
            survivors: bitvec![0; num_states],
            pm_max: (1 << pm_width) - 1,
            normalization: config.normalization,
            minimum_tree: MinimumTree::new(num_states, pm_width, config.minimum_lsb)?,
            overflow_count: 0,
            steps_since_idle_slot: 0,
            max_steps_between_idle_slots: config.max_steps_between_idle_slots(),
        })
    }

    /// Returns the path metric registers.
    #[must_use]
    pub fn metrics(&self) -> &[u32] {
        &self.metrics
    }

    /// Returns the number of steps in which a metric exceeded the register width.
    #[must_use]
    pub fn overflow_count(&self) -> usize {
        self.overflow_count
    }

    /// Restores all registers to `0`.
    pub fn reset(&mut self) {
        self.metrics.fill(0);
        self.survivors.fill(false);
        self.overflow_count = 0;
        self.steps_since_idle_slot = 0;
    }

    /// Advances the path metrics by one step, returning the survivor bits of a valid step.
    ///
    /// # Parameters
    ///
    /// - `branch_metrics`: The `2^k` branch metrics of the step.
    ///
    /// - `valid`: Whether the step carries a received symbol pair. Invalid steps do not advance
    ///   the trellis; under [`Normalization::IdleSlot`], they normalize the registered metrics.
    ///
    /// # Returns
    ///
    /// - `survivors`: Survivor bit of each state (bit `s` is `1` if the predecessor of state `s`
    ///   with the most significant bit set won), or `None` for an invalid step.
    ///
    /// # Panics
    ///
    /// Panics if `branch_metrics` does not hold exactly `2^k` values.
    pub fn step(&mut self, branch_metrics: &[u32], valid: bool) -> Option<&BitSlice> {
        assert_eq!(
            branch_metrics.len(),
            2 * self.metrics.len(),
            "Branch metric bank size mismatch"
        );
        if !valid {
            if self.normalization == Normalization::IdleSlot {
                let min = self.minimum_tree.minimum(&self.metrics);
                self.metrics.iter_mut().for_each(|m| *m -= min);
                self.steps_since_idle_slot = 0;
            }
            return None;
        }
        let half = self.num_butterflies;
        let mut overflow = false;
        for j in 0 .. half {
            let b = 4 * self.vdc[j];
            let (pm_low, pm_high) = (self.metrics[j], self.metrics[j + half]);
            for (o, bm_low, bm_high) in [
                (2 * j, branch_metrics[b], branch_metrics[b + 2]),
                (2 * j + 1, branch_metrics[b + 1], branch_metrics[b + 3]),
            ] {
                let (metric, survivor) = add_compare_select(bm_low + pm_low, bm_high + pm_high);
                overflow |= metric > self.pm_max;
                self.next_metrics[o] = metric & self.pm_max;
                self.survivors.set(o, survivor == Bit::One);
            }
        }
        if overflow {
            self.overflow_count += 1;
            warn!(
                overflow_count = self.overflow_count,
                pm_max = self.pm_max,
                "path metric overflow"
            );
        }
        match self.normalization {
            Normalization::Off => (),
            Normalization::EveryStep => {
                let min = self.minimum_tree.minimum(&self.next_metrics);
                self.next_metrics.iter_mut().for_each(|m| *m -= min);
            }
            Normalization::IdleSlot => {
                self.steps_since_idle_slot += 1;
                if self.steps_since_idle_slot == self.max_steps_between_idle_slots + 1 {
                    warn!(
                        max_steps = self.max_steps_between_idle_slots,
                        "no idle slot for normalization, path metrics may overflow"
                    );
                }
            }
        }
        std::mem::swap(&mut self.metrics, &mut self.next_metrics);
        Some(self.survivors.as_bitslice())
    }
}

/// Returns the first `num` terms of the base-2 Van der Corput sequence scaled by `num`.
///
/// For `num` a power of 2, term `i` is the bit reversal of `i` over `log2(num)` bits.
fn van_der_corput(num: usize) -> Vec<usize> {
    let num_bits = num.trailing_zeros();
    (0 .. num)
        .map(|i| {
            if num_bits == 0 {
                0
            } else {
                i.reverse_bits() >> (usize::BITS - num_bits)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests_of_path_metric_unit {
    use super::*;
    use crate::Code;

    fn config(k: usize, normalization: Normalization, minimum_lsb: u32) -> DecoderConfig {
        let mut config = DecoderConfig::new(Code::standard(k).unwrap(), 1);
        config.normalization = normalization;
        config.minimum_lsb = minimum_lsb;
        config
    }

    fn survivors_as_number(survivors: &BitSlice) -> u128 {
        survivors
            .iter()
            .by_vals()
            .enumerate()
            .map(|(s, bit)| u128::from(bit) << s)
            .sum()
    }

    #[test]
    fn test_van_der_corput() {
        assert_eq!(van_der_corput(1), [0]);
        assert_eq!(van_der_corput(2), [0, 1]);
        assert_eq!(van_der_corput(4), [0, 2, 1, 3]);
        assert_eq!(van_der_corput(8), [0, 4, 2, 6, 1, 5, 3, 7]);
    }

    #[test]
    fn test_new() {
        let mut bad_config = config(3, Normalization::EveryStep, 4);
        bad_config.traceback_rate = 0;
        assert!(PathMetricUnit::new(&bad_config).is_err());
        let pmu = PathMetricUnit::new(&config(5, Normalization::EveryStep, 0)).unwrap();
        assert_eq!(pmu.metrics(), [0; 16]);
        assert_eq!(pmu.overflow_count(), 0);
        assert_eq!(pmu.pm_max, 63);
    }

    #[test]
    fn test_step_survivors() {
        for k in [3, 4, 5, 7] {
            for lsb in [0, 4] {
                let mut pmu = PathMetricUnit::new(&config(k, Normalization::EveryStep, lsb))
                    .unwrap();
                let num_bm = 1 << k;
                let high: Vec<u32> = (0 .. num_bm).map(|i| u32::from(i % 2 == 0)).collect();
                let low: Vec<u32> = (0 .. num_bm).map(|i| u32::from(i % 2 == 1)).collect();
                let all_ones = (1u128 << (1 << (k - 1))) - 1;
                let cases = [(&high, all_ones), (&low, 0), (&high, all_ones)];
                for (branch_metrics, expected) in cases {
                    for _ in 0 .. k - 1 {
                        pmu.step(branch_metrics, true);
                    }
                    let survivors = pmu.step(branch_metrics, true).unwrap();
                    assert_eq!(survivors_as_number(survivors), expected);
                }
            }
        }
    }

    #[test]
    fn test_step_invalid() {
        let mut pmu = PathMetricUnit::new(&config(3, Normalization::EveryStep, 0)).unwrap();
        let branch_metrics = [2, 0, 0, 2, 1, 1, 1, 1];
        assert!(pmu.step(&branch_metrics, true).is_some());
        let metrics = pmu.metrics().to_vec();
        assert!(pmu.step(&branch_metrics, false).is_none());
        assert_eq!(pmu.metrics(), metrics);
    }

    #[test]
    fn test_step_idle_slot() {
        let mut pmu = PathMetricUnit::new(&config(3, Normalization::IdleSlot, 0)).unwrap();
        for _ in 0 .. 2 {
            pmu.step(&[0, 2, 2, 0, 1, 1, 1, 1], true);
        }
        for _ in 0 .. 3 {
            pmu.step(&[1; 8], true);
        }
        assert_eq!(pmu.metrics(), [3; 4]);
        assert!(pmu.step(&[1; 8], false).is_none());
        assert_eq!(pmu.metrics(), [0; 4]);
        // Consecutive idle slots change nothing further
        assert!(pmu.step(&[1; 8], false).is_none());
        assert_eq!(pmu.metrics(), [0; 4]);
    }

    #[test]
    fn test_step_overflow() {
        // Without normalization, metrics grow until they wrap
        let mut pmu = PathMetricUnit::new(&config(3, Normalization::Off, 0)).unwrap();
        for _ in 0 .. 100 {
            pmu.step(&[1; 8], true);
        }
        assert_eq!(pmu.overflow_count(), 3);
        assert!(pmu.metrics().iter().all(|&m| m <= 31));
        pmu.reset();
        assert_eq!(pmu.overflow_count(), 0);
        assert_eq!(pmu.metrics(), [0; 4]);
    }

    #[test]
    fn test_step_no_overflow() {
        let mut pmu = PathMetricUnit::new(&config(7, Normalization::EveryStep, 4)).unwrap();
        let num_bm = 1 << 7;
        let branch_metrics: Vec<u32> = (0 .. num_bm).map(|i| [0, 2, 1, 1][i % 4]).collect();
        for _ in 0 .. 1000 {
            pmu.step(&branch_metrics, true);
        }
        assert_eq!(pmu.overflow_count(), 0);
    }
}
