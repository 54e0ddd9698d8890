//! Simulator to evaluate performance of the Viterbi decoder over a BPSK-AWGN channel
//!
//! Each simulation point is described by [`SimParams`]: a decoder configuration, a block size, an
//! Es/N0 value and the stopping rules. Blocks of random information bits are encoded (with tail
//! bits), sent over the channel, quantized to the configured symbol width and decoded, in runs of
//! a fixed number of blocks, until enough block errors have been seen or the maximum number of
//! runs is reached. Simulation points are run in parallel, and their [`SimResults`] are saved to
//! a JSON file.
//!
//! # Examples
//!
//! ```no_run
//! use viterbi::{sim, Code, DecoderConfig};
//!
//! let params = sim::SimParams {
//!     decoder_config: DecoderConfig::new(Code::standard(7)?, 3),
//!     num_info_bits_per_block: 200,
//!     es_over_n0_db: 0.0,
//!     num_block_errors_min: 100,
//!     num_blocks_per_run: 100,
//!     num_runs_min: 1,
//!     num_runs_max: 10,
//! };
//! sim::run_awgn_sims(&[params], "results.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{fs::File, io::BufWriter, path::Path};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{encoder, utils, Bit, Decoder, DecoderConfig, Error};

/// Parameters for Viterbi decoder simulation over BPSK-AWGN channel
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimParams {
    /// Decoder configuration (code and symbol width included)
    pub decoder_config: DecoderConfig,
    /// Number of information bits per block
    pub num_info_bits_per_block: u32,
    /// Ratio (dB) of symbol energy to noise power spectral density at BPSK-AWGN channel output
    pub es_over_n0_db: f64,
    /// Desired minimum number of block errors
    pub num_block_errors_min: u32,
    /// Number of blocks to be transmitted per run
    pub num_blocks_per_run: u32,
    /// Minimum number of runs of blocks to be simulated
    pub num_runs_min: u32,
    /// Maximum number of runs of blocks to be simulated
    pub num_runs_max: u32,
}

/// Results from Viterbi decoder simulation over BPSK-AWGN channel
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimResults {
    /// Simulation parameters
    pub params: SimParams,
    /// Number of blocks transmitted
    pub num_blocks: u32,
    /// Number of information bits transmitted
    pub num_info_bits: u32,
    /// Number of blocks in error
    pub num_block_errors: u32,
    /// Number of information bits in error
    pub num_info_bit_errors: u32,
}

impl SimResults {
    /// Returns initialized simulation results for given parameters.
    #[must_use]
    pub fn new(params: &SimParams) -> Self {
        Self {
            params: *params,
            num_blocks: 0,
            num_info_bits: 0,
            num_block_errors: 0,
            num_info_bit_errors: 0,
        }
    }

    /// Returns the block error rate.
    #[must_use]
    pub fn block_error_rate(&self) -> f64 {
        if self.num_blocks > 0 {
            f64::from(self.num_block_errors) / f64::from(self.num_blocks)
        } else {
            0.0
        }
    }

    /// Returns the information bit error rate.
    #[must_use]
    pub fn info_bit_error_rate(&self) -> f64 {
        if self.num_info_bits > 0 {
            f64::from(self.num_info_bit_errors) / f64::from(self.num_info_bits)
        } else {
            0.0
        }
    }

    /// Returns `true` if the simulation can stop after the runs completed so far.
    #[must_use]
    pub fn run_complete(&self) -> bool {
        let num_runs = self.num_blocks / self.params.num_blocks_per_run;
        num_runs >= self.params.num_runs_max
            || (num_runs >= self.params.num_runs_min
                && self.num_block_errors >= self.params.num_block_errors_min)
    }

    /// Updates results after decoding a block.
    fn update_after_block(&mut self, info_bits_hat: &[Bit], info_bits: &[Bit]) {
        let num_errors = utils::error_count(info_bits_hat, info_bits);
        self.num_blocks += 1;
        self.num_info_bits += self.params.num_info_bits_per_block;
        if num_errors > 0 {
            self.num_block_errors += 1;
            self.num_info_bit_errors += u32::try_from(num_errors).unwrap_or(u32::MAX);
        }
    }

    /// Logs a summary of the results so far.
    fn log_progress(&self) {
        info!(
            es_over_n0_db = self.params.es_over_n0_db,
            num_blocks = self.num_blocks,
            num_block_errors = self.num_block_errors,
            bler = self.block_error_rate(),
            ber = self.info_bit_error_rate(),
            "simulation progress"
        );
    }
}

/// Runs simulations for given parameters and saves results to a JSON file.
///
/// # Parameters
///
/// - `all_params`: Parameters for each simulation point.
///
/// - `json_filename`: Name of the JSON file to which the results must be saved.
///
/// # Errors
///
/// Returns an error if any simulation parameters are invalid, or if the results cannot be saved.
pub fn run_awgn_sims(
    all_params: &[SimParams],
    json_filename: impl AsRef<Path>,
) -> Result<(), Error> {
    for params in all_params {
        check_sim_params(params)?;
    }
    let all_results = all_params
        .par_iter()
        .map(run_awgn_sim)
        .collect::<Result<Vec<_>, _>>()?;
    let writer = BufWriter::new(File::create(json_filename)?);
    serde_json::to_writer_pretty(writer, &all_results)?;
    Ok(())
}

/// Runs simulation for given parameters and returns results.
///
/// # Errors
///
/// Returns an error if the simulation parameters are invalid.
pub fn run_awgn_sim(params: &SimParams) -> Result<SimResults, Error> {
    check_sim_params(params)?;
    let config = params.decoder_config;
    // OK to cast `u32` to `usize`: Block sizes are far below `usize::MAX`.
    let num_info_bits = params.num_info_bits_per_block as usize;
    let mut decoder = Decoder::new(config)?;
    let mut results = SimResults::new(params);
    while !results.run_complete() {
        for _ in 0 .. params.num_blocks_per_run {
            let info_bits = utils::random_bits(num_info_bits);
            let code_symbols = encoder::encoder(&info_bits, &config.code);
            let samples = utils::bpsk_awgn_channel(&code_symbols, params.es_over_n0_db);
            let symbols = utils::symbol_pairs(&utils::quantize(&samples, config.symbol_width));
            let bits = decoder.decode(&symbols);
            results.update_after_block(&bits[.. num_info_bits], &info_bits);
        }
        results.log_progress();
    }
    Ok(results)
}

/// Checks validity of simulation parameters.
fn check_sim_params(params: &SimParams) -> Result<(), Error> {
    params.decoder_config.check()?;
    if params.num_info_bits_per_block == 0 {
        return Err(Error::InvalidInput(
            "Number of information bits per block cannot be zero".to_string(),
        ));
    }
    if params.num_blocks_per_run == 0 {
        return Err(Error::InvalidInput(
            "Number of blocks per run cannot be zero".to_string(),
        ));
    }
    if params.num_runs_min > params.num_runs_max {
        return Err(Error::InvalidInput(format!(
            "Minimum number of runs ({}) exceeds maximum number of runs ({})",
            params.num_runs_min, params.num_runs_max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests_of_sim_results {
    use super::*;
    use crate::Code;
    use float_eq::assert_float_eq;
    use Bit::{One, Zero};

    fn params_for_test() -> SimParams {
        SimParams {
            decoder_config: DecoderConfig::new(Code::standard(3).unwrap(), 3),
            num_info_bits_per_block: 4,
            es_over_n0_db: 20.0,
            num_block_errors_min: 2,
            num_blocks_per_run: 2,
            num_runs_min: 1,
            num_runs_max: 3,
        }
    }

    #[test]
    fn test_update_after_block() {
        let mut results = SimResults::new(&params_for_test());
        assert_float_eq!(results.block_error_rate(), 0.0, abs <= 1e-12);
        assert!(!results.run_complete());
        results.update_after_block(&[One, Zero, One, One], &[One, Zero, One, One]);
        results.update_after_block(&[One, One, Zero, One], &[One, Zero, One, One]);
        assert_eq!(results.num_blocks, 2);
        assert_eq!(results.num_info_bits, 8);
        assert_eq!(results.num_block_errors, 1);
        assert_eq!(results.num_info_bit_errors, 2);
        assert_float_eq!(results.block_error_rate(), 0.5, abs <= 1e-12);
        assert_float_eq!(results.info_bit_error_rate(), 0.25, abs <= 1e-12);
        // One run done, too few block errors
        assert!(!results.run_complete());
        results.update_after_block(&[Zero, Zero, One, One], &[One, Zero, One, One]);
        results.update_after_block(&[One, Zero, One, One], &[One, Zero, One, One]);
        assert!(results.run_complete());
    }

    #[test]
    fn test_run_complete_max_runs() {
        let mut results = SimResults::new(&params_for_test());
        for _ in 0 .. 6 {
            assert!(!results.run_complete());
            results.update_after_block(&[One; 4], &[One; 4]);
        }
        assert!(results.run_complete());
    }
}
