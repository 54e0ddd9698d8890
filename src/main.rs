//! This crate simulates the BER-versus-SNR and BLER-versus-SNR performance of a streaming Viterbi
//! decoder for a rate-1/2 convolutional code over a BPSK-AWGN channel. Simulation parameters are
//! specified on the command line (the decoder configuration optionally in a JSON file), and
//! simulation results are saved to a JSON file.
//!
//! Build the executable with `cargo build --release` and then run `./target/release/viterbi -h`
//! for help on the command-line interface. Set `RUST_LOG` (for example, `RUST_LOG=viterbi=debug`)
//! to control logging.

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

use anyhow::Result;
use clap::parser::ValueSource;
use clap::{crate_name, crate_version, value_parser, Arg, ArgMatches, Command};
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};
use viterbi::{sim, Code, DecoderConfig};

/// Main function
fn main() -> Result<()> {
    init_tracing();
    let timer = Instant::now();
    let matches = command_line_parser().get_matches();
    let json_filename = &json_filename_from_matches(&matches);
    sim::run_awgn_sims(&all_sim_params(&matches)?, json_filename)?;
    eprintln!("Elapsed time: {:.3?}", timer.elapsed());
    Ok(())
}

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (`viterbi=info` if not set).
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("viterbi=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Returns command line parser.
fn command_line_parser() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about("Evaluates the performance of a rate-1/2 Viterbi decoder over a BPSK-AWGN channel")
        .arg(constraint_len())
        .arg(symbol_width())
        .arg(config_filename())
        .arg(num_info_bits_per_block())
        .arg(first_snr_db())
        .arg(snr_step_db())
        .arg(num_snr())
        .arg(num_block_errors_min())
        .arg(num_blocks_per_run())
        .arg(num_runs_min())
        .arg(num_runs_max())
        .arg(json_filename())
}

/// Returns argument for constraint length of the standard code.
fn constraint_len() -> Arg {
    Arg::new("constraint_len")
        .short('k')
        .value_parser(value_parser!(usize))
        .default_value("7")
        .help("Constraint length of the standard code (3, 4, 5 or 7)")
}

/// Returns argument for symbol width.
fn symbol_width() -> Arg {
    Arg::new("symbol_width")
        .short('w')
        .value_parser(value_parser!(u32))
        .default_value("3")
        .help("Symbol width (1 for hard decisions)")
}

/// Returns argument for name of JSON file holding the decoder configuration.
fn config_filename() -> Arg {
    Arg::new("config_filename")
        .short('c')
        .help("Name of JSON file holding the decoder configuration (overrides -k and -w)")
}

/// Returns argument for number of information bits per block.
fn num_info_bits_per_block() -> Arg {
    Arg::new("num_info_bits_per_block")
        .short('i')
        .value_parser(value_parser!(u32))
        .default_value("1000")
        .help("Number of information bits per block")
}

/// Returns argument for first Es/N0 (dB).
fn first_snr_db() -> Arg {
    Arg::new("first_snr_db")
        .short('r')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("-2.0")
        .help("First Es/N0 (dB)")
}

/// Returns argument for Es/N0 step (dB).
fn snr_step_db() -> Arg {
    Arg::new("snr_step_db")
        .short('p')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("1.0")
        .help("Es/N0 step (dB)")
}

/// Returns argument for number of Es/N0 values.
fn num_snr() -> Arg {
    Arg::new("num_snr")
        .short('s')
        .value_parser(value_parser!(u32))
        .default_value("5")
        .help("Number of Es/N0 values")
}

/// Returns argument for desired minimum number of block errors.
fn num_block_errors_min() -> Arg {
    Arg::new("num_block_errors_min")
        .short('e')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Desired minimum number of block errors")
}

/// Returns argument for number of blocks to be transmitted per run.
fn num_blocks_per_run() -> Arg {
    Arg::new("num_blocks_per_run")
        .short('b')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Number of blocks to be transmitted per run")
}

/// Returns argument for minimum number of runs of blocks to be simulated.
fn num_runs_min() -> Arg {
    Arg::new("num_runs_min")
        .short('n')
        .value_parser(value_parser!(u32))
        .default_value("10")
        .help("Minimum number of runs of blocks to be simulated")
}

/// Returns argument for maximum number of runs of blocks to be simulated.
fn num_runs_max() -> Arg {
    Arg::new("num_runs_max")
        .short('x')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Maximum number of runs of blocks to be simulated")
}

/// Returns argument for name of JSON file to which results must be saved.
fn json_filename() -> Arg {
    Arg::new("json_filename")
        .short('f')
        .default_value("results.json")
        .help("Name of JSON file to which results must be saved")
}

/// Returns simulation parameters based on command-line arguments.
///
/// # Errors
///
/// Returns an error if the decoder configuration cannot be built or read.
fn all_sim_params(matches: &ArgMatches) -> Result<Vec<sim::SimParams>> {
    let decoder_config = decoder_config_from_matches(matches)?;
    let mut num_runs_min = num_runs_min_from_matches(matches);
    let mut num_runs_max = num_runs_max_from_matches(matches);
    if num_runs_min > num_runs_max {
        if let Some(ValueSource::DefaultValue) = matches.value_source("num_runs_min") {
            num_runs_min = num_runs_max;
        }
        if let Some(ValueSource::DefaultValue) = matches.value_source("num_runs_max") {
            num_runs_max = num_runs_min;
        }
    }
    Ok(all_es_over_n0_db_from_matches(matches)
        .into_iter()
        .map(|es_over_n0_db| sim::SimParams {
            decoder_config,
            num_info_bits_per_block: num_info_bits_per_block_from_matches(matches),
            es_over_n0_db,
            num_block_errors_min: num_block_errors_min_from_matches(matches),
            num_blocks_per_run: num_blocks_per_run_from_matches(matches),
            num_runs_min,
            num_runs_max,
        })
        .collect())
}

// OK to unwrap in the `*_from_matches` functions below: All command-line arguments except the
// decoder configuration filename have default values.

/// Returns decoder configuration, read from a file if one is given.
fn decoder_config_from_matches(matches: &ArgMatches) -> Result<DecoderConfig> {
    if let Some(filename) = matches.get_one::<String>("config_filename") {
        return Ok(DecoderConfig::from_json_file(filename)?);
    }
    let code = Code::standard(*matches.get_one("constraint_len").unwrap())?;
    let config = DecoderConfig::new(code, *matches.get_one("symbol_width").unwrap());
    config.check()?;
    Ok(config)
}

/// Returns number of information bits per block.
fn num_info_bits_per_block_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_info_bits_per_block").unwrap()
}

/// Returns all Es/N0 (dB) values.
fn all_es_over_n0_db_from_matches(matches: &ArgMatches) -> Vec<f64> {
    let first_snr_db: f64 = *matches.get_one("first_snr_db").unwrap();
    let snr_step_db: f64 = *matches.get_one("snr_step_db").unwrap();
    let num_snr: u32 = *matches.get_one("num_snr").unwrap();
    (0 .. num_snr)
        .map(|n| first_snr_db + snr_step_db * f64::from(n))
        .collect()
}

/// Returns desired minimum number of block errors.
fn num_block_errors_min_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_block_errors_min").unwrap()
}

/// Returns number of blocks to be transmitted per run.
fn num_blocks_per_run_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_blocks_per_run").unwrap()
}

/// Returns minimum number of runs of blocks to be simulated.
fn num_runs_min_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_runs_min").unwrap()
}

/// Returns maximum number of runs of blocks to be simulated.
fn num_runs_max_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_runs_max").unwrap()
}

/// Returns name of JSON file to which simulation results must be saved.
fn json_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("json_filename")
        .unwrap()
        .to_string()
}
