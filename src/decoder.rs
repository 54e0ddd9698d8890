//! Top-level Viterbi decoder
//!
//! A [`Decoder`] chains the decoder pipeline stages, advancing all of them once per call to
//! [`Decoder::step`]:
//!
//! 1. The [`BranchMetricBank`] computes the branch metrics of the received symbol pair.
//!
//! 2. Optionally, the branch metrics (and their validity) are held in a register for one step.
//!
//! 3. The [`PathMetricUnit`] updates the path metrics and, for a valid step, yields the survivor
//!    bits, which are written to the [`TracebackEngine`].
//!
//! 4. The traceback engine ticks `traceback_rate` times, emitting zero or more decoded bits.
//!
//! Decoded bits come out in order, with a latency of several traceback lengths; the first
//! [`Decoder::startup_discard`] bits after reset carry no information. The [`Decoder::decode`]
//! method and the [`decoder`] function take care of this for a block of symbol pairs.

use tracing::debug;

use crate::{
    Bit, BranchMetricBank, DecoderConfig, Error, Normalization, PathMetricUnit, SymbolPair,
    TracebackEngine,
};

/// Number of all-zeros steps, in traceback lengths, after which a block is fully flushed
const FLUSH_LENGTHS: usize = 4;

/// Streaming Viterbi decoder for a rate-1/2 convolutional code
#[derive(Clone, PartialEq, Debug)]
pub struct Decoder {
    /// Decoder configuration
    config: DecoderConfig,
    /// Branch metric computation
    bank: BranchMetricBank,
    /// Branch metrics fed to the path metric unit
    branch_metrics: Vec<u32>,
    /// Branch metric register
    registered_metrics: Vec<u32>,
    /// Validity of the registered branch metrics
    registered_valid: bool,
    /// Path metric computation
    pmu: PathMetricUnit,
    /// Traceback of survivor paths
    traceback: TracebackEngine,
}

impl Decoder {
    /// Returns decoder for given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use viterbi::{Code, Decoder, DecoderConfig, SymbolPair};
    ///
    /// let config = DecoderConfig::new(Code::standard(3)?, 1);
    /// let mut decoder = Decoder::new(config)?;
    /// let mut bits = Vec::new();
    /// for _ in 0 .. 100 {
    ///     decoder.step(Some(SymbolPair::new(0, 0)), &mut bits);
    /// }
    /// assert!(bits.len() <= 100);
    /// assert_eq!(decoder.startup_discard(), 32);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(config: DecoderConfig) -> Result<Self, Error> {
        config.check()?;
        let traceback_length = config.traceback_length();
        debug!(
            traceback_length,
            explicit = config.traceback_length.is_some(),
            traceback_rate = config.traceback_rate,
            "traceback engine"
        );
        let bank = BranchMetricBank::new(&config.code, config.x_max())?;
        let num_metrics = bank.num_metrics();
        Ok(Self {
            bank,
            branch_metrics: vec![0; num_metrics],
            registered_metrics: vec![0; num_metrics],
            registered_valid: false,
            pmu: PathMetricUnit::new(&config)?,
            traceback: TracebackEngine::new(config.code.constraint_len(), traceback_length)?,
            config,
        })
    }

    /// Returns the decoder configuration.
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Returns the number of decoded bits to be discarded after reset.
    #[must_use]
    pub fn startup_discard(&self) -> usize {
        2 * self.traceback.length()
    }

    /// Returns the number of steps in which a path metric exceeded the register width.
    #[must_use]
    pub fn overflow_count(&self) -> usize {
        self.pmu.overflow_count()
    }

    /// Restores all registers to their reset values.
    pub fn reset(&mut self) {
        self.registered_metrics.fill(0);
        self.registered_valid = false;
        self.pmu.reset();
        self.traceback.reset();
    }

    /// Advances the decoder by one step.
    ///
    /// # Parameters
    ///
    /// - `symbols`: Received symbol pair, or `None` if there is none in this step.
    ///
    /// - `bits`: Vector to which the decoded bits of this step (at most `traceback_rate` of
    ///   them) are appended.
    pub fn step(&mut self, symbols: Option<SymbolPair>, bits: &mut Vec<Bit>) {
        self.bank.compute(symbols, &mut self.branch_metrics);
        let mut valid = symbols.is_some();
        if self.config.register_bm {
            std::mem::swap(&mut self.branch_metrics, &mut self.registered_metrics);
            std::mem::swap(&mut valid, &mut self.registered_valid);
        }
        if let Some(survivors) = self.pmu.step(&self.branch_metrics, valid) {
            self.traceback.write(survivors);
        }
        bits.extend((0 .. self.config.traceback_rate).filter_map(|_| self.traceback.tick()));
    }

    /// Returns decoded bits for a block of symbol pairs.
    ///
    /// The decoder is reset, fed with the symbol pairs and then flushed with all-zeros symbol
    /// pairs until every bit of the block is out (at most `4L` of them, `L` being the traceback
    /// length); the startup bits are discarded. Under
    /// [`Normalization::IdleSlot`], steps without input are inserted as often as needed.
    ///
    /// # Returns
    ///
    /// - `bits`: Decoded bits, one per symbol pair.
    pub fn decode(&mut self, symbols: &[SymbolPair]) -> Vec<Bit> {
        self.reset();
        if symbols.is_empty() {
            return Vec::new();
        }
        let num_bits = self.startup_discard() + symbols.len();
        let idle_slot_period = match self.config.normalization {
            Normalization::IdleSlot => Some(self.config.max_steps_between_idle_slots()),
            Normalization::Off | Normalization::EveryStep => None,
        };
        let mut bits = Vec::with_capacity(num_bits + self.config.traceback_rate);
        let mut steps_since_idle_slot = 0;
        let flush =
            std::iter::repeat(SymbolPair::default()).take(FLUSH_LENGTHS * self.traceback.length());
        for pair in symbols.iter().copied().chain(flush) {
            if bits.len() >= num_bits {
                break;
            }
            if idle_slot_period == Some(steps_since_idle_slot) {
                self.step(None, &mut bits);
                steps_since_idle_slot = 0;
            }
            self.step(Some(pair), &mut bits);
            steps_since_idle_slot += 1;
        }
        bits.truncate(num_bits);
        bits.split_off(self.startup_discard().min(bits.len()))
    }
}

/// Returns decoded bits for a block of symbol pairs.
///
/// # Parameters
///
/// - `symbols`: Received symbol pairs, including those of the tail bits if the encoder was
///   terminated.
///
/// - `config`: Decoder configuration.
///
/// # Returns
///
/// - `bits`: Decoded bits, one per symbol pair.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
///
/// # Examples
///
/// ```
/// use viterbi::{Bit, Code, DecoderConfig, SymbolPair};
///
/// let config = DecoderConfig::new(Code::standard(3)?, 1);
/// let symbols = [(1, 1), (0, 1), (0, 1), (1, 1), (0, 0)].map(|(x0, x1)| SymbolPair::new(x0, x1));
/// let bits = viterbi::decoder(&symbols, config)?;
/// assert_eq!(bits, [Bit::One, Bit::One, Bit::Zero, Bit::Zero, Bit::Zero]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decoder(symbols: &[SymbolPair], config: DecoderConfig) -> Result<Vec<Bit>, Error> {
    Ok(Decoder::new(config)?.decode(symbols))
}
