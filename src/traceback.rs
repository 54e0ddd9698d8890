//! Traceback of survivor paths
//!
//! The [`TracebackEngine`] turns the survivor bits produced by the path metric unit into decoded
//! bits. It works in two tick domains:
//!
//! - the input domain, which calls [`TracebackEngine::write`] once per valid trellis step, and
//!
//! - the traceback domain, which calls [`TracebackEngine::tick`] a fixed number of times per
//!   input step (the traceback rate, nominally `2`).
//!
//! Survivor vectors are stored in a circular memory of depth `D = 3L`, split into three regions
//! of `L` vectors each, `L` being the traceback length. At any time one region is being written,
//! and the traceback walks backward through the other two: first the "training" region, starting
//! from state `0`, so that the walk settles onto the maximum-likelihood path; then the "readout"
//! region, whose decoded bits come out in reverse order and are reordered by a LIFO buffer
//! before being emitted.
//!
//! Region roles are set by the input-domain phase `p`, which advances each time a region is
//! filled. The phase crosses into the traceback domain through a two-stage
//! [`PhaseSynchronizer`], so the traceback domain sees it two ticks late. For phase `p`, region
//! `(p + 2) mod 3` is being written, region `(p + 1) mod 3` is the training region and region
//! `p` is the readout region.
//!
//! The first `2L` decoded bits are not meaningful, and the bits of the latest region only come
//! out once the following region has been written and walked.

use bitvec::prelude::*;
use tracing::trace;

use crate::{
    config::{MAX_CONSTRAINT_LEN, MIN_CONSTRAINT_LEN},
    Bit, Error,
};

/// Number of regions in the survivor memory
pub(crate) const NUM_REGIONS: usize = 3;

/// Phase of the survivor memory right after reset
const RESET_PHASE: usize = 1;

/// Two-stage synchronizer carrying the phase across tick domains
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub struct PhaseSynchronizer {
    /// Synchronizer stages, the last one being visible in the destination domain
    stages: [usize; 2],
}

impl PhaseSynchronizer {
    /// Returns synchronizer with both stages holding given reset value.
    #[must_use]
    pub fn new(reset_value: usize) -> Self {
        Self {
            stages: [reset_value; 2],
        }
    }

    /// Returns the value visible in the destination domain.
    #[must_use]
    pub fn output(&self) -> usize {
        self.stages[1]
    }

    /// Clocks the synchronizer with given source-domain value.
    pub fn clock(&mut self, input: usize) {
        self.stages = [input, self.stages[0]];
    }
}

/// Fixed-capacity LIFO buffer of decoded bits
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct BitStack {
    /// Storage
    bits: BitVec,
    /// Number of bits on the stack
    len: usize,
}

impl BitStack {
    /// Returns empty stack with given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: bitvec![0; capacity],
            len: 0,
        }
    }

    /// Returns the number of bits on the stack.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the stack holds no bits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pushes a bit, which is dropped if the stack is full.
    pub fn push(&mut self, bit: Bit) {
        if self.len == self.bits.len() {
            trace!(capacity = self.bits.len(), "traceback stack full, bit dropped");
            return;
        }
        self.bits.set(self.len, bit.into());
        self.len += 1;
    }

    /// Pops the most recently pushed bit.
    pub fn pop(&mut self) -> Option<Bit> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(Bit::from(self.bits[self.len]))
    }

    /// Empties the stack.
    pub fn clear(&mut self) {
        if self.len > 0 {
            trace!(num_bits = self.len, "traceback stack cleared before drained");
        }
        self.len = 0;
    }
}

/// Traceback engine over a triple-region circular survivor memory
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TracebackEngine {
    /// Constraint length
    constraint_len: usize,
    /// Number of trellis states (bits per survivor vector)
    num_states: usize,
    /// Traceback length (region size)
    length: usize,
    /// Survivor vectors, stored back to back
    memory: BitVec,
    /// Write address
    write_addr: usize,
    /// Input-domain phase
    phase: usize,
    /// Phase handoff into the traceback domain
    synchronizer: PhaseSynchronizer,
    /// Read address
    read_addr: usize,
    /// Traceback state
    state: usize,
    /// Readout bits awaiting reordering
    stack: BitStack,
}

impl TracebackEngine {
    /// Returns traceback engine for given constraint length and traceback length.
    ///
    /// # Parameters
    ///
    /// - `constraint_len`: Constraint length `k` of the code. Must be in the range `[2, 11]`.
    ///
    /// - `length`: Traceback length `L`. Must be a power of 2 no less than 2.
    ///
    /// # Errors
    ///
    /// Returns an error if either parameter is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use viterbi::{Bit, TracebackEngine};
    /// use bitvec::prelude::*;
    ///
    /// let mut tb = TracebackEngine::new(3, 4)?;
    /// let mut out = Vec::new();
    /// for _ in 0 .. 20 {
    ///     tb.write(bits![0; 4]);
    ///     out.extend((0 .. 2).filter_map(|_| tb.tick()));
    /// }
    /// assert_eq!(out.len(), 16);
    /// assert!(out.iter().all(|&bit| bit == Bit::Zero));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(constraint_len: usize, length: usize) -> Result<Self, Error> {
        if !(MIN_CONSTRAINT_LEN ..= MAX_CONSTRAINT_LEN).contains(&constraint_len) {
            return Err(Error::InvalidInput(format!(
                "Constraint length must be in the range [{MIN_CONSTRAINT_LEN}, \
                {MAX_CONSTRAINT_LEN}] (found {constraint_len})",
            )));
        }
        if length < 2 || !length.is_power_of_two() {
            return Err(Error::InvalidInput(format!(
                "Traceback length must be a power of 2 no less than 2 (found {length})"
            )));
        }
        let num_states = 1 << (constraint_len - 1);
        let depth = NUM_REGIONS * length;
        Ok(Self {
            constraint_len,
            num_states,
            length,
            memory: bitvec![0; depth * num_states],
            write_addr: 0,
            phase: RESET_PHASE,
            synchronizer: PhaseSynchronizer::new(RESET_PHASE),
            read_addr: depth - 1,
            state: 0,
            stack: BitStack::with_capacity(length),
        })
    }

    /// Returns the traceback length.
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Returns the depth of the survivor memory.
    #[must_use]
    pub fn depth(&self) -> usize {
        NUM_REGIONS * self.length
    }

    /// Returns the input-domain phase.
    #[must_use]
    pub fn phase(&self) -> usize {
        self.phase
    }

    /// Restores all registers and the survivor memory to their reset values.
    pub fn reset(&mut self) {
        self.memory.fill(false);
        self.write_addr = 0;
        self.phase = RESET_PHASE;
        self.synchronizer = PhaseSynchronizer::new(RESET_PHASE);
        self.read_addr = self.depth() - 1;
        self.state = 0;
        self.stack.clear();
    }

    /// Stores the survivor vector of one trellis step (input domain).
    ///
    /// # Panics
    ///
    /// Panics if `survivors` does not hold one bit per trellis state.
    pub fn write(&mut self, survivors: &BitSlice) {
        assert_eq!(survivors.len(), self.num_states, "Survivor vector size mismatch");
        let start = self.write_addr * self.num_states;
        self.memory[start .. start + self.num_states].copy_from_bitslice(survivors);
        if self.write_addr % self.length == self.length - 1 {
            self.phase = (self.phase + 1) % NUM_REGIONS;
            trace!(phase = self.phase, write_addr = self.write_addr, "region filled");
        }
        self.write_addr = (self.write_addr + 1) % self.depth();
    }

    /// Advances the traceback by one tick (traceback domain), returning a decoded bit if one
    /// is ready.
    pub fn tick(&mut self) -> Option<Bit> {
        let depth = self.depth();
        let phase = self.synchronizer.output();
        let stop_addr = (phase * self.length + depth - 1) % depth;
        let mut readout = false;
        if self.read_addr != stop_addr {
            let addr = self.read_addr;
            let region = addr / self.length;
            let region_top = addr % self.length == self.length - 1;
            if region == (phase + 1) % NUM_REGIONS && region_top {
                self.state = 0;
            }
            if region == phase {
                if region_top {
                    self.stack.clear();
                }
                self.stack.push(Bit::from(self.state & 1 == 1));
                readout = true;
            }
            let survivor = usize::from(self.memory[addr * self.num_states + self.state]);
            self.state = (self.state >> 1) | (survivor << (self.constraint_len - 2));
            self.read_addr = (addr + depth - 1) % depth;
        }
        let output = if readout { None } else { self.stack.pop() };
        self.synchronizer.clock(self.phase);
        output
    }
}


#[cfg(test)]
mod tests_of_bit_stack {
    use super::*;
    use Bit::{One, Zero};

    #[test]
    fn test_push_pop() {
        let mut stack = BitStack::with_capacity(3);
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
        for bit in [One, Zero, One, One] {
            stack.push(bit);
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pop(), Some(One));
        assert_eq!(stack.pop(), Some(Zero));
        stack.push(Zero);
        assert_eq!(stack.pop(), Some(Zero));
        assert_eq!(stack.pop(), Some(One));
        assert_eq!(stack.pop(), None);
        stack.push(One);
        stack.clear();
        assert!(stack.is_empty());
    }
}
