//! Timing model: the canonical pulse-train representation shared by every
//! parser and the wire codec, plus the conversion error kinds.

use thiserror::Error;

/// Conversion failure kinds. A closed set so batch callers can match and
/// aggregate per command instead of unwinding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Structurally invalid source data: truncated input, wrong group
    /// counts, bad lengths.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// Recognized but unimplemented encoding scheme; synthesizing timings
    /// would need a protocol-specific encoder.
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
    /// A computed value exceeds what the wire format can represent.
    #[error("value out of range: {0}")]
    ValueOutOfRange(String),
}

/// Shortest representable pulse, in microseconds.
pub const MIN_DURATION_US: u32 = 1;
/// Longest plausible pulse, in microseconds. Durations above this indicate a
/// corrupt source code and are rejected, never clamped.
pub const MAX_DURATION_US: u32 = 100_000;
/// Lower edge of the plausible IR carrier band, in Hz.
pub const MIN_CARRIER_HZ: u32 = 10_000;
/// Upper edge of the plausible IR carrier band, in Hz.
pub const MAX_CARRIER_HZ: u32 = 100_000;

/// A pulse train: mark/space durations in microseconds, stored flat with
/// implicit alternation. The first entry is always a mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingSequence {
    /// Carrier frequency in Hz; 0 = unspecified/unmodulated.
    pub carrier_hz: u32,
    /// Durations in microseconds. Even indices are marks, odd are spaces.
    pub durations: Vec<u32>,
    /// Extra retransmissions of the whole stream (the wire repeat byte).
    pub repeat: u32,
}

impl TimingSequence {
    pub fn new(carrier_hz: u32, durations: Vec<u32>) -> Self {
        TimingSequence {
            carrier_hz,
            durations,
            repeat: 0,
        }
    }

    /// Mark (true) / space (false) for the duration at `index`.
    pub fn is_mark(&self, index: usize) -> bool {
        index % 2 == 0
    }

    /// Structural validity: at least one mark/space pair, every duration in
    /// range, carrier either unspecified or inside the IR band. Pure
    /// predicate, no side effects.
    pub fn is_well_formed(&self) -> bool {
        if self.durations.len() < 2 {
            return false;
        }
        if !self
            .durations
            .iter()
            .all(|&us| (MIN_DURATION_US..=MAX_DURATION_US).contains(&us))
        {
            return false;
        }
        self.carrier_hz == 0 || (MIN_CARRIER_HZ..=MAX_CARRIER_HZ).contains(&self.carrier_hz)
    }
}
