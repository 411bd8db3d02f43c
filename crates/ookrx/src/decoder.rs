//! Burst decoding pipeline
//!
//! Ties the stages together: cluster the high and low durations into
//! timing classes, fold a leading runt pulse into its neighbor, label
//! the classes with symbols, translate the pulses into a symbol
//! sequence, and run the Manchester machine over it. Each burst is
//! decoded independently; there is no cross-burst state.

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use thiserror::Error;

use crate::bitstream::BitStream;
use crate::burst::Burst;
use crate::cluster::{ClusterError, ClusterSet};
use crate::manchester::{self, ManchesterError};
use crate::symbol::{symbols_to_string, Symbol, SymbolError, SymbolTable};

/// Default clustering tolerance (fractional, ±20%)
pub const DEFAULT_TOLERANCE: f64 = 0.2;

/// Error decoding one burst
///
/// The first error fails the whole burst; no partial results are
/// surfaced. A caller processing many bursts should log the failure
/// and move on to the next burst.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum DecodeError {
    /// Duration clustering failed
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// Cluster labeling or symbol lookup failed
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    /// The symbol sequence was not a valid encoding
    #[error(transparent)]
    Manchester(#[from] ManchesterError),
}

/// Decodes pulse bursts into bits
///
/// The decoder is stateless between bursts: every call to
/// [`decode()`](OokDecoder::decode) rebuilds its timing classes from
/// that burst alone.
///
/// ```
/// use std::time::Duration;
/// use ookrx::{Burst, OokDecoder, Pulse};
///
/// let pulses = vec![
///     Pulse { high: 100, low: 200, frequency_offset: 0 },
///     Pulse { high: 100, low: 100, frequency_offset: 0 },
///     Pulse { high: 200, low: 1000, frequency_offset: 0 },
/// ];
/// let burst = Burst::new(Duration::from_millis(4), pulses).unwrap();
///
/// let decoded = OokDecoder::new().decode(&burst).unwrap();
/// assert_eq!(decoded.bit_string(), "1001");
/// assert!(decoded.terminated());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct OokDecoder {
    tolerance: f64,
}

impl Default for OokDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl OokDecoder {
    /// New decoder with the default tolerance
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Set the clustering tolerance
    ///
    /// `tolerance` is the fractional slack used when growing timing
    /// classes; `0.2` allows ±20%. Clamped to `[0.0, 1.0)`.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.clamp(0.0, 0.99);
        self
    }

    /// Clustering tolerance in effect
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Decode one burst into bits
    pub fn decode(&self, burst: &Burst) -> Result<BurstDecode, DecodeError> {
        let highs: Vec<u32> = burst.pulses().iter().map(|p| p.high).collect();
        let lows: Vec<u32> = burst.pulses().iter().map(|p| p.low).collect();

        let high_clusters = ClusterSet::guess_and_grow(&highs, self.tolerance)?;
        let high_clusters = high_clusters.fold_leading_runt(highs[0]);
        let low_clusters = ClusterSet::guess_and_grow(&lows, self.tolerance)?;

        log_clusters("high", &high_clusters, &highs);
        log_clusters("low", &low_clusters, &lows);

        let table = SymbolTable::assign(&high_clusters, &low_clusters)?;
        let symbols = table.symbolize(burst)?;
        debug!(":: {}", symbols_to_string(&symbols));

        let output = manchester::decode(&symbols)?;
        let terminated = output.terminated();
        Ok(BurstDecode {
            symbols,
            bits: output.into_bits(),
            terminated,
        })
    }
}

/// The decoded contents of one burst
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurstDecode {
    symbols: Vec<Symbol>,
    bits: BitStream,
    terminated: bool,
}

impl BurstDecode {
    /// Recovered bits, in emission order
    pub fn bits(&self) -> &BitStream {
        &self.bits
    }

    /// Symbol sequence the bits were decoded from
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// True if the burst ended with an end-of-transmission marker
    ///
    /// A burst that merely ran out of pulses still decodes, but with
    /// `terminated() == false` the result may be truncated.
    pub fn terminated(&self) -> bool {
        self.terminated
    }

    /// Bits as a compact string, e.g. `"1001"`
    pub fn bit_string(&self) -> String {
        self.bits
            .reader()
            .remaining_bits()
            .split(' ')
            .collect::<String>()
    }

    /// Bits as LSB-first hex nibbles
    ///
    /// Each group of four bits becomes one hex digit, least
    /// significant bit first. Leftover bits that do not fill a nibble
    /// are appended as `+b:<bits>`, matching the diagnostic format of
    /// the capture tools.
    pub fn nibble_string(&self) -> String {
        let mut out = String::new();
        let mut reader = self.bits.reader();
        while !reader.at_end() {
            match reader.get_nibble_lsb() {
                Some(nibble) => out.push_str(&format!("{:x}", nibble)),
                None => {
                    out.push_str("+b:");
                    out.push_str(&reader.remaining_bits());
                }
            }
        }
        out
    }
}

// Mirror of the capture daemon's verbose cluster report: flag
// singleton classes and whether they came from the first or last
// pulse, the usual suspects for glitches.
fn log_clusters(kind: &str, clusters: &ClusterSet, durations: &[u32]) {
    for (n, c) in clusters.iter().enumerate() {
        let mut annotation = String::new();
        if c.count() == 1 {
            annotation.push_str(" single");
            if durations.first() == Some(&c.min()) {
                annotation.push_str(" first");
            }
            if durations.last() == Some(&c.min()) {
                annotation.push_str(" last");
            }
        }
        debug!("{} {} - {}..{}{}", kind, n, c.min(), c.max(), annotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::burst::Pulse;

    fn pulse(high: u32, low: u32) -> Pulse {
        Pulse {
            high,
            low,
            frequency_offset: 0,
        }
    }

    fn burst_of(pulses: Vec<Pulse>) -> Burst {
        Burst::new(Duration::from_millis(10), pulses).unwrap()
    }

    #[test]
    fn test_end_to_end_clean_burst() {
        // short=~100, long=~200 with jitter; final low is the end
        // marker. Encodes 1 0 0 1.
        let burst = burst_of(vec![
            pulse(98, 205),
            pulse(104, 99),
            pulse(197, 1010),
        ]);

        let decoded = OokDecoder::new().decode(&burst).unwrap();
        assert_eq!(decoded.bit_string(), "1001");
        assert_eq!(decoded.nibble_string(), "9");
        assert!(decoded.terminated());
        assert_eq!(decoded.symbols().len(), 6);
    }

    #[test]
    fn test_leading_runt_is_folded() {
        // the first pulse's high is a glitch shorter than every real
        // class; folding merges it into the short-high class
        let burst = burst_of(vec![
            pulse(55, 205),
            pulse(104, 99),
            pulse(197, 1010),
        ]);

        let decoded = OokDecoder::new().decode(&burst).unwrap();
        assert_eq!(decoded.bit_string(), "1001");
        assert!(decoded.terminated());
    }

    #[test]
    fn test_burst_without_end_marker_class_is_rejected() {
        // no end-marker class: lows form only two classes, so the
        // shape check rejects the burst as unclassifiable
        let burst = burst_of(vec![pulse(100, 200), pulse(104, 99), pulse(197, 201)]);
        assert!(matches!(
            OokDecoder::new().decode(&burst),
            Err(DecodeError::Symbol(SymbolError::UnclassifiedClusters {
                highs: 2,
                lows: 2
            }))
        ));
    }

    #[test]
    fn test_tolerance_is_configurable() {
        let decoder = OokDecoder::new().with_tolerance(0.5);
        assert_eq!(decoder.tolerance(), 0.5);

        // out-of-range values are clamped
        assert_eq!(OokDecoder::new().with_tolerance(7.0).tolerance(), 0.99);
        assert_eq!(OokDecoder::new().with_tolerance(-1.0).tolerance(), 0.0);
    }

    #[test]
    fn test_invalid_encoding_fails() {
        // a long high in the first pulse has no transition from the
        // initial clock-low state
        let burst = burst_of(vec![
            pulse(200, 205),
            pulse(104, 99),
            pulse(197, 1010),
        ]);
        assert!(matches!(
            OokDecoder::new().decode(&burst),
            Err(DecodeError::Manchester(
                ManchesterError::InvalidTransition { .. }
            ))
        ));
    }

    #[test]
    fn test_nibble_string_with_leftover_bits() {
        // five bits: one nibble plus a +b: tail
        let mut bits = BitStream::default();
        for b in [1u8, 0, 0, 1, 1] {
            bits.add(b).unwrap();
        }
        let decode = BurstDecode {
            symbols: Vec::new(),
            bits,
            terminated: false,
        };
        assert_eq!(decode.nibble_string(), "9+b:1");
        assert_eq!(decode.bit_string(), "10011");
    }
}
